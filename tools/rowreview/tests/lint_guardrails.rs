use std::path::Path;

fn manifest(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => panic!("{} must be readable: {err}", path.display()),
    }
}

#[test]
fn workspace_denies_unwrap_and_package_warns_on_expect() {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let workspace_dir = match manifest_dir.parent().and_then(Path::parent) {
        Some(dir) => dir,
        None => panic!("workspace root should be two levels above package manifest dir"),
    };

    let workspace = manifest(&workspace_dir.join("Cargo.toml"));
    assert!(
        workspace.contains("[workspace.lints.clippy]") && workspace.contains("unwrap_used = \"deny\""),
        "workspace manifest should deny clippy::unwrap_used"
    );

    let package = manifest(&manifest_dir.join("Cargo.toml"));
    assert!(
        package.contains("[lints.clippy]") && package.contains("expect_used = \"warn\""),
        "package manifest should configure clippy::expect_used as warn"
    );
}

#[test]
fn library_sources_do_not_call_unwrap_outside_tests() {
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut stack = vec![src];
    let mut offenders = Vec::new();
    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => panic!("read {}: {err}", dir.display()),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some("rs") {
                continue;
            }
            let text = manifest(&path);
            let production = text.split("#[cfg(test)]").next().unwrap_or_default();
            for (number, line) in production.lines().enumerate() {
                if line.contains(".unwrap()") {
                    offenders.push(format!("{}:{}", path.display(), number + 1));
                }
            }
        }
    }
    assert!(offenders.is_empty(), "unwrap() in non-test code: {offenders:?}");
}
