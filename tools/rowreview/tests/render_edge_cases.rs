use rowreview::app::{ReviewApp, ENTER};
use rowreview::config::{AppConfig, ColumnRole, ExportConfig};
use rowreview::csv_codec::parse;
use rowreview::runtime::FakeFileSystem;
use rowreview::session::ReviewSession;
use rowreview::store::MemoryStore;
use rowreview::tui::{render_app, RESPONSE_PLACEHOLDER};
use std::path::PathBuf;
use std::sync::Arc;

const SAMPLE: &str = "Campaign,Budget,Profile,Notes\nSpring launch,1000,Ada Lovelace,\nSummer sale,,Grace Hopper,\"first\nsecond\"\n";

fn app_with_roles(roles: Vec<ColumnRole>) -> ReviewApp {
    let session = ReviewSession::new(parse(SAMPLE).expect("parse"), Arc::new(MemoryStore::new()));
    let export = ExportConfig {
        output_dir: PathBuf::from("/out"),
        ..AppConfig::default().export
    };
    ReviewApp::new(session, Arc::new(FakeFileSystem::default()), export, roles)
}

fn roles() -> Vec<ColumnRole> {
    vec![
        ColumnRole {
            name: "Campaign".to_string(),
            indices: vec![0, 1],
        },
        ColumnRole {
            name: "Profile".to_string(),
            indices: vec![2, 3, 9],
        },
    ]
}

#[test]
fn zero_sized_viewport_renders_nothing() {
    let app = app_with_roles(Vec::new());
    assert_eq!(render_app(&app, 0, 0).expect("render"), "");
    assert_eq!(render_app(&app, 80, 0).expect("render"), "");
}

#[test]
fn tiny_viewport_does_not_panic() {
    let app = app_with_roles(roles());
    let frame = render_app(&app, 1, 1).expect("render");
    assert!(!frame.is_empty());
}

#[test]
fn review_screen_shows_counter_role_sections_and_placeholders() {
    let app = app_with_roles(roles());
    let frame = render_app(&app, 100, 30).expect("render");
    assert!(frame.contains("Row 1 of 2"));
    assert!(frame.contains("Campaign: Spring launch"));
    assert!(frame.contains("Budget: 1000"));
    assert!(frame.contains("Profile: Ada Lovelace"));
    assert!(!frame.contains("Notes:"));
    assert!(frame.contains("Your Score"));
    assert!(frame.contains("[Next]"));
    assert!(!frame.contains("Complete Review"));
    assert!(frame.contains(&RESPONSE_PLACEHOLDER[..30]));
}

#[test]
fn last_row_offers_complete_review_and_skips_empty_cells() {
    let mut app = app_with_roles(roles());
    app.handle_key('n', true);
    let frame = render_app(&app, 100, 30).expect("render");
    assert!(frame.contains("Row 2 of 2"));
    assert!(frame.contains("[Complete Review]"));
    assert!(!frame.contains("Budget:"));
    assert!(frame.contains("Notes: first"));
    assert!(frame.contains("second"));
}

#[test]
fn without_roles_every_column_is_listed() {
    let app = app_with_roles(Vec::new());
    let frame = render_app(&app, 100, 30).expect("render");
    assert!(frame.contains("Campaign: Spring launch"));
    assert!(frame.contains("Profile: Ada Lovelace"));
}

#[test]
fn typed_values_replace_placeholders_and_row_prompt_is_shown() {
    let mut app = app_with_roles(roles());
    for key in "42".chars() {
        app.handle_key(key, false);
    }
    app.handle_key(ENTER, false);
    for key in "solid".chars() {
        app.handle_key(key, false);
    }
    let frame = render_app(&app, 100, 30).expect("render");
    assert!(frame.contains("42"));
    assert!(frame.contains("solid"));
    assert!(!frame.contains(&RESPONSE_PLACEHOLDER[..30]));

    app.handle_key('g', true);
    app.handle_key('2', false);
    let frame = render_app(&app, 100, 30).expect("render");
    assert!(frame.contains("Go to row: 2_ (of 2)"));
}

#[test]
fn completion_screen_reports_row_count() {
    let mut app = app_with_roles(roles());
    app.handle_key('n', true);
    app.handle_key('n', true);
    let frame = render_app(&app, 80, 16).expect("render");
    assert!(frame.contains("Review Complete!"));
    assert!(frame.contains("All 2 rows have been reviewed successfully."));
    assert!(frame.contains("d download results"));
}
