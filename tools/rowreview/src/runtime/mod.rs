use crate::errors::ReviewError;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String, ReviewError>;
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, ReviewError>;
    fn file_size(&self, path: &Path) -> Result<u64, ReviewError>;
    fn write_string(&self, path: &Path, contents: &str) -> Result<(), ReviewError>;
    fn create_dir_all(&self, path: &Path) -> Result<(), ReviewError>;
}

pub trait Terminal: Send + Sync {
    fn stdin_is_tty(&self) -> bool;
    fn write_line(&self, line: &str) -> Result<(), ReviewError>;
    /// Next line of stdin without its terminator, `None` at end of input.
    fn read_line(&self) -> Result<Option<String>, ReviewError>;
}

pub struct ProductionFileSystem;

impl FileSystem for ProductionFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, ReviewError> {
        std::fs::read_to_string(path)
            .map_err(|e| ReviewError::Io(format!("{}: {e}", path.display())))
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, ReviewError> {
        std::fs::read(path).map_err(|e| ReviewError::Io(format!("{}: {e}", path.display())))
    }

    fn file_size(&self, path: &Path) -> Result<u64, ReviewError> {
        std::fs::metadata(path)
            .map(|meta| meta.len())
            .map_err(|e| ReviewError::Io(format!("{}: {e}", path.display())))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), ReviewError> {
        std::fs::write(path, contents)
            .map_err(|e| ReviewError::Io(format!("{}: {e}", path.display())))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), ReviewError> {
        std::fs::create_dir_all(path).map_err(|e| ReviewError::Io(e.to_string()))
    }
}

pub struct ProductionTerminal;

impl Terminal for ProductionTerminal {
    fn stdin_is_tty(&self) -> bool {
        std::io::IsTerminal::is_terminal(&std::io::stdin())
    }

    fn write_line(&self, line: &str) -> Result<(), ReviewError> {
        use std::io::Write;
        let mut out = std::io::stdout();
        writeln!(out, "{line}").map_err(|e| ReviewError::Io(e.to_string()))
    }

    fn read_line(&self) -> Result<Option<String>, ReviewError> {
        let mut buffer = String::new();
        let read = std::io::stdin()
            .read_line(&mut buffer)
            .map_err(|e| ReviewError::Io(e.to_string()))?;
        if read == 0 {
            return Ok(None);
        }
        let trimmed = buffer.trim_end_matches(['\n', '\r']).len();
        buffer.truncate(trimmed);
        Ok(Some(buffer))
    }
}

pub struct ProductionRuntime {
    pub file_system: Arc<dyn FileSystem>,
    pub terminal: Arc<dyn Terminal>,
}

impl ProductionRuntime {
    pub fn new() -> Self {
        Self {
            file_system: Arc::new(ProductionFileSystem),
            terminal: Arc::new(ProductionTerminal),
        }
    }
}

impl Default for ProductionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, ReviewError> {
    mutex
        .lock()
        .map_err(|_| ReviewError::Io(format!("{what} lock poisoned")))
}

#[derive(Default, Clone)]
pub struct FakeFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    reads: Arc<Mutex<Vec<PathBuf>>>,
    dirs: Arc<Mutex<Vec<PathBuf>>>,
    fail_next: Arc<Mutex<Option<ReviewError>>>,
}

impl FakeFileSystem {
    pub fn with_file(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        let contents: String = contents.into();
        Self::with_bytes(path, contents.into_bytes())
    }

    pub fn with_bytes(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        let fs = Self::default();
        if let Ok(mut files) = fs.files.lock() {
            files.insert(path.into(), contents.into());
        }
        fs
    }

    pub fn set_fail_next(&self, error: ReviewError) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(error);
        }
    }

    pub fn file(&self, path: &Path) -> Option<String> {
        let bytes = self.files.lock().ok()?.get(path).cloned()?;
        String::from_utf8(bytes).ok()
    }

    /// Paths whose contents were read, in call order.
    pub fn read_paths(&self) -> Vec<PathBuf> {
        self.reads.lock().map(|reads| reads.clone()).unwrap_or_default()
    }

    pub fn created_dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().map(|dirs| dirs.clone()).unwrap_or_default()
    }

    fn maybe_fail(&self) -> Result<(), ReviewError> {
        if let Some(err) = lock(&self.fail_next, "fail")?.take() {
            return Err(err);
        }
        Ok(())
    }
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, ReviewError> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes)
            .map_err(|e| ReviewError::Io(format!("{}: {e}", path.display())))
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, ReviewError> {
        self.maybe_fail()?;
        lock(&self.reads, "reads")?.push(path.to_path_buf());
        lock(&self.files, "files")?
            .get(path)
            .cloned()
            .ok_or_else(|| ReviewError::Io(format!("missing file {}", path.display())))
    }

    fn file_size(&self, path: &Path) -> Result<u64, ReviewError> {
        self.maybe_fail()?;
        lock(&self.files, "files")?
            .get(path)
            .map(|bytes| bytes.len() as u64)
            .ok_or_else(|| ReviewError::Io(format!("missing file {}", path.display())))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), ReviewError> {
        self.maybe_fail()?;
        lock(&self.files, "files")?.insert(path.to_path_buf(), contents.as_bytes().to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), ReviewError> {
        self.maybe_fail()?;
        lock(&self.dirs, "dirs")?.push(path.to_path_buf());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct FakeTerminal {
    pub is_tty: bool,
    input: Arc<Mutex<VecDeque<String>>>,
    writes: Arc<Mutex<Vec<String>>>,
}

impl FakeTerminal {
    pub fn new(is_tty: bool) -> Self {
        Self {
            is_tty,
            ..Self::default()
        }
    }

    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terminal = Self::new(false);
        if let Ok(mut input) = terminal.input.lock() {
            input.extend(lines.into_iter().map(Into::into));
        }
        terminal
    }

    pub fn written_lines(&self) -> Vec<String> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }
}

impl Terminal for FakeTerminal {
    fn stdin_is_tty(&self) -> bool {
        self.is_tty
    }

    fn write_line(&self, line: &str) -> Result<(), ReviewError> {
        lock(&self.writes, "writes")?.push(line.to_string());
        Ok(())
    }

    fn read_line(&self) -> Result<Option<String>, ReviewError> {
        Ok(lock(&self.input, "input")?.pop_front())
    }
}
