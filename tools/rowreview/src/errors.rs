use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("cli error: {0}")]
    Cli(String),
    #[error("{0}")]
    Upload(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("no uploaded table found; upload a CSV file with --input")]
    NoTable,
    #[error("stored review data is corrupt ({0}); upload the CSV file again with --input")]
    CorruptState(String),
    #[error("export error: {0}")]
    Export(String),
    #[error("render error: {0}")]
    Render(String),
}
