use crate::errors::ReviewError;
use crate::runtime::FileSystem;
use crate::session::UnreviewedRows;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub store_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub upload: UploadConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
    pub columns: Vec<ColumnRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadConfig {
    pub max_bytes: u64,
    pub require_csv_extension: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub complete_file: String,
    pub partial_file: String,
    pub include_unreviewed: bool,
}

impl ExportConfig {
    pub fn unreviewed_rows(&self) -> UnreviewedRows {
        if self.include_unreviewed {
            UnreviewedRows::Blank
        } else {
            UnreviewedRows::Omit
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub path: PathBuf,
    pub max_payload_bytes: usize,
}

/// A named group of columns shown together on the review screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnRole {
    pub name: String,
    pub indices: Vec<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                path: PathBuf::from(".rowreview/review.sqlite"),
            },
            upload: UploadConfig {
                max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
                require_csv_extension: true,
            },
            export: ExportConfig {
                output_dir: PathBuf::from("."),
                complete_file: "reviewed_data.csv".to_string(),
                partial_file: "reviewed_data_partial.csv".to_string(),
                include_unreviewed: true,
            },
            logging: LoggingConfig {
                path: PathBuf::from(".rowreview/logs/run.jsonl"),
                max_payload_bytes: 4096,
            },
            columns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialAppConfig {
    store: Option<PartialStoreConfig>,
    upload: Option<PartialUploadConfig>,
    export: Option<PartialExportConfig>,
    logging: Option<PartialLoggingConfig>,
    columns: Option<Vec<ColumnRole>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialStoreConfig {
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialUploadConfig {
    max_bytes: Option<u64>,
    require_csv_extension: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialExportConfig {
    output_dir: Option<PathBuf>,
    complete_file: Option<String>,
    partial_file: Option<String>,
    include_unreviewed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLoggingConfig {
    path: Option<PathBuf>,
    max_payload_bytes: Option<usize>,
}

pub fn load_config(
    overrides: &CliOverrides,
    process_cwd: &Path,
    fs: &dyn FileSystem,
) -> Result<AppConfig, ReviewError> {
    let mut cfg = AppConfig::default();

    if let Some(path) = &overrides.config_path {
        let file_contents = fs.read_to_string(path)?;
        let partial: PartialAppConfig = toml::from_str(&file_contents)
            .map_err(|e| ReviewError::ConfigParse(e.to_string()))?;
        merge_partial_config(&mut cfg, partial);
    }

    apply_cli_overrides(&mut cfg, overrides);
    absolutize_paths(&mut cfg, process_cwd);
    validate_config(&cfg)?;
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut AppConfig, partial: PartialAppConfig) {
    if let Some(store) = partial.store {
        if let Some(path) = store.path {
            cfg.store.path = path;
        }
    }

    if let Some(upload) = partial.upload {
        if let Some(value) = upload.max_bytes {
            cfg.upload.max_bytes = value;
        }
        if let Some(value) = upload.require_csv_extension {
            cfg.upload.require_csv_extension = value;
        }
    }

    if let Some(export) = partial.export {
        if let Some(value) = export.output_dir {
            cfg.export.output_dir = value;
        }
        if let Some(value) = export.complete_file {
            cfg.export.complete_file = value;
        }
        if let Some(value) = export.partial_file {
            cfg.export.partial_file = value;
        }
        if let Some(value) = export.include_unreviewed {
            cfg.export.include_unreviewed = value;
        }
    }

    if let Some(logging) = partial.logging {
        if let Some(value) = logging.path {
            cfg.logging.path = value;
        }
        if let Some(value) = logging.max_payload_bytes {
            cfg.logging.max_payload_bytes = value;
        }
    }

    if let Some(columns) = partial.columns {
        cfg.columns = columns;
    }
}

fn apply_cli_overrides(cfg: &mut AppConfig, overrides: &CliOverrides) {
    if let Some(path) = &overrides.store_path {
        cfg.store.path = path.clone();
    }
    if let Some(dir) = &overrides.output_dir {
        cfg.export.output_dir = dir.clone();
    }
}

fn absolutize_paths(cfg: &mut AppConfig, base: &Path) {
    cfg.store.path = absolutize_path(base, &cfg.store.path);
    cfg.export.output_dir = absolutize_path(base, &cfg.export.output_dir);
    cfg.logging.path = absolutize_path(base, &cfg.logging.path);
}

fn absolutize_path(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

fn validate_config(cfg: &AppConfig) -> Result<(), ReviewError> {
    if cfg.upload.max_bytes == 0 {
        return Err(ReviewError::InvalidConfig(
            "upload.max_bytes must be greater than zero".to_string(),
        ));
    }

    let complete = cfg.export.complete_file.trim();
    let partial = cfg.export.partial_file.trim();
    if complete.is_empty() || partial.is_empty() {
        return Err(ReviewError::InvalidConfig(
            "export file names must not be empty".to_string(),
        ));
    }
    if complete == partial {
        return Err(ReviewError::InvalidConfig(
            "export.complete_file and export.partial_file must differ".to_string(),
        ));
    }

    for role in &cfg.columns {
        if role.name.trim().is_empty() {
            return Err(ReviewError::InvalidConfig(
                "columns.name must not be empty".to_string(),
            ));
        }
        if role.indices.is_empty() {
            return Err(ReviewError::InvalidConfig(format!(
                "column role '{}' needs at least one index",
                role.name
            )));
        }
    }

    Ok(())
}
