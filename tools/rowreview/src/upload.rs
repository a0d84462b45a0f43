use crate::config::UploadConfig;
use crate::csv_codec::{parse, ParseError, Table};
use crate::errors::ReviewError;
use crate::logging::append_run_log;
use crate::runtime::FileSystem;
use crate::store::{self, KeyValueStore, CSV_DATA_KEY, REVIEWED_DATA_KEY};
use encoding_rs::WINDOWS_1252;
use serde_json::json;
use std::borrow::Cow;
use std::path::Path;

const MIB: u64 = 1024 * 1024;

/// Reads, gates, and parses a CSV file, then makes it the stored table.
/// Any annotations saved against the previous table are discarded.
pub fn upload(
    fs: &dyn FileSystem,
    store: &dyn KeyValueStore,
    path: &Path,
    cfg: &UploadConfig,
) -> Result<Table, ReviewError> {
    let table = match read_table(fs, path, cfg) {
        Ok(table) => table,
        Err(error) => {
            append_run_log(
                "warn",
                "upload.rejected",
                json!({
                    "path": path.display().to_string(),
                    "error": error.to_string(),
                }),
            );
            return Err(error);
        }
    };

    store::save(store, CSV_DATA_KEY, &table)?;
    store.remove(REVIEWED_DATA_KEY)?;

    append_run_log(
        "info",
        "upload.accepted",
        json!({
            "path": path.display().to_string(),
            "columns": table.headers().len(),
            "rows": table.row_count(),
        }),
    );
    Ok(table)
}

pub fn read_table(fs: &dyn FileSystem, path: &Path, cfg: &UploadConfig) -> Result<Table, ReviewError> {
    if cfg.require_csv_extension && !path.to_string_lossy().ends_with(".csv") {
        return Err(ReviewError::Upload("Please upload a CSV file".to_string()));
    }

    if fs.file_size(path)? > cfg.max_bytes {
        return Err(ReviewError::Upload(format!(
            "File size should be less than {}",
            format_limit(cfg.max_bytes)
        )));
    }

    let bytes = fs.read_bytes(path)?;
    parse(&decode_text(&bytes)).map_err(|error| ReviewError::Upload(parse_message(&error)))
}

/// UTF-8 when the bytes are valid UTF-8, otherwise Windows-1252 (a superset
/// of Latin-1 for printable text, as written by spreadsheet exports).
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            append_run_log(
                "info",
                "upload.decoded",
                json!({ "encoding": WINDOWS_1252.name(), "bytes": bytes.len() }),
            );
            text
        }
    }
}

pub fn parse_message(error: &ParseError) -> String {
    match error {
        ParseError::NoHeader => {
            "CSV file must contain headers and at least one row of data".to_string()
        }
        ParseError::NoData => "No valid data found in CSV file".to_string(),
        ParseError::MalformedQuoting { .. } => format!("Error parsing CSV file: {error}"),
    }
}

fn format_limit(bytes: u64) -> String {
    if bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}
