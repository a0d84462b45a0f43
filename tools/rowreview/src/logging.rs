use crate::errors::ReviewError;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4096;

static RUN_LOG: OnceLock<JsonlLogger> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct JsonlLogger {
    pub path: PathBuf,
    pub max_payload_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent<'a> {
    pub level: &'a str,
    pub event_type: &'a str,
    pub payload: Value,
}

impl JsonlLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }

    pub fn append(&self, event: &LogEvent<'_>) -> Result<(), ReviewError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ReviewError::Io(e.to_string()))?;
        }
        let truncated = truncate_json(event.payload.clone(), self.max_payload_bytes);
        let line = serde_json::to_string(&LogEvent {
            level: event.level,
            event_type: event.event_type,
            payload: truncated,
        })
        .map_err(|e| ReviewError::Io(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ReviewError::Io(e.to_string()))?;
        file.write_all(line.as_bytes())
            .map_err(|e| ReviewError::Io(e.to_string()))?;
        file.write_all(b"\n")
            .map_err(|e| ReviewError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Installs the process-wide run log. Only the first call takes effect.
pub fn init_run_log(logger: JsonlLogger) -> bool {
    RUN_LOG.set(logger).is_ok()
}

/// Best-effort append to the run log; silently dropped when no log is
/// installed or the write fails.
pub fn append_run_log(level: &str, event_type: &str, payload: Value) {
    let Some(logger) = RUN_LOG.get() else {
        return;
    };
    let _ = logger.append(&LogEvent {
        level,
        event_type,
        payload,
    });
}

pub fn structured_fallback_line(row: &str, state: &str, message: &str) -> String {
    format!(
        "row={row} state={state} message={} ",
        message.replace('\n', "\\n")
    )
}

fn truncate_json(value: Value, max_bytes: usize) -> Value {
    let rendered = serde_json::to_string(&value).unwrap_or_default();
    if rendered.len() <= max_bytes {
        return value;
    }
    let mut cut = max_bytes.saturating_sub(3);
    while !rendered.is_char_boundary(cut) {
        cut -= 1;
    }
    Value::String(format!("{}...", &rendered[..cut]))
}
