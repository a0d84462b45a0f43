use crate::config::ExportConfig;
use crate::errors::ReviewError;
use crate::logging::append_run_log;
use crate::runtime::FileSystem;
use crate::session::{ReviewSession, UnreviewedRows};
use serde_json::json;
use std::path::PathBuf;

pub const CSV_MIME_TYPE: &str = "text/csv; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Written from the completion screen.
    Complete,
    /// Written when the reviewer exits early.
    Partial,
}

impl ExportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
        }
    }

    pub fn file_name(self, cfg: &ExportConfig) -> &str {
        match self {
            Self::Complete => &cfg.complete_file,
            Self::Partial => &cfg.partial_file,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub rows: usize,
    pub bytes: usize,
}

pub fn write_export(
    fs: &dyn FileSystem,
    session: &ReviewSession,
    cfg: &ExportConfig,
    kind: ExportKind,
) -> Result<ExportArtifact, ReviewError> {
    let path = cfg.output_dir.join(kind.file_name(cfg));
    let csv = session.export_csv(cfg.unreviewed_rows());
    let rows = match cfg.unreviewed_rows() {
        UnreviewedRows::Blank => session.row_count(),
        UnreviewedRows::Omit => session.reviewed_count(),
    };

    let written = fs
        .create_dir_all(&cfg.output_dir)
        .and_then(|()| fs.write_string(&path, &csv));
    if let Err(error) = written {
        append_run_log(
            "error",
            "export.failed",
            json!({
                "kind": kind.as_str(),
                "path": path.display().to_string(),
                "error": error.to_string(),
            }),
        );
        return Err(ReviewError::Export(format!(
            "could not write {}: {error}",
            path.display()
        )));
    }

    append_run_log(
        "info",
        "export.written",
        json!({
            "kind": kind.as_str(),
            "path": path.display().to_string(),
            "mime_type": CSV_MIME_TYPE,
            "bytes": csv.len(),
        }),
    );
    Ok(ExportArtifact {
        path,
        mime_type: CSV_MIME_TYPE,
        rows,
        bytes: csv.len(),
    })
}
