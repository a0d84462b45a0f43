pub mod app;
pub mod batch;
pub mod columns;
pub mod config;
pub mod csv_codec;
pub mod errors;
pub mod export;
pub mod hotkeys;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod store;
pub mod tui;
pub mod types;
pub mod upload;

use app::ReviewApp;
use clap::{error::ErrorKind, CommandFactory, Parser};
use config::{load_config, CliOverrides};
use errors::ReviewError;
use export::{write_export, ExportKind};
use logging::{init_run_log, JsonlLogger};
use runtime::ProductionRuntime;
use session::{Navigation, ReviewSession};
use std::path::PathBuf;
use std::sync::Arc;
use store::{KeyValueStore, SqliteStore, CSV_DATA_KEY, REVIEWED_DATA_KEY};

#[derive(Debug, Clone, Parser)]
#[command(name = "rowreview")]
#[command(about = "Score and annotate the rows of a CSV file, then export the results")]
pub struct Cli {
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Upload a new CSV file, replacing the stored table and annotations.
    #[arg(long)]
    pub input: Option<PathBuf>,
    #[arg(long)]
    pub store: Option<PathBuf>,
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,
    /// Write the partial export for the stored session and exit.
    #[arg(long, default_value_t = false)]
    pub export_only: bool,
    /// Clear the stored table and annotations and exit.
    #[arg(long, default_value_t = false)]
    pub reset: bool,
    /// Open the session at this 1-based row.
    #[arg(long)]
    pub row: Option<String>,
}

pub fn run() -> Result<i32, ReviewError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let cwd = std::env::current_dir().map_err(|e| ReviewError::Io(e.to_string()))?;
    let runtime = ProductionRuntime::new();
    run_with_runtime(&args, &cwd, &runtime)
}

pub fn run_with_runtime(
    args: &[std::ffi::OsString],
    cwd: &std::path::Path,
    runtime: &ProductionRuntime,
) -> Result<i32, ReviewError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(ReviewError::Cli(error.to_string())),
        },
    };

    if cli.reset && (cli.input.is_some() || cli.export_only) {
        return Err(ReviewError::Cli(
            "--reset cannot be combined with --input or --export-only".to_string(),
        ));
    }

    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        store_path: cli.store.clone(),
        output_dir: cli.output_dir.clone(),
    };
    let cfg = load_config(&overrides, cwd, runtime.file_system.as_ref())?;

    let mut logger = JsonlLogger::new(&cfg.logging.path);
    logger.max_payload_bytes = cfg.logging.max_payload_bytes;
    init_run_log(logger);

    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&cfg.store.path)?);

    if cli.reset {
        store.remove(CSV_DATA_KEY)?;
        store.remove(REVIEWED_DATA_KEY)?;
        runtime.terminal.write_line(&format!(
            "cleared stored review data in {}",
            cfg.store.path.display()
        ))?;
        return Ok(0);
    }

    if let Some(input) = &cli.input {
        let path = if input.is_absolute() {
            input.clone()
        } else {
            cwd.join(input)
        };
        let table = upload::upload(
            runtime.file_system.as_ref(),
            store.as_ref(),
            &path,
            &cfg.upload,
        )?;
        runtime.terminal.write_line(&format!(
            "loaded {} rows with {} columns from {}",
            table.row_count(),
            table.headers().len(),
            path.display()
        ))?;
    }

    let session = ReviewSession::resume(Arc::clone(&store))?;

    if cli.export_only {
        let artifact = write_export(
            runtime.file_system.as_ref(),
            &session,
            &cfg.export,
            ExportKind::Partial,
        )?;
        runtime.terminal.write_line(&format!(
            "wrote {} ({} rows, {} bytes, {})",
            artifact.path.display(),
            artifact.rows,
            artifact.bytes,
            artifact.mime_type
        ))?;
        return Ok(0);
    }

    let mut app = ReviewApp::new(
        session,
        Arc::clone(&runtime.file_system),
        cfg.export.clone(),
        cfg.columns.clone(),
    );
    if let Some(row) = &cli.row {
        if app.go_to(row) == Navigation::Ignored {
            runtime.terminal.write_line(&format!(
                "row {row} is out of range; starting at row 1"
            ))?;
        }
    }

    if runtime.terminal.stdin_is_tty() {
        tui::run_interactive(&mut app)?;
    } else {
        batch::run_batch(&mut app, runtime.terminal.as_ref())?;
    }
    Ok(0)
}

pub fn render_help() -> String {
    let mut cmd = Cli::command();
    let mut buffer = Vec::new();
    if cmd.write_long_help(&mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
