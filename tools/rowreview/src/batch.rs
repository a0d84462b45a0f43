//! Line-command driver used when stdin is not a terminal.
//!
//! Each input line is one command; every command answers with a single
//! `row=.. state=.. message=..` line so scripted runs can be diffed.

use crate::app::ReviewApp;
use crate::errors::ReviewError;
use crate::logging::structured_fallback_line;
use crate::runtime::Terminal;
use crate::session::Navigation;
use crate::types::Screen;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchCommand {
    Score(String),
    Response(String),
    Next,
    Previous,
    GoTo(String),
    Exit,
    Download,
    Status,
    Quit,
}

/// Parses one command line. Whitespace between the command and its argument
/// is dropped; the rest of the line is the argument verbatim. Text arguments
/// take `\n` for a line break and `\\` for a backslash. Returns `None` for
/// anything unrecognised.
pub fn parse_command(line: &str) -> Option<BatchCommand> {
    let line = line.trim_start().trim_end_matches(['\r', '\n']);
    let (word, rest) = match line.split_once(' ') {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (line.trim_end(), ""),
    };
    let command = match word.to_ascii_lowercase().as_str() {
        "score" => BatchCommand::Score(unescape(rest)),
        "response" => BatchCommand::Response(unescape(rest)),
        "next" if rest.trim().is_empty() => BatchCommand::Next,
        "prev" | "previous" if rest.trim().is_empty() => BatchCommand::Previous,
        "goto" => BatchCommand::GoTo(rest.trim().to_string()),
        "exit" if rest.trim().is_empty() => BatchCommand::Exit,
        "download" if rest.trim().is_empty() => BatchCommand::Download,
        "status" if rest.trim().is_empty() => BatchCommand::Status,
        "quit" if rest.trim().is_empty() => BatchCommand::Quit,
        _ => return None,
    };
    Some(command)
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Reads commands until the reviewer exits or input runs out. Reaching the
/// end of input on the review screen keeps progress without exporting.
pub fn run_batch(app: &mut ReviewApp, terminal: &dyn Terminal) -> Result<(), ReviewError> {
    report(app, terminal, "ready")?;
    while !app.is_exited() {
        let Some(line) = terminal.read_line()? else {
            let reviewing = app.screen() == Screen::Review;
            app.quit();
            if reviewing {
                report(app, terminal, "end of input; progress saved")?;
            }
            break;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let message = match parse_command(&line) {
            Some(command) => execute(app, command),
            None => format!("unknown command: {trimmed}"),
        };
        report(app, terminal, &message)?;
    }
    Ok(())
}

pub fn execute(app: &mut ReviewApp, command: BatchCommand) -> String {
    match command {
        BatchCommand::Score(_) | BatchCommand::Response(_) if app.screen() != Screen::Review => {
            "review is complete; nothing to edit".to_string()
        }
        BatchCommand::Score(score) => {
            app.set_score(score);
            "score set".to_string()
        }
        BatchCommand::Response(response) => {
            app.set_response(response);
            "response set".to_string()
        }
        BatchCommand::Next => match app.next() {
            Navigation::Completed => {
                let written = app.download().map(|artifact| artifact.path);
                match written {
                    Some(path) => format!("review complete; wrote {}", path.display()),
                    None => format!("review complete; {}", status_or(app, "export failed")),
                }
            }
            outcome => describe(outcome, "no next row"),
        },
        BatchCommand::Previous => describe(app.previous(), "already at the first row"),
        BatchCommand::GoTo(row) => {
            let fallback = format!("invalid row number: {row}");
            describe(app.go_to(&row), &fallback)
        }
        BatchCommand::Exit => match app.save_and_exit() {
            Some(_) => status_or(app, "saved"),
            None if app.screen() != Screen::Review => "review is complete; use download".to_string(),
            None => status_or(app, "export failed"),
        },
        BatchCommand::Download => match app.download() {
            Some(_) => status_or(app, "downloaded"),
            None if app.screen() != Screen::Complete => "review is not complete yet".to_string(),
            None => status_or(app, "export failed"),
        },
        BatchCommand::Status => {
            let session = app.session();
            format!(
                "reviewed {} of {}",
                session.reviewed_count(),
                session.row_count()
            )
        }
        BatchCommand::Quit => {
            app.quit();
            "bye".to_string()
        }
    }
}

fn describe(outcome: Navigation, ignored: &str) -> String {
    match outcome {
        Navigation::Moved { to, .. } => format!("moved to row {}", to + 1),
        Navigation::Completed => "review complete".to_string(),
        Navigation::Ignored => ignored.to_string(),
    }
}

fn status_or(app: &ReviewApp, fallback: &str) -> String {
    app.status().unwrap_or(fallback).to_string()
}

fn report(app: &ReviewApp, terminal: &dyn Terminal, message: &str) -> Result<(), ReviewError> {
    let session = app.session();
    let row = format!("{}/{}", session.current_index() + 1, session.row_count());
    terminal.write_line(&structured_fallback_line(&row, app.screen().as_str(), message))
}

#[cfg(test)]
mod tests {
    use super::{parse_command, unescape, BatchCommand};

    #[test]
    fn parses_commands_and_arguments() {
        assert_eq!(parse_command("score 8"), Some(BatchCommand::Score("8".to_string())));
        assert_eq!(
            parse_command("response good, but\\nshort"),
            Some(BatchCommand::Response("good, but\nshort".to_string()))
        );
        assert_eq!(parse_command("score"), Some(BatchCommand::Score(String::new())));
        assert_eq!(parse_command("score  \t8"), Some(BatchCommand::Score("8".to_string())));
        assert_eq!(
            parse_command("response   keeps trailing "),
            Some(BatchCommand::Response("keeps trailing ".to_string()))
        );
        assert_eq!(parse_command("  NEXT\r"), Some(BatchCommand::Next));
        assert_eq!(parse_command("prev"), Some(BatchCommand::Previous));
        assert_eq!(parse_command("goto  3 "), Some(BatchCommand::GoTo("3".to_string())));
        assert_eq!(parse_command("next please"), None);
        assert_eq!(parse_command("jump 3"), None);
    }

    #[test]
    fn unescape_keeps_unknown_sequences() {
        assert_eq!(unescape(r"a\\b\tc\"), "a\\b\\tc\\");
    }
}
