//! Screen-level controller shared by the terminal UI and the line-command
//! driver. Owns the review session and the form being edited.

use crate::columns::{sections_for_row, RoleSection};
use crate::config::{ColumnRole, ExportConfig};
use crate::export::{write_export, ExportArtifact, ExportKind};
use crate::hotkeys::{action_for_key, HotkeyAction};
use crate::runtime::FileSystem;
use crate::session::{Navigation, ReviewForm, ReviewSession};
use crate::types::{Focus, Screen};
use std::sync::Arc;

pub const BACKSPACE: char = '\u{8}';
pub const ENTER: char = '\n';

pub struct ReviewApp {
    session: ReviewSession,
    form: ReviewForm,
    focus: Focus,
    row_input: String,
    screen: Screen,
    status: Option<String>,
    fs: Arc<dyn FileSystem>,
    export: ExportConfig,
    roles: Vec<ColumnRole>,
}

impl ReviewApp {
    pub fn new(
        session: ReviewSession,
        fs: Arc<dyn FileSystem>,
        export: ExportConfig,
        roles: Vec<ColumnRole>,
    ) -> Self {
        let form = session.load_form(session.current_index());
        let screen = if session.is_complete() {
            Screen::Complete
        } else {
            Screen::Review
        };
        Self {
            session,
            form,
            focus: Focus::Score,
            row_input: String::new(),
            screen,
            status: None,
            fs,
            export,
            roles,
        }
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    pub fn form(&self) -> &ReviewForm {
        &self.form
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn row_input(&self) -> &str {
        &self.row_input
    }

    pub fn is_exited(&self) -> bool {
        self.screen == Screen::Exited
    }

    pub fn current_sections(&self) -> Vec<RoleSection> {
        let row = self.session.current_row().unwrap_or_default();
        sections_for_row(&self.roles, self.session.table().headers(), row)
    }

    pub fn set_score(&mut self, score: impl Into<String>) {
        self.form.score = score.into();
    }

    pub fn set_response(&mut self, response: impl Into<String>) {
        self.form.response = response.into();
    }

    pub fn next(&mut self) -> Navigation {
        let outcome = self.session.next(&mut self.form);
        if outcome == Navigation::Completed {
            self.screen = Screen::Complete;
            self.focus = Focus::Score;
        }
        self.status = None;
        outcome
    }

    pub fn previous(&mut self) -> Navigation {
        self.status = None;
        self.session.previous(&mut self.form)
    }

    pub fn go_to(&mut self, row_number: &str) -> Navigation {
        self.status = None;
        self.session.go_to(row_number, &mut self.form)
    }

    /// Saves the form, writes the partial export, and leaves the review
    /// screen. A failed export keeps the reviewer on the review screen.
    pub fn save_and_exit(&mut self) -> Option<ExportArtifact> {
        if self.screen != Screen::Review {
            return None;
        }
        self.session
            .save_current(&self.form.score, &self.form.response);
        let artifact = self.export(ExportKind::Partial)?;
        self.screen = Screen::Exited;
        Some(artifact)
    }

    pub fn download(&mut self) -> Option<ExportArtifact> {
        if self.screen != Screen::Complete {
            return None;
        }
        self.export(ExportKind::Complete)
    }

    /// Leaves without exporting. Progress on the current row is kept in the
    /// store so the next run resumes it.
    pub fn quit(&mut self) {
        if self.screen == Screen::Review {
            self.session
                .save_current(&self.form.score, &self.form.response);
        }
        self.screen = Screen::Exited;
    }

    pub fn export(&mut self, kind: ExportKind) -> Option<ExportArtifact> {
        match write_export(self.fs.as_ref(), &self.session, &self.export, kind) {
            Ok(artifact) => {
                self.status = Some(format!(
                    "Wrote {} ({} rows, {} bytes)",
                    artifact.path.display(),
                    artifact.rows,
                    artifact.bytes
                ));
                Some(artifact)
            }
            Err(error) => {
                self.status = Some(format!("Failed to download CSV: {error}"));
                None
            }
        }
    }

    pub fn apply(&mut self, action: HotkeyAction) {
        match action {
            HotkeyAction::Next => {
                self.next();
            }
            HotkeyAction::Previous => {
                self.previous();
            }
            HotkeyAction::JumpToRow => {
                self.row_input.clear();
                self.focus = Focus::RowNumber;
            }
            HotkeyAction::SaveAndExit => {
                self.save_and_exit();
            }
            HotkeyAction::Download => {
                self.download();
            }
            HotkeyAction::CycleFocus => self.focus = self.focus.next(),
            HotkeyAction::Quit if self.focus == Focus::RowNumber => {
                self.row_input.clear();
                self.focus = Focus::Score;
            }
            HotkeyAction::Quit => self.quit(),
        }
    }

    /// Routes one key press: bound keys become actions, anything else is
    /// typed into the focused field.
    pub fn handle_key(&mut self, key: char, ctrl: bool) {
        if let Some(action) = action_for_key(key, ctrl, self.screen) {
            self.apply(action);
            return;
        }
        if ctrl || self.screen != Screen::Review {
            return;
        }
        match (self.focus, key) {
            (Focus::RowNumber, ENTER) => {
                let input = std::mem::take(&mut self.row_input);
                self.focus = Focus::Score;
                self.go_to(&input);
            }
            (Focus::RowNumber, BACKSPACE) => {
                self.row_input.pop();
            }
            (Focus::RowNumber, key) => self.row_input.push(key),
            (Focus::Score, ENTER) => self.focus = Focus::Response,
            (Focus::Score, BACKSPACE) => {
                self.form.score.pop();
            }
            (Focus::Score, key) => self.form.score.push(key),
            (Focus::Response, BACKSPACE) => {
                self.form.response.pop();
            }
            (Focus::Response, key) => self.form.response.push(key),
        }
    }
}
