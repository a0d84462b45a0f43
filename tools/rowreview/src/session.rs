//! Row-by-row review state machine.
//!
//! A session walks a [`Table`] with a cursor, saving the caller's form into a
//! sparse annotation map before every move and loading the target row's prior
//! annotation (or blanks) back into the form afterwards.
//!
//! Invalid navigation (previous at row 0, go-to outside the table, anything
//! after completion) is ignored without surfacing an error. Callers that want
//! to report it can match on [`Navigation::Ignored`].

use crate::csv_codec::{serialize, AnnotatedRow, Table};
use crate::errors::ReviewError;
use crate::logging::append_run_log;
use crate::store::{self, KeyValueStore, CSV_DATA_KEY, REVIEWED_DATA_KEY};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SCORE_COLUMN: &str = "Score";
pub const RESPONSE_COLUMN: &str = "Response";
pub const EXPORT_COLUMNS: [&str; 2] = [SCORE_COLUMN, RESPONSE_COLUMN];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub row_data: Vec<String>,
    pub score: String,
    pub response: String,
}

/// The caller's editable score/response fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewForm {
    pub score: String,
    pub response: String,
}

impl ReviewForm {
    pub fn new(score: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            score: score.into(),
            response: response.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Reviewing(usize),
    Complete,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reviewing(_) => "reviewing",
            Self::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved { from: usize, to: usize },
    Completed,
    Ignored,
}

/// What export does with rows that were never saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnreviewedRows {
    /// Emit the original cells with blank annotation fields.
    #[default]
    Blank,
    /// Leave the row out entirely.
    Omit,
}

pub struct ReviewSession {
    table: Table,
    annotations: BTreeMap<usize, Annotation>,
    current_index: usize,
    complete: bool,
    store: Arc<dyn KeyValueStore>,
}

impl ReviewSession {
    pub fn new(table: Table, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            table,
            annotations: BTreeMap::new(),
            current_index: 0,
            complete: false,
            store,
        }
    }

    /// Reopens the stored table and any annotations saved against it.
    pub fn resume(store: Arc<dyn KeyValueStore>) -> Result<Self, ReviewError> {
        let table: Table = store::load(store.as_ref(), CSV_DATA_KEY)?.ok_or(ReviewError::NoTable)?;
        let saved: Vec<Option<Annotation>> =
            store::load(store.as_ref(), REVIEWED_DATA_KEY)?.unwrap_or_default();

        let mut annotations = BTreeMap::new();
        for (index, annotation) in saved.into_iter().enumerate() {
            let Some(annotation) = annotation else {
                continue;
            };
            if index >= table.row_count() {
                return Err(ReviewError::CorruptState(format!(
                    "{REVIEWED_DATA_KEY}: annotation for row {} but table has {} rows",
                    index + 1,
                    table.row_count()
                )));
            }
            annotations.insert(index, annotation);
        }

        append_run_log(
            "info",
            "session.resumed",
            json!({
                "rows": table.row_count(),
                "reviewed": annotations.len(),
            }),
        );
        Ok(Self {
            table,
            annotations,
            current_index: 0,
            complete: false,
            store,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_row(&self) -> Option<&[String]> {
        self.table.row(self.current_index)
    }

    pub fn state(&self) -> SessionState {
        if self.complete {
            SessionState::Complete
        } else {
            SessionState::Reviewing(self.current_index)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_last_row(&self) -> bool {
        self.current_index + 1 >= self.row_count()
    }

    pub fn annotation(&self, index: usize) -> Option<&Annotation> {
        self.annotations.get(&index)
    }

    pub fn reviewed_count(&self) -> usize {
        self.annotations.len()
    }

    /// Form contents for `index`: the saved annotation, or blanks.
    pub fn load_form(&self, index: usize) -> ReviewForm {
        self.annotations
            .get(&index)
            .map(|annotation| ReviewForm::new(annotation.score.clone(), annotation.response.clone()))
            .unwrap_or_default()
    }

    /// Records the form for the current row, replacing any earlier entry.
    /// Returns `false` without touching state when there is no current row.
    pub fn save_current(&mut self, score: &str, response: &str) -> bool {
        let Some(row) = self.table.row(self.current_index) else {
            return false;
        };
        self.annotations.insert(
            self.current_index,
            Annotation {
                row_data: row.to_vec(),
                score: score.to_string(),
                response: response.to_string(),
            },
        );
        append_run_log(
            "debug",
            "session.saved",
            json!({
                "row": self.current_index + 1,
                "score_len": score.len(),
                "response_len": response.len(),
            }),
        );
        self.persist();
        true
    }

    pub fn next(&mut self, form: &mut ReviewForm) -> Navigation {
        if self.complete {
            return Navigation::Ignored;
        }
        self.save_current(&form.score, &form.response);
        if self.current_index + 1 < self.row_count() {
            let target = self.current_index + 1;
            self.move_to(target, form)
        } else {
            self.complete = true;
            append_run_log(
                "info",
                "session.completed",
                json!({
                    "rows": self.row_count(),
                    "reviewed": self.reviewed_count(),
                }),
            );
            Navigation::Completed
        }
    }

    pub fn previous(&mut self, form: &mut ReviewForm) -> Navigation {
        if self.complete || self.current_index == 0 {
            return Navigation::Ignored;
        }
        self.save_current(&form.score, &form.response);
        let target = self.current_index - 1;
        self.move_to(target, form)
    }

    /// Jumps to a 1-based row number typed by the user.
    pub fn go_to(&mut self, row_number: &str, form: &mut ReviewForm) -> Navigation {
        if self.complete {
            return Navigation::Ignored;
        }
        let Some(target) = resolve_row_number(row_number, self.row_count()) else {
            return Navigation::Ignored;
        };
        self.save_current(&form.score, &form.response);
        self.move_to(target, form)
    }

    pub fn export_csv(&self, unreviewed: UnreviewedRows) -> String {
        self.export_csv_with(&EXPORT_COLUMNS, unreviewed, |annotation| match annotation {
            Some(annotation) => vec![annotation.score.clone(), annotation.response.clone()],
            None => vec![String::new(), String::new()],
        })
    }

    /// Serializes the table with `extra_columns` appended. Annotated rows use
    /// the row snapshot taken at save time.
    pub fn export_csv_with<F>(
        &self,
        extra_columns: &[&str],
        unreviewed: UnreviewedRows,
        extract: F,
    ) -> String
    where
        F: Fn(Option<&Annotation>) -> Vec<String>,
    {
        let rows = self
            .table
            .rows()
            .iter()
            .enumerate()
            .filter_map(|(index, cells)| match self.annotations.get(&index) {
                Some(annotation) => Some(AnnotatedRow {
                    cells: &annotation.row_data,
                    extra: extract(Some(annotation)),
                }),
                None => match unreviewed {
                    UnreviewedRows::Blank => Some(AnnotatedRow {
                        cells,
                        extra: extract(None),
                    }),
                    UnreviewedRows::Omit => None,
                },
            });
        serialize(self.table.headers(), extra_columns, rows)
    }

    fn move_to(&mut self, target: usize, form: &mut ReviewForm) -> Navigation {
        let from = self.current_index;
        self.current_index = target;
        *form = self.load_form(target);
        append_run_log(
            "debug",
            "session.navigated",
            json!({ "from": from + 1, "to": target + 1 }),
        );
        Navigation::Moved { from, to: target }
    }

    fn persist(&self) {
        let len = self
            .annotations
            .keys()
            .next_back()
            .map(|last| last + 1)
            .unwrap_or(0);
        let mut slots: Vec<Option<&Annotation>> = vec![None; len];
        for (index, annotation) in &self.annotations {
            slots[*index] = Some(annotation);
        }
        if let Err(error) = store::save(self.store.as_ref(), REVIEWED_DATA_KEY, &slots) {
            append_run_log(
                "warn",
                "session.persist.failed",
                json!({ "error": error.to_string() }),
            );
        }
    }
}

/// Maps user text to a 0-based row index, `None` when it is not an integer
/// or falls outside `1..=row_count`.
///
/// Parsing is strict: `2.5` and `3abc` are rejected rather than truncated to
/// a leading integer. Loosening this only touches this function.
pub fn resolve_row_number(text: &str, row_count: usize) -> Option<usize> {
    let number = text.trim().parse::<i64>().ok()?;
    let index = usize::try_from(number.checked_sub(1)?).ok()?;
    (index < row_count).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_codec::parse;
    use crate::store::MemoryStore;

    fn session(raw: &str) -> (ReviewSession, MemoryStore) {
        let store = MemoryStore::new();
        let table = parse(raw).expect("parse");
        (ReviewSession::new(table, Arc::new(store.clone())), store)
    }

    #[test]
    fn row_numbers_resolve_only_inside_the_table() {
        assert_eq!(resolve_row_number("1", 5), Some(0));
        assert_eq!(resolve_row_number(" 5 ", 5), Some(4));
        assert_eq!(resolve_row_number("0", 5), None);
        assert_eq!(resolve_row_number("-3", 5), None);
        assert_eq!(resolve_row_number("6", 5), None);
        assert_eq!(resolve_row_number("two", 5), None);
        assert_eq!(resolve_row_number("", 5), None);
        assert_eq!(resolve_row_number("2.5", 5), None);
        assert_eq!(resolve_row_number("3abc", 5), None);
    }

    #[test]
    fn saved_annotations_are_persisted_as_sparse_array() {
        let (mut session, store) = session("h\na\nb\nc\n");
        let mut form = ReviewForm::new("1", "first");
        session.go_to("3", &mut form);
        form = ReviewForm::new("3", "third");
        session.save_current(&form.score, &form.response);

        let raw = store.raw(REVIEWED_DATA_KEY).expect("persisted");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(
            value,
            json!([
                {"rowData": ["a"], "score": "1", "response": "first"},
                null,
                {"rowData": ["c"], "score": "3", "response": "third"}
            ])
        );
    }

    #[test]
    fn persist_failure_keeps_in_memory_annotation() {
        let (mut session, store) = session("h\na\nb\n");
        store.set_fail_writes(true);
        assert!(session.save_current("9", "kept"));
        assert_eq!(session.annotation(0).map(|a| a.score.as_str()), Some("9"));
        assert_eq!(store.raw(REVIEWED_DATA_KEY), None);
    }

    #[test]
    fn resume_restores_table_and_annotations() {
        let store = MemoryStore::new();
        let table = parse("h\na\nb\n").expect("parse");
        store::save(&store, CSV_DATA_KEY, &table).expect("save table");
        {
            let mut first = ReviewSession::new(table, Arc::new(store.clone()));
            let mut form = ReviewForm::new("", "");
            first.go_to("2", &mut form);
            first.save_current("7", "second row");
        }

        let resumed = ReviewSession::resume(Arc::new(store)).expect("resume");
        assert_eq!(resumed.current_index(), 0);
        assert_eq!(resumed.reviewed_count(), 2);
        assert_eq!(resumed.load_form(1), ReviewForm::new("7", "second row"));
        assert_eq!(resumed.load_form(0), ReviewForm::default());
    }

    #[test]
    fn resume_without_table_asks_for_upload() {
        let err = ReviewSession::resume(Arc::new(MemoryStore::new())).err().expect("no table");
        assert!(matches!(err, ReviewError::NoTable));
    }

    #[test]
    fn resume_rejects_annotations_past_table_end() {
        let store = MemoryStore::new();
        let table = parse("h\na\n").expect("parse");
        store::save(&store, CSV_DATA_KEY, &table).expect("save table");
        store
            .save_raw(
                REVIEWED_DATA_KEY,
                r#"[null,{"rowData":["x"],"score":"1","response":""}]"#,
            )
            .expect("seed");
        let err = ReviewSession::resume(Arc::new(store)).err().expect("corrupt");
        assert!(matches!(err, ReviewError::CorruptState(_)));
    }

    #[test]
    fn resume_rejects_wrong_table_shape() {
        let store = MemoryStore::new();
        store.save_raw(CSV_DATA_KEY, r#"{"headers":"nope"}"#).expect("seed");
        let err = ReviewSession::resume(Arc::new(store)).err().expect("corrupt");
        assert!(matches!(err, ReviewError::CorruptState(_)));
    }

    #[test]
    fn navigation_after_completion_is_ignored() {
        let (mut session, _) = session("h\nonly\n");
        let mut form = ReviewForm::new("1", "done");
        assert_eq!(session.next(&mut form), Navigation::Completed);
        assert_eq!(session.next(&mut form), Navigation::Ignored);
        assert_eq!(session.previous(&mut form), Navigation::Ignored);
        assert_eq!(session.go_to("1", &mut form), Navigation::Ignored);
        assert_eq!(session.state(), SessionState::Complete);
    }

    #[test]
    fn custom_extractor_controls_appended_fields() {
        let (mut session, _) = session("a,b\n1,2\n3,4\n");
        session.save_current("5", "fine");
        let out = session.export_csv_with(&["Verdict"], UnreviewedRows::Omit, |annotation| {
            vec![annotation.map(|a| a.score.clone()).unwrap_or_default()]
        });
        assert_eq!(out, "a,b,Verdict\n1,2,5");
    }
}
