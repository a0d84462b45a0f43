//! CSV text <-> [`Table`] conversion.
//!
//! Parsing follows RFC4180 quoting with lenient line endings and greedy
//! blank-line skipping. Serialization quotes a field only when it contains a
//! delimiter, a double quote, or a line break.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

pub const DELIMITER: char = ',';
pub const QUOTE: char = '"';
pub const LINE_TERMINATOR: &str = "\n";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no header: CSV must contain a header and at least one data row")]
    NoHeader,
    #[error("no data: every data row is empty")]
    NoData,
    #[error("malformed quoting: quoted field opened on line {line} is never closed")]
    MalformedQuoting { line: usize },
}

impl ParseError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NoHeader => "no header",
            Self::NoData => "no data",
            Self::MalformedQuoting { .. } => "malformed quoting",
        }
    }
}

/// Header row plus the non-blank data rows of an uploaded file.
///
/// Rows are not required to match the header width; [`Table::cell`] yields
/// `None` past the end of a short row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TableParts")]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct TableParts {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TryFrom<TableParts> for Table {
    type Error = ParseError;

    fn try_from(parts: TableParts) -> Result<Self, Self::Error> {
        Table::new(parts.headers, parts.rows)
    }
}

impl Table {
    /// Builds a table, dropping blank rows. Fails when no rows survive.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, ParseError> {
        let rows = rows
            .into_iter()
            .filter(|row| !is_blank_record(row))
            .collect::<Vec<_>>();
        if rows.is_empty() {
            return Err(ParseError::NoData);
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn header(&self, column: usize) -> Option<&str> {
        self.headers.get(column).map(String::as_str)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
    }
}

/// One output line: the original cells followed by the appended fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedRow<'a> {
    pub cells: &'a [String],
    pub extra: Vec<String>,
}

pub fn parse(raw: &str) -> Result<Table, ParseError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut records = tokenize(raw)?
        .into_iter()
        .filter(|record| !is_blank_record(record));

    let headers = records.next().ok_or(ParseError::NoHeader)?;
    let rows = records.collect::<Vec<_>>();
    if rows.is_empty() {
        return Err(ParseError::NoHeader);
    }
    Table::new(headers, rows)
}

pub fn serialize<'a, R>(headers: &[String], extra_columns: &[&str], rows: R) -> String
where
    R: IntoIterator<Item = AnnotatedRow<'a>>,
{
    let header_line = serialize_record(
        headers
            .iter()
            .map(String::as_str)
            .chain(extra_columns.iter().copied()),
    );
    let mut lines = vec![header_line];
    for row in rows {
        lines.push(serialize_record(
            row.cells
                .iter()
                .map(String::as_str)
                .chain(row.extra.iter().map(String::as_str)),
        ));
    }
    lines.join(LINE_TERMINATOR)
}

pub fn serialize_record<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    fields
        .into_iter()
        .map(quote_field)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn quote_field(field: &str) -> Cow<'_, str> {
    let needs_quotes = field
        .chars()
        .any(|ch| matches!(ch, DELIMITER | QUOTE | '\n' | '\r'));
    if !needs_quotes {
        return Cow::Borrowed(field);
    }
    Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
}

pub fn is_blank_record(record: &[String]) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

fn tokenize(raw: &str) -> Result<Vec<Vec<String>>, ParseError> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut chars = raw.chars().peekable();

    let mut line = 1usize;
    let mut quote_opened_on = 0usize;
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut record_open = false;

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                QUOTE if chars.peek() == Some(&QUOTE) => {
                    chars.next();
                    field.push(QUOTE);
                }
                QUOTE => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                '\r' => {
                    if chars.peek() != Some(&'\n') {
                        line += 1;
                    }
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            QUOTE if at_field_start => {
                in_quotes = true;
                quote_opened_on = line;
                at_field_start = false;
                record_open = true;
            }
            DELIMITER => {
                record.push(std::mem::take(&mut field));
                at_field_start = true;
                record_open = true;
            }
            '\r' | '\n' => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                line += 1;
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
                at_field_start = true;
                record_open = false;
            }
            _ => {
                field.push(ch);
                at_field_start = false;
                record_open = true;
            }
        }
    }

    if in_quotes {
        return Err(ParseError::MalformedQuoting {
            line: quote_opened_on,
        });
    }
    if record_open {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}
