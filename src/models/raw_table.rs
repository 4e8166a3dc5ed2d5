use crate::utils::constants::MISSING_TOKENS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A single parsed cell. The parser assigns no column semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Classify a raw field: NA tokens are empty, anything `f64` accepts is a number.
    pub fn parse(field: &str) -> Self {
        let trimmed = field.trim();
        if MISSING_TOKENS.contains(&trimmed) {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            // "nan"/"inf" spellings are already handled as tokens or are not data
            Ok(value) if value.is_finite() => Cell::Number(value),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Cell::Number(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Cell::Text(_))
    }

    /// Integer value when the cell is a whole number (e.g. `7` or `7.0`).
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Cell::Number(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Some(*v as i64),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) if v.fract() == 0.0 => write!(f, "{}", *v as i64),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Empty => write!(f, "NA"),
        }
    }
}

/// Splitting rule inferred from file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Tab,
    Comma,
    Semicolon,
    Pipe,
    Whitespace,
}

impl Delimiter {
    /// Detection priority; earlier wins ties.
    pub const CANDIDATES: [Delimiter; 5] = [
        Delimiter::Tab,
        Delimiter::Comma,
        Delimiter::Semicolon,
        Delimiter::Pipe,
        Delimiter::Whitespace,
    ];

    /// Byte delimiter for the CSV reader; `None` for whitespace runs.
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            Delimiter::Tab => Some(b'\t'),
            Delimiter::Comma => Some(b','),
            Delimiter::Semicolon => Some(b';'),
            Delimiter::Pipe => Some(b'|'),
            Delimiter::Whitespace => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Delimiter::Tab => "tab",
            Delimiter::Comma => "comma",
            Delimiter::Semicolon => "semicolon",
            Delimiter::Pipe => "pipe",
            Delimiter::Whitespace => "whitespace",
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the source file.
    pub line_number: usize,
    pub cells: Vec<Cell>,
}

impl RawRow {
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Row content re-joined for anomaly output.
    pub fn render(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of detecting the splitting rule over the leading sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelimiterDetection {
    pub delimiter: Delimiter,
    /// Modal field count in the sample.
    pub sample_width: usize,
    pub sampled_lines: usize,
    /// Sampled lines that split to `sample_width` fields.
    pub agreeing_lines: usize,
}

impl DelimiterDetection {
    pub fn is_unanimous(&self) -> bool {
        self.agreeing_lines == self.sampled_lines
    }
}

#[derive(Debug, Clone)]
pub struct RawTable {
    pub source: PathBuf,
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
    pub detection: DelimiterDetection,
    pub has_header: bool,
}

impl RawTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Inferred column count (the detected sample width).
    pub fn column_count(&self) -> usize {
        self.detection.sample_width
    }

    pub fn delimiter(&self) -> Delimiter {
        self.detection.delimiter
    }
}
