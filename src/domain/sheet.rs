// ==========================================
// Rural Sales IMS - worksheet value types
// ==========================================
// Responsibility: in-memory representation of parsed worksheets
// Constraint: no file I/O here, the importer produces these
// ==========================================

use serde::{Deserialize, Serialize};

/// One worksheet as parsed from a workbook, before cleaning.
///
/// Cells are trimmed strings; a blank cell is the empty string. The first
/// non-blank row is promoted to headers by the importer's cleaning step.
#[derive(Debug, Clone)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// A cleaned worksheet: fully blank rows and columns dropped, header
/// labels uppercased and trimmed.
#[derive(Debug, Clone)]
pub struct CleanSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CleanSheet {
    /// True when nothing survived cleaning (no headers and no data cells).
    pub fn is_empty(&self) -> bool {
        self.headers.iter().all(|h| h.is_empty())
            && self
                .rows
                .iter()
                .all(|row| row.iter().all(|cell| cell.is_empty()))
    }

    /// All header labels joined into a single search corpus.
    pub fn header_corpus(&self) -> String {
        self.headers.join(" ")
    }

    /// Index of the first column whose label contains `token`.
    pub fn find_column(&self, token: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.contains(token))
    }

    /// Indexes of every column whose label contains `token`.
    pub fn columns_with<'a>(&'a self, token: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.headers
            .iter()
            .enumerate()
            .filter(move |(_, h)| h.contains(token))
            .map(|(i, _)| i)
    }

    /// True when any header label contains `token`.
    pub fn has_column(&self, token: &str) -> bool {
        self.find_column(token).is_some()
    }
}

/// Entity classification of a worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SheetKind {
    Sales,
    Customers,
    Distributors,
    Unknown,
    Empty,
}

/// Source file and sheet stamped on every extracted record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_file: String,
    pub source_sheet: String,
}

impl Provenance {
    pub fn new(source_file: &str, source_sheet: &str) -> Self {
        Self {
            source_file: source_file.to_string(),
            source_sheet: source_sheet.to_string(),
        }
    }
}
