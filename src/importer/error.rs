// ==========================================
// Rural Sales IMS - importer error types
// ==========================================
// Tool: thiserror derive macro
// ==========================================

use thiserror::Error;

/// File-level import errors.
///
/// These are recoverable at the batch level: one unreadable workbook is
/// logged and skipped, the batch continues.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (only .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("file read failed: {0}")]
    FileReadError(String),

    #[error("Excel parse failed: {0}")]
    ExcelParseError(String),

    #[error("CSV parse failed: {0}")]
    CsvParseError(String),
}
