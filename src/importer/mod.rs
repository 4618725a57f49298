// ==========================================
// Rural Sales IMS - importer layer
// ==========================================
// Responsibility: turn spreadsheet files into cleaned in-memory sheets
// Constraint: no classification, no store access
// ==========================================

pub mod error;
pub mod workbook;

pub use error::ImportError;
pub use workbook::{clean_sheet, WorkbookParser};
