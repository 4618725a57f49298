// ==========================================
// Rural Sales IMS - sheet classifier
// ==========================================
// Rule-based classification from column headers: three keyword sets
// scored by match count, ties broken by fixed priority (sales >
// customers > distributors). Unknown is a normal, non-fatal outcome.
// ==========================================

use crate::domain::sheet::{CleanSheet, SheetKind};

/// Minimum distinct keyword matches required to claim a sheet.
///
/// Batch mode scans unattended directories and accepts a single keyword;
/// the interactive path demands two to keep stray sheets out of the live
/// store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyMode {
    FileBatch,
    Interactive,
}

impl ClassifyMode {
    fn min_matches(&self) -> usize {
        match self {
            ClassifyMode::FileBatch => 1,
            ClassifyMode::Interactive => 2,
        }
    }
}

/// Keyword table, one row per entity type, in priority order.
const KEYWORD_TABLE: [(SheetKind, &[&str]); 3] = [
    (
        SheetKind::Sales,
        &[
            "INV", "DISPATCH", "QTN", "QTY", "RATE", "AMT", "PAYMENT", "G-PAY", "CASH", "CHQ",
        ],
    ),
    (
        SheetKind::Customers,
        &[
            "NAME", "MOBILE", "VILLAGE", "TALUKA", "DISTRICT", "MEMBER", "CODE",
        ],
    ),
    (
        SheetKind::Distributors,
        &["MANTRI", "SABHASAD", "CONTACT", "GROUP", "TOTAL LTR"],
    ),
];

/// Classify a cleaned worksheet from its header labels.
///
/// Empty wins before any keyword evaluation. Among the entity types
/// whose keyword sets reach the mode's threshold, the highest match
/// count wins; ties fall to the table's priority order. Distributor
/// rosters share location and name tokens with customer rosters, so a
/// plain first-hit scan would never reach the distributor row.
pub fn classify_sheet(sheet: &CleanSheet, mode: ClassifyMode) -> SheetKind {
    if sheet.is_empty() {
        return SheetKind::Empty;
    }

    let corpus = sheet.header_corpus();
    let mut best = SheetKind::Unknown;
    let mut best_matches = 0usize;
    for (kind, keywords) in KEYWORD_TABLE.iter() {
        let matches = keywords.iter().filter(|kw| corpus.contains(**kw)).count();
        // Strictly greater keeps earlier table rows on ties.
        if matches >= mode.min_matches() && matches > best_matches {
            best = *kind;
            best_matches = matches;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_with_headers(headers: &[&str]) -> CleanSheet {
        CleanSheet {
            name: "Sheet1".to_string(),
            headers: headers.iter().map(|h| h.to_uppercase()).collect(),
            rows: vec![vec![String::from("x"); headers.len()]],
        }
    }

    #[test]
    fn test_sales_headers_classify_as_sales() {
        let sheet = sheet_with_headers(&["SR NO", "INVOICE", "CUSTOMER NAME", "QTY", "RATE"]);
        assert_eq!(
            classify_sheet(&sheet, ClassifyMode::Interactive),
            SheetKind::Sales
        );
    }

    #[test]
    fn test_customer_headers_classify_as_customers() {
        let sheet = sheet_with_headers(&["CODE", "NAME", "MOBILE", "VILLAGE"]);
        assert_eq!(
            classify_sheet(&sheet, ClassifyMode::FileBatch),
            SheetKind::Customers
        );
    }

    #[test]
    fn test_distributor_headers_classify_as_distributors() {
        let sheet = sheet_with_headers(&["MANTRI NAME", "SABHASAD COUNT", "TOTAL LTR"]);
        assert_eq!(
            classify_sheet(&sheet, ClassifyMode::FileBatch),
            SheetKind::Distributors
        );
    }

    #[test]
    fn test_sales_has_priority_over_customers() {
        // NAME and VILLAGE also match the customer set; INV + RATE wins first
        let sheet = sheet_with_headers(&["INV NO", "NAME", "VILLAGE", "RATE"]);
        assert_eq!(
            classify_sheet(&sheet, ClassifyMode::Interactive),
            SheetKind::Sales
        );
    }

    #[test]
    fn test_distributor_roster_outscores_customer_tokens() {
        // Shares NAME/VILLAGE/TALUKA with the customer set but carries
        // more distributor tokens.
        let sheet = sheet_with_headers(&[
            "SR", "VILLAGE", "TALUKA", "MANTRI NAME", "SABHASAD", "CONTACT IN GROUP", "TOTAL LTR",
        ]);
        assert_eq!(
            classify_sheet(&sheet, ClassifyMode::Interactive),
            SheetKind::Distributors
        );
    }

    #[test]
    fn test_single_keyword_needs_batch_mode() {
        let sheet = sheet_with_headers(&["MANTRI", "COL B"]);
        assert_eq!(
            classify_sheet(&sheet, ClassifyMode::FileBatch),
            SheetKind::Distributors
        );
        assert_eq!(
            classify_sheet(&sheet, ClassifyMode::Interactive),
            SheetKind::Unknown
        );
    }

    #[test]
    fn test_no_keywords_is_unknown() {
        let sheet = sheet_with_headers(&["ALPHA", "BETA", "GAMMA"]);
        assert_eq!(
            classify_sheet(&sheet, ClassifyMode::FileBatch),
            SheetKind::Unknown
        );
    }

    #[test]
    fn test_empty_sheet_is_empty_before_keywords() {
        let sheet = CleanSheet {
            name: "Blank".to_string(),
            headers: Vec::new(),
            rows: Vec::new(),
        };
        assert_eq!(
            classify_sheet(&sheet, ClassifyMode::FileBatch),
            SheetKind::Empty
        );
    }
}
