// ==========================================
// Rural Sales IMS - field extraction
// ==========================================
// Two-stage cell resolution: by column label (substring alias match),
// orElse by position, orElse the type's zero value. Extraction never
// fails; it degrades to defaults.
// ==========================================

use crate::domain::sheet::CleanSheet;
use chrono::NaiveDate;

/// First cell vocabulary marking a row as a repeated header inside the
/// data area. Deliberately imprecise: a customer actually named
/// "Sr Village Patel" would be misclassified, which is the accepted
/// trade-off against ingesting header text as entities.
const HEADER_INDICATORS: [&str; 11] = [
    "DATE", "VILLAGE", "TALUKA", "DISTRICT", "MANTRI", "SABHASAD", "CONTACT", "TOTAL", "SR",
    "NO", "NAME",
];

/// Resolves fields of one sheet's rows by label or position.
pub struct FieldResolver<'a> {
    sheet: &'a CleanSheet,
}

impl<'a> FieldResolver<'a> {
    pub fn new(sheet: &'a CleanSheet) -> Self {
        Self { sheet }
    }

    /// Raw cell text for a field: first column whose label contains the
    /// (uppercased) alias, else the positional fallback, else "".
    pub fn cell<'r>(&self, row: &'r [String], alias: &str, fallback_idx: usize) -> &'r str {
        let alias = alias.trim().to_uppercase();
        let idx = self
            .sheet
            .find_column(&alias)
            .unwrap_or(fallback_idx);
        row.get(idx).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn string(&self, row: &[String], alias: &str, fallback_idx: usize) -> String {
        self.cell(row, alias, fallback_idx).trim().to_string()
    }

    pub fn number(&self, row: &[String], alias: &str, fallback_idx: usize) -> f64 {
        coerce_f64(self.cell(row, alias, fallback_idx))
    }

    pub fn integer(&self, row: &[String], alias: &str, fallback_idx: usize) -> i64 {
        coerce_i64(self.cell(row, alias, fallback_idx))
    }

    pub fn date(&self, row: &[String], alias: &str, fallback_idx: usize) -> Option<NaiveDate> {
        parse_date(self.cell(row, alias, fallback_idx))
    }
}

/// Numeric coercion: integer- or float-formatted text, anything else is 0.
pub fn coerce_f64(raw: &str) -> f64 {
    raw.trim().replace(',', "").parse::<f64>().unwrap_or(0.0)
}

/// Integer coercion truncates float-formatted text ("12.0" -> 12).
pub fn coerce_i64(raw: &str) -> i64 {
    coerce_f64(raw) as i64
}

/// Best-effort date parsing over the formats seen in the field exports.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    const FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d"];
    FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
}

/// True when the row's first cell contains a header-vocabulary token.
pub fn is_header_row(row: &[String]) -> bool {
    let first = match row.first() {
        Some(cell) => cell.trim().to_uppercase(),
        None => return true,
    };
    if first.is_empty() {
        return false;
    }
    HEADER_INDICATORS.iter().any(|ind| first.contains(ind))
}

/// True when every cell is blank.
pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(headers: &[&str]) -> CleanSheet {
        CleanSheet {
            name: "Sheet1".to_string(),
            headers: headers.iter().map(|h| h.to_uppercase()).collect(),
            rows: Vec::new(),
        }
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_label_match_beats_position() {
        let s = sheet(&["SR NO", "CUST MOBILE NO", "NAME"]);
        let r = FieldResolver::new(&s);
        let data = row(&["1", "9876543210", "Ramesh"]);
        assert_eq!(r.string(&data, "MOBILE", 0), "9876543210");
    }

    #[test]
    fn test_positional_fallback_when_label_absent() {
        let s = sheet(&["A", "B", "C"]);
        let r = FieldResolver::new(&s);
        let data = row(&["x", "y", "z"]);
        assert_eq!(r.string(&data, "MOBILE", 2), "z");
    }

    #[test]
    fn test_missing_cell_yields_zero_values() {
        let s = sheet(&["A"]);
        let r = FieldResolver::new(&s);
        let data = row(&[]);
        assert_eq!(r.string(&data, "MOBILE", 7), "");
        assert_eq!(r.number(&data, "QTY", 7), 0.0);
        assert_eq!(r.integer(&data, "QTY", 7), 0);
        assert_eq!(r.date(&data, "DATE", 7), None);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(coerce_f64("680"), 680.0);
        assert_eq!(coerce_f64("680.50"), 680.5);
        assert_eq!(coerce_f64("1,300"), 1300.0);
        assert_eq!(coerce_f64("not a number"), 0.0);
        assert_eq!(coerce_i64("12.0"), 12);
        assert_eq!(coerce_i64("abc"), 0);
    }

    #[test]
    fn test_date_parsing_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(parse_date("2025-03-15"), Some(expected));
        assert_eq!(parse_date("15-03-2025"), Some(expected));
        assert_eq!(parse_date("15/03/2025"), Some(expected));
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_header_row_detection() {
        assert!(is_header_row(&row(&["SR NO", "NAME"])));
        assert!(is_header_row(&row(&["Village", "Taluka"])));
        assert!(!is_header_row(&row(&["Ramesh", "Amiyad"])));
        assert!(!is_header_row(&row(&["", "Suresh Patel"])));
    }
}
