// ==========================================
// Rural Sales IMS - distributor row extractor
// ==========================================

use crate::domain::distributor::DistributorCandidate;
use crate::domain::sheet::{CleanSheet, Provenance};
use crate::engine::field::{is_blank_row, is_header_row, FieldResolver};
use tracing::debug;

/// Splits the sheet's NAME-labeled columns between the distributor
/// display name and the mantri name, keyed on whether MANTRI co-occurs
/// in the label.
fn resolve_names(sheet: &CleanSheet, row: &[String]) -> (String, String) {
    let mut name = String::new();
    let mut mantri_name = String::new();
    for idx in sheet.columns_with("NAME") {
        let cell = match row.get(idx) {
            Some(c) if !c.is_empty() => c.clone(),
            _ => continue,
        };
        if sheet.headers[idx].contains("MANTRI") {
            mantri_name = cell;
        } else {
            name = cell;
        }
    }
    (name, mantri_name)
}

/// Extracts one candidate per non-header row. Rows missing both village
/// and taluka are rejected as carrying too little identity signal; a
/// missing display name is synthesized from the locations.
pub fn extract_distributors(
    sheet: &CleanSheet,
    provenance: &Provenance,
) -> Vec<DistributorCandidate> {
    let resolver = FieldResolver::new(sheet);
    let mut candidates = Vec::new();

    for row in &sheet.rows {
        if is_blank_row(row) || is_header_row(row) {
            continue;
        }

        let (name, mantri_name) = resolve_names(sheet, row);
        let village = resolver.string(row, "VILLAGE", 1);
        let taluka = resolver.string(row, "TALUKA", 2);
        if village.is_empty() && taluka.is_empty() {
            continue;
        }

        let name = if !name.is_empty() {
            name
        } else if !village.is_empty() && !taluka.is_empty() {
            format!("{} - {}", village, taluka)
        } else if !village.is_empty() {
            village.clone()
        } else {
            taluka.clone()
        };

        candidates.push(DistributorCandidate {
            name,
            village,
            taluka,
            district: resolver.string(row, "DISTRICT", 3),
            mantri_name,
            mantri_mobile: resolver.string(row, "MOBILE", 5),
            sabhasad_count: resolver.integer(row, "SABHASAD", 6),
            contact_in_group: resolver.integer(row, "CONTACT", 7),
            total_liters: resolver.number(row, "LTR", 8),
            provenance: provenance.clone(),
        });
    }

    debug!(sheet = %sheet.name, distributors = candidates.len(), "extracted distributor sheet");
    candidates
}
