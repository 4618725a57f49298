// ==========================================
// Rural Sales IMS - customer row extractor
// ==========================================

use crate::domain::customer::CustomerCandidate;
use crate::domain::sheet::{CleanSheet, Provenance};
use crate::engine::field::{is_blank_row, is_header_row, FieldResolver};
use tracing::debug;

/// Place tokens recognised inside customer names, used to infer a
/// village or taluka when the sheet carries no location columns.
const GAZETTEER: [(&str, &str, &str); 8] = [
    ("AMIYAD", "Amiyad", ""),
    ("AMVAD", "Amvad", ""),
    ("ANKALAV", "", "Ankalav"),
    ("PETLAD", "", "Petlad"),
    ("BORSAD", "", "Borsad"),
    ("VADODARA", "", "Vadodara"),
    ("ANAND", "", "Anand"),
    ("NADIAD", "", "Nadiad"),
];

/// Village and taluka inferred from the first gazetteer token found in
/// the name, if any.
fn location_from_name(name: &str) -> (String, String) {
    let name_upper = name.to_uppercase();
    for (token, village, taluka) in GAZETTEER {
        if name_upper.contains(token) {
            return (village.to_string(), taluka.to_string());
        }
    }
    (String::new(), String::new())
}

/// Extracts one candidate per non-header row carrying identity signal
/// (a name or a code). Fields resolve by label first, then by the
/// conventional column position of roster exports.
pub fn extract_customers(sheet: &CleanSheet, provenance: &Provenance) -> Vec<CustomerCandidate> {
    let resolver = FieldResolver::new(sheet);
    let has_location_columns = sheet.has_column("VILLAGE") || sheet.has_column("TALUKA");
    let mut candidates = Vec::new();

    for row in &sheet.rows {
        if is_blank_row(row) || is_header_row(row) {
            continue;
        }

        let mut candidate = CustomerCandidate {
            customer_code: resolver.string(row, "CODE", 0),
            name: resolver.string(row, "NAME", 1),
            mobile: resolver.string(row, "MOBILE", 2),
            village: resolver.string(row, "VILLAGE", 3),
            taluka: resolver.string(row, "TALUKA", 4),
            district: resolver.string(row, "DISTRICT", 5),
            provenance: provenance.clone(),
        };
        if !candidate.has_identity() {
            continue;
        }

        // Roster codes are zero-padded to a fixed width.
        if !candidate.customer_code.is_empty() {
            candidate.customer_code = format!("{:0>4}", candidate.customer_code);
        }

        if !has_location_columns && candidate.village.is_empty() && candidate.taluka.is_empty() {
            let (village, taluka) = location_from_name(&candidate.name);
            candidate.village = village;
            candidate.taluka = taluka;
        }

        candidates.push(candidate);
    }

    debug!(sheet = %sheet.name, customers = candidates.len(), "extracted customer sheet");
    candidates
}
