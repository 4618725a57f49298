// ==========================================
// Rural Sales IMS - sales row extractor
// ==========================================
// Sales sheets follow a loose grouping convention: a row whose first
// cell is a pure serial number opens a new sale, and packing detail
// cells on that row or following rows contribute line items to the
// most recently opened sale. Values omitted on later rows persist from
// the previous row, as spreadsheets commonly leave repeats blank.
// ==========================================

use crate::domain::product::spec_for_packing;
use crate::domain::sale::{SaleCandidate, SaleItemCandidate};
use crate::domain::sheet::{CleanSheet, Provenance};
use crate::engine::field::{coerce_f64, is_blank_row, parse_date};
use tracing::debug;

/// Scan state carried across the rows of one sales sheet.
///
/// Passed into each row step and updated in place instead of living as
/// ambient mutable variables inside the loop.
#[derive(Debug, Default)]
pub struct SalesScan {
    pub invoice_no: String,
    pub customer_name: String,
    pub village: String,
    pub taluka: String,
    pub district: String,
    pub sale_ordinal: usize,
}

impl SalesScan {
    /// Takes the non-blank cell of the first column whose label contains
    /// `token`, keeping the previous value otherwise.
    fn carry(sheet: &CleanSheet, row: &[String], token: &str, slot: &mut String) {
        for idx in sheet.columns_with(token) {
            if let Some(cell) = row.get(idx) {
                if !cell.is_empty() {
                    *slot = cell.clone();
                    return;
                }
            }
        }
    }

    /// Opens a new sale at a serial-numbered row, updating the carried
    /// invoice/customer/location state from whatever the row supplies.
    fn open_sale(
        &mut self,
        sheet: &CleanSheet,
        row: &[String],
        provenance: &Provenance,
    ) -> SaleCandidate {
        self.sale_ordinal += 1;

        let mut invoice_no = String::new();
        Self::carry(sheet, row, "INV", &mut invoice_no);
        if invoice_no.is_empty() {
            invoice_no = format!(
                "INV_{}_{}_{}",
                provenance.source_file, provenance.source_sheet, self.sale_ordinal
            );
        }
        self.invoice_no = invoice_no;

        Self::carry(sheet, row, "NAME", &mut self.customer_name);
        if self.customer_name.is_empty() {
            self.customer_name = "Unknown Customer".to_string();
        }
        Self::carry(sheet, row, "VILLAGE", &mut self.village);
        Self::carry(sheet, row, "TALUKA", &mut self.taluka);
        Self::carry(sheet, row, "DISTRICT", &mut self.district);

        let mut sale = SaleCandidate {
            invoice_no: self.invoice_no.clone(),
            customer_name: self.customer_name.clone(),
            village: self.village.clone(),
            taluka: self.taluka.clone(),
            district: self.district.clone(),
            provenance: provenance.clone(),
            ..SaleCandidate::default()
        };

        for (idx, label) in sheet.headers.iter().enumerate() {
            let cell = match row.get(idx) {
                Some(c) if !c.is_empty() => c.as_str(),
                _ => continue,
            };
            if label.contains("DATE") {
                let parsed = parse_date(cell);
                if label.contains("DISPATCH") {
                    sale.dispatch_date = parsed;
                } else if label.contains("PAYMENT") {
                    sale.payment_date = parsed;
                } else {
                    sale.sale_date = parsed;
                }
            }
            if label.contains("AMT") && label.contains("FINAL") {
                sale.total_amount = coerce_f64(cell);
            }
            if label.contains("LTR") && label.contains("TOTAL") {
                sale.total_liters = coerce_f64(cell);
            }
            if label.contains("G-PAY") {
                sale.gpay_amount = coerce_f64(cell);
            }
            if label.contains("CASH") {
                sale.cash_amount = coerce_f64(cell);
            }
            if label.contains("CHQ") {
                sale.cheque_amount = coerce_f64(cell);
            }
            if label.contains("RRN") {
                sale.rrn = cell.to_string();
            } else if label.contains("REF") {
                sale.reference = cell.to_string();
            }
        }

        sale
    }
}

/// Detail line on the current row, if any. Quantity and amount are
/// derived from each other when one is missing; the rate defaults to
/// the catalog rate when the packing matches a known product.
fn extract_item(
    sheet: &CleanSheet,
    row: &[String],
    scan: &SalesScan,
    provenance: &Provenance,
) -> Option<SaleItemCandidate> {
    let packing_idx = sheet
        .find_column("PACKING")
        .or_else(|| sheet.find_column("PRODUCT"))?;
    let packing = row.get(packing_idx)?.trim();
    if packing.is_empty() {
        return None;
    }

    let mut quantity = 0.0;
    let mut rate = spec_for_packing(packing).map(|s| s.standard_rate).unwrap_or(0.0);
    let mut amount = 0.0;

    for (idx, label) in sheet.headers.iter().enumerate() {
        let cell = match row.get(idx) {
            Some(c) if !c.is_empty() => c.as_str(),
            _ => continue,
        };
        if label.contains("QTY") || label.contains("QTN") {
            quantity = coerce_f64(cell);
        } else if label.contains("RATE") {
            rate = coerce_f64(cell);
        } else if label.contains("AMT") && !label.contains("FINAL") {
            amount = coerce_f64(cell);
        }
    }

    if quantity == 0.0 && amount > 0.0 && rate > 0.0 {
        quantity = amount / rate;
    }
    if amount == 0.0 {
        amount = quantity * rate;
    }

    Some(SaleItemCandidate {
        invoice_no: scan.invoice_no.clone(),
        product_name: packing.to_string(),
        quantity,
        rate,
        amount,
        provenance: provenance.clone(),
    })
}

/// Extracts all sale records and line items from a sales-classified
/// sheet. Missing invoice numbers are synthesized from file, sheet and
/// sale ordinal so they stay unique within the batch.
pub fn extract_sales(
    sheet: &CleanSheet,
    provenance: &Provenance,
) -> (Vec<SaleCandidate>, Vec<SaleItemCandidate>) {
    let mut sales = Vec::new();
    let mut items = Vec::new();
    let mut scan = SalesScan::default();

    for row in &sheet.rows {
        if is_blank_row(row) {
            continue;
        }

        let opens_sale = row
            .first()
            .map(|c| !c.is_empty() && c.chars().all(|ch| ch.is_ascii_digit()))
            .unwrap_or(false);
        if opens_sale {
            sales.push(scan.open_sale(sheet, row, provenance));
        }

        // Detail lines may sit on the opening row or on continuation rows.
        if !scan.invoice_no.is_empty() {
            if let Some(item) = extract_item(sheet, row, &scan, provenance) {
                items.push(item);
            }
        }
    }

    debug!(
        sheet = %sheet.name,
        sales = sales.len(),
        items = items.len(),
        "extracted sales sheet"
    );
    (sales, items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(name: &str, headers: &[&str], rows: &[&[&str]]) -> CleanSheet {
        CleanSheet {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_uppercase()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn prov() -> Provenance {
        Provenance::new("ledger.xlsx", "March")
    }

    #[test]
    fn test_serial_row_opens_sale_with_derived_amount() {
        let s = sheet(
            "March",
            &["SR NO", "INVOICE", "CUSTOMER NAME", "PRODUCT", "QTY", "RATE"],
            &[&["1", "INV001", "Ramesh", "5 LTR STEEL BARNI", "2", "680"]],
        );
        let (sales, items) = extract_sales(&s, &prov());

        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].invoice_no, "INV001");
        assert_eq!(sales[0].customer_name, "Ramesh");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].invoice_no, "INV001");
        assert_eq!(items[0].product_name, "5 LTR STEEL BARNI");
        assert_eq!(items[0].quantity, 2.0);
        assert_eq!(items[0].rate, 680.0);
        assert_eq!(items[0].amount, 1360.0);
    }

    #[test]
    fn test_missing_invoice_synthesized_and_distinct() {
        let s = sheet(
            "March",
            &["SR NO", "CUSTOMER NAME", "FINAL AMT"],
            &[&["1", "Ramesh", "500"], &["2", "Suresh", "700"]],
        );
        let (sales, _) = extract_sales(&s, &prov());

        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].invoice_no, "INV_ledger.xlsx_March_1");
        assert_eq!(sales[1].invoice_no, "INV_ledger.xlsx_March_2");
        assert_ne!(sales[0].invoice_no, sales[1].invoice_no);
        assert_eq!(sales[0].total_amount, 500.0);
    }

    #[test]
    fn test_continuation_rows_attach_items_to_open_sale() {
        let s = sheet(
            "March",
            &["SR NO", "INV NO", "PACKING", "QTY", "RATE"],
            &[
                &["1", "INV010", "5 LTR PLASTIC JAR", "3", "460"],
                &["", "", "1 LTR PET BOTTLE", "10", "85"],
            ],
        );
        let (sales, items) = extract_sales(&s, &prov());

        assert_eq!(sales.len(), 1);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].invoice_no, "INV010");
        assert_eq!(items[1].invoice_no, "INV010");
        assert_eq!(items[1].amount, 850.0);
    }

    #[test]
    fn test_location_persists_across_sales() {
        let s = sheet(
            "March",
            &["SR NO", "CUSTOMER NAME", "VILLAGE", "TALUKA"],
            &[
                &["1", "Ramesh", "Amiyad", "Anand"],
                &["2", "Suresh", "", ""],
            ],
        );
        let (sales, _) = extract_sales(&s, &prov());

        assert_eq!(sales[1].village, "Amiyad");
        assert_eq!(sales[1].taluka, "Anand");
    }

    #[test]
    fn test_quantity_derived_from_amount_and_rate() {
        let s = sheet(
            "March",
            &["SR NO", "PACKING", "AMT", "RATE"],
            &[&["1", "10 LTR STEEL BARNI", "2600", "1300"]],
        );
        let (_, items) = extract_sales(&s, &prov());

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2.0);
    }

    #[test]
    fn test_unmatched_packing_still_yields_item() {
        let s = sheet(
            "March",
            &["SR NO", "PACKING", "QTY", "RATE"],
            &[&["1", "Unknown Jumbo Pack", "4", "100"]],
        );
        let (_, items) = extract_sales(&s, &prov());

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_name, "Unknown Jumbo Pack");
        assert_eq!(items[0].amount, 400.0);
    }

    #[test]
    fn test_payment_breakdown_and_dates() {
        let s = sheet(
            "March",
            &[
                "SR NO",
                "CUSTOMER NAME",
                "DATE",
                "DISPATCH DATE",
                "PAYMENT DATE",
                "G-PAY",
                "CASH",
                "CHQ",
                "REF",
            ],
            &[&[
                "1",
                "Ramesh",
                "2025-03-01",
                "2025-03-03",
                "15/03/2025",
                "500",
                "200",
                "0",
                "UPI-99",
            ]],
        );
        let (sales, _) = extract_sales(&s, &prov());

        let sale = &sales[0];
        assert_eq!(sale.sale_date, chrono::NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(sale.dispatch_date, chrono::NaiveDate::from_ymd_opt(2025, 3, 3));
        assert_eq!(sale.payment_date, chrono::NaiveDate::from_ymd_opt(2025, 3, 15));
        assert_eq!(sale.gpay_amount, 500.0);
        assert_eq!(sale.cash_amount, 200.0);
        assert_eq!(sale.reference, "UPI-99");
    }
}
