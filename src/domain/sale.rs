// ==========================================
// Rural Sales IMS - sale entities
// ==========================================
// A sale groups the line items extracted from adjoining sheet rows.
// Candidate forms carry the free-text references (customer name, invoice,
// packing description) that identity resolution turns into foreign keys.
// ==========================================

use crate::domain::sheet::Provenance;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sale record extracted from a sheet, keyed by invoice, customer still a
/// free-text name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleCandidate {
    pub invoice_no: String,
    pub customer_name: String,
    pub village: String,
    pub taluka: String,
    pub district: String,
    pub sale_date: Option<NaiveDate>,
    pub dispatch_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    pub total_amount: f64,
    pub total_liters: f64,
    pub gpay_amount: f64,
    pub cash_amount: f64,
    pub cheque_amount: f64,
    pub rrn: String,
    pub reference: String,
    pub provenance: Provenance,
}

/// Line item extracted from a sheet, linked to its sale by invoice number
/// and to a product by free-text packing description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleItemCandidate {
    pub invoice_no: String,
    pub product_name: String,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
    pub provenance: Provenance,
}

/// Resolved sale. `customer_id` is None only in batch output when the
/// downstream consumer must treat the link as unresolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub sale_id: i64,
    pub invoice_no: String,
    pub customer_id: Option<i64>,
    pub sale_date: Option<NaiveDate>,
    pub dispatch_date: Option<NaiveDate>,
    pub payment_date: Option<NaiveDate>,
    pub total_amount: f64,
    pub total_liters: f64,
    pub gpay_amount: f64,
    pub cash_amount: f64,
    pub cheque_amount: f64,
    pub rrn: String,
    pub reference: String,
    pub provenance: Provenance,
}

/// Resolved line item. Blank FKs mean "unlinked", never fabricated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub item_id: i64,
    pub sale_id: Option<i64>,
    pub product_id: Option<i64>,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
    pub provenance: Provenance,
}

/// Line item input for the incremental `add_sale` path, product already
/// resolved (or deliberately left unset).
#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub product_id: Option<i64>,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
    /// quantity x catalog capacity, 0 when the product is unresolved
    pub liters: f64,
}

/// Payment input for the incremental `add_sale` path.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    pub payment_date: Option<NaiveDate>,
    pub method: String,
    pub amount: f64,
    pub rrn: String,
    pub reference: String,
}

/// Derived payment state of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Partial,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Partial => "Partial",
            PaymentStatus::Pending => "Pending",
        }
    }

    pub fn from_amounts(paid: f64, total: f64) -> Self {
        if paid >= total && total > 0.0 {
            PaymentStatus::Paid
        } else if paid > 0.0 {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_from_amounts() {
        assert_eq!(PaymentStatus::from_amounts(0.0, 500.0), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_amounts(200.0, 500.0), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::from_amounts(500.0, 500.0), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_amounts(0.0, 0.0), PaymentStatus::Pending);
    }
}
