// ==========================================
// Rural Sales IMS - relationship builder
// ==========================================
// Batch-mode linking: after all sheets across all files are extracted
// into flat candidate tables, foreign keys are resolved globally and
// in memory. Unmatched customer names get a synthesized customer row;
// unmatched invoices and products leave the FK unset rather than
// dropping the item.
// ==========================================

use crate::domain::customer::{Customer, CustomerCandidate};
use crate::domain::distributor::{Distributor, DistributorCandidate};
use crate::domain::product::Product;
use crate::domain::sale::{Sale, SaleCandidate, SaleItem, SaleItemCandidate};
use crate::engine::resolver::ProductCatalog;
use std::collections::HashMap;
use tracing::info;

/// Flat candidate tables accumulated over a whole file set.
#[derive(Debug, Default)]
pub struct BatchCandidates {
    pub customers: Vec<CustomerCandidate>,
    pub sales: Vec<SaleCandidate>,
    pub sale_items: Vec<SaleItemCandidate>,
    pub distributors: Vec<DistributorCandidate>,
}

/// The linked output tables. Blank FKs mean "unlinked".
#[derive(Debug, Default)]
pub struct LinkedTables {
    pub customers: Vec<Customer>,
    pub sales: Vec<Sale>,
    pub sale_items: Vec<SaleItem>,
    pub distributors: Vec<Distributor>,
    pub customers_synthesized: usize,
}

/// Resolves foreign keys across the candidate tables against the fixed
/// product catalog. Surrogate ids are sequential per table, synthesized
/// customers appended after the extracted ones.
pub fn link_tables(candidates: BatchCandidates, products: &[Product]) -> LinkedTables {
    let catalog = ProductCatalog::new(products.to_vec());

    let mut customers: Vec<Customer> = candidates
        .customers
        .into_iter()
        .enumerate()
        .map(|(i, c)| Customer {
            customer_id: i as i64 + 1,
            customer_code: c.customer_code,
            name: c.name,
            mobile: c.mobile,
            village: c.village,
            taluka: c.taluka,
            district: c.district,
            provenance: c.provenance,
        })
        .collect();

    let mut name_to_id: HashMap<String, i64> = HashMap::new();
    for c in &customers {
        name_to_id.entry(c.name.clone()).or_insert(c.customer_id);
    }

    let mut synthesized = 0usize;
    let mut sales: Vec<Sale> = Vec::with_capacity(candidates.sales.len());
    let mut invoice_to_sale_id: HashMap<String, i64> = HashMap::new();

    for (i, s) in candidates.sales.into_iter().enumerate() {
        let sale_id = i as i64 + 1;
        let customer_id = match name_to_id.get(&s.customer_name) {
            Some(id) => *id,
            None => {
                // Unseen customer name on a sale row: append a new
                // customer carrying the sale's location and provenance.
                let new_id = customers.len() as i64 + 1;
                customers.push(Customer {
                    customer_id: new_id,
                    customer_code: format!("CUST{:04}", new_id),
                    name: s.customer_name.clone(),
                    mobile: String::new(),
                    village: s.village.clone(),
                    taluka: s.taluka.clone(),
                    district: s.district.clone(),
                    provenance: s.provenance.clone(),
                });
                name_to_id.insert(s.customer_name.clone(), new_id);
                synthesized += 1;
                new_id
            }
        };
        invoice_to_sale_id.entry(s.invoice_no.clone()).or_insert(sale_id);
        sales.push(Sale {
            sale_id,
            invoice_no: s.invoice_no,
            customer_id: Some(customer_id),
            sale_date: s.sale_date,
            dispatch_date: s.dispatch_date,
            payment_date: s.payment_date,
            total_amount: s.total_amount,
            total_liters: s.total_liters,
            gpay_amount: s.gpay_amount,
            cash_amount: s.cash_amount,
            cheque_amount: s.cheque_amount,
            rrn: s.rrn,
            reference: s.reference,
            provenance: s.provenance,
        });
    }

    let sale_items: Vec<SaleItem> = candidates
        .sale_items
        .into_iter()
        .enumerate()
        .map(|(i, item)| SaleItem {
            item_id: i as i64 + 1,
            sale_id: invoice_to_sale_id.get(&item.invoice_no).copied(),
            product_id: catalog.resolve(&item.product_name).map(|hit| hit.product_id),
            quantity: item.quantity,
            rate: item.rate,
            amount: item.amount,
            provenance: item.provenance,
        })
        .collect();

    let distributors: Vec<Distributor> = candidates
        .distributors
        .into_iter()
        .enumerate()
        .map(|(i, d)| Distributor::from_candidate(i as i64 + 1, d))
        .collect();

    info!(
        customers = customers.len(),
        synthesized,
        sales = sales.len(),
        sale_items = sale_items.len(),
        distributors = distributors.len(),
        "linked batch tables"
    );

    LinkedTables {
        customers,
        sales,
        sale_items,
        distributors,
        customers_synthesized: synthesized,
    }
}
