// ==========================================
// Rural Sales IMS - ingestion reports
// ==========================================
// Partial completion is the expected steady state: callers get counters,
// never an all-or-nothing flag.
// ==========================================

use crate::domain::customer::Customer;
use crate::domain::distributor::Distributor;
use crate::domain::product::Product;
use crate::domain::sale::{Sale, SaleItem};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of `process_file` on one workbook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Opaque id correlating this run's log lines.
    pub run_id: String,
    pub file: String,
    pub sheets_total: usize,
    pub sheets_processed: usize,
    pub sheets_skipped: usize,
    pub sales_created: usize,
    pub sales_skipped_existing: usize,
    pub customers_upserted: usize,
    pub distributors_created: usize,
    pub rows_skipped: usize,
}

impl IngestReport {
    pub fn new(file: &str) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            file: file.to_string(),
            ..Default::default()
        }
    }

    /// The `process_file(path) -> bool` contract: at least one row landed.
    pub fn processed_any(&self) -> bool {
        self.sales_created > 0 || self.customers_upserted > 0 || self.distributors_created > 0
    }
}

/// Outcome of batch standardization over a directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: String,
    pub files_total: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub sheets_unknown: usize,
    pub customers: usize,
    pub products: usize,
    pub sales: usize,
    pub sale_items: usize,
    pub distributors: usize,
}

impl BatchReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            ..Default::default()
        }
    }
}

/// The flat entity tables assembled by batch mode, foreign keys resolved
/// globally. Blank FKs are "unlinked", downstream consumers must tolerate
/// them.
#[derive(Debug, Clone, Default)]
pub struct BatchTables {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub sales: Vec<Sale>,
    pub sale_items: Vec<SaleItem>,
    pub distributors: Vec<Distributor>,
}
