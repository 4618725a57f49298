// ==========================================
// Rural Sales IMS - row extractors
// ==========================================
// One extractor per entity kind. Each consumes a classified sheet and
// produces candidate records plus provenance. Extraction is total:
// malformed rows are skipped, never raised.
// ==========================================

pub mod customers;
pub mod distributors;
pub mod sales;

pub use customers::extract_customers;
pub use distributors::extract_distributors;
pub use sales::{extract_sales, SalesScan};
