// ==========================================
// Rural Sales IMS - domain layer
// ==========================================
// Responsibility: entities and value types
// Constraint: no data access, no engine logic
// ==========================================

pub mod customer;
pub mod distributor;
pub mod product;
pub mod report;
pub mod sale;
pub mod sheet;

pub use customer::{Customer, CustomerCandidate};
pub use distributor::{Distributor, DistributorCandidate};
pub use product::{Product, ProductSpec, PRODUCT_CATALOG};
pub use report::{BatchReport, BatchTables, IngestReport};
pub use sale::{
    NewSaleItem, PaymentInput, PaymentStatus, Sale, SaleCandidate, SaleItem, SaleItemCandidate,
};
pub use sheet::{CleanSheet, Provenance, RawSheet, SheetKind};
