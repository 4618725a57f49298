// ==========================================
// Rural Sales IMS - data repository layer
// ==========================================
// Responsibility: data access interfaces over the relational store
// Constraint: no business logic here; all statements parameterized
// ==========================================

pub mod customer_repo;
pub mod demo_repo;
pub mod distributor_repo;
pub mod error;
pub mod product_repo;
pub mod sale_repo;

pub use customer_repo::CustomerRepository;
pub use demo_repo::{DemoRepository, DueFollowUp, NewDemo};
pub use distributor_repo::DistributorRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use product_repo::ProductRepository;
pub use sale_repo::{SaleItemRecord, SaleRecord, SaleRepository};
