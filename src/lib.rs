// ==========================================
// Rural Sales IMS - core library
// ==========================================
// Ingests heterogeneous spreadsheet exports (sales ledgers, customer
// rosters, distributor rosters), classifies each worksheet by content,
// extracts structured records, and reconciles them into a normalized
// relational store with foreign-key integrity.
// Stack: Rust + SQLite (rusqlite) + calamine/csv
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities and value types
pub mod domain;

// Repository layer - data access over the live store
pub mod repository;

// Importer layer - workbook parsing and sheet cleaning
pub mod importer;

// Engine layer - classification, extraction, resolution, linking
pub mod engine;

// API layer - analytics and reminders over the store
pub mod api;

// Configuration layer - runtime paths
pub mod config;

// Database infrastructure (connection init / unified PRAGMAs)
pub mod db;

// Logging setup
pub mod logging;

// ==========================================
// Core re-exports
// ==========================================

pub use config::AppConfig;
pub use domain::{
    BatchReport, BatchTables, CleanSheet, Customer, CustomerCandidate, Distributor,
    DistributorCandidate, IngestReport, Product, Provenance, RawSheet, SheetKind,
};
pub use engine::{BatchStandardizer, IngestPipeline, ProductCatalog, SheetIngestor};

/// crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// display name
pub const APP_NAME: &str = "Rural Sales IMS";
