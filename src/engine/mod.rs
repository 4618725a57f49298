// ==========================================
// Rural Sales IMS - ingestion engine
// ==========================================
// Classification, extraction, identity resolution and relationship
// building. Two entry points share the same stages: the incremental
// per-file pipeline and the directory-level batch standardizer.
// ==========================================

pub mod batch;
pub mod classifier;
pub mod extract;
pub mod field;
pub mod ingest;
pub mod relationship;
pub mod resolver;

pub use batch::{BatchError, BatchStandardizer};
pub use classifier::{classify_sheet, ClassifyMode};
pub use ingest::{IngestError, IngestPipeline, SheetIngestor};
pub use relationship::{link_tables, BatchCandidates, LinkedTables};
pub use resolver::{CatalogHit, ProductCatalog};
