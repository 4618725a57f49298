// ==========================================
// Rural Sales IMS - incremental ingestion pipeline
// ==========================================
// Per-file entry point used by the interactive front-end and the upload
// handlers. Each sheet is classified, extracted and resolved against
// the live store; the invoice number gates re-ingestion of a sale.
// Flow: parse -> clean -> classify -> extract -> resolve -> persist
// ==========================================

use crate::domain::customer::CustomerCandidate;
use crate::domain::report::IngestReport;
use crate::domain::sale::{NewSaleItem, PaymentInput, SaleCandidate, SaleItemCandidate};
use crate::domain::sheet::{Provenance, SheetKind};
use crate::engine::classifier::{classify_sheet, ClassifyMode};
use crate::engine::extract::{extract_customers, extract_distributors, extract_sales};
use crate::engine::resolver::ProductCatalog;
use crate::importer::{clean_sheet, ImportError, WorkbookParser};
use crate::repository::{
    CustomerRepository, DistributorRepository, ProductRepository, RepositoryError, SaleRepository,
};
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Ingestion errors. Row- and sheet-level problems never surface here;
/// they are logged and counted in the report.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("import failed: {0}")]
    Import(#[from] ImportError),

    #[error("store error: {0}")]
    Store(#[from] RepositoryError),
}

/// Main ingestion interface consumed by the API layer and the CLI.
#[async_trait]
pub trait SheetIngestor: Send + Sync {
    /// Ingest one workbook into the live store.
    async fn process_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<IngestReport, IngestError>;
}

/// Pipeline over one shared SQLite connection.
pub struct IngestPipeline {
    customers: CustomerRepository,
    sales: SaleRepository,
    distributors: DistributorRepository,
    catalog: ProductCatalog,
}

impl IngestPipeline {
    /// Open the store, ensure the schema and seed the product catalog.
    pub fn open(db_path: &str) -> Result<Self, IngestError> {
        let conn = crate::db::open_sqlite_connection(db_path).map_err(RepositoryError::from)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, IngestError> {
        // Referenced tables first, sales carries the FKs.
        let customers = CustomerRepository::from_connection(conn.clone())?;
        let products = ProductRepository::from_connection(conn.clone())?;
        let sales = SaleRepository::from_connection(conn.clone())?;
        let distributors = DistributorRepository::from_connection(conn)?;

        products.seed_catalog()?;
        let catalog = ProductCatalog::new(products.load_catalog()?);

        Ok(Self {
            customers,
            sales,
            distributors,
            catalog,
        })
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    /// True for errors scoped to one row; everything else is a store
    /// fault that must abort the invocation.
    fn is_row_error(err: &RepositoryError) -> bool {
        matches!(
            err,
            RepositoryError::NotFound { .. }
                | RepositoryError::UniqueConstraintViolation(_)
                | RepositoryError::ForeignKeyViolation(_)
                | RepositoryError::FieldValueError { .. }
        )
    }

    /// Line items of one sale, products resolved against the catalog.
    fn resolve_items(&self, sale: &SaleCandidate, items: &[SaleItemCandidate]) -> Vec<NewSaleItem> {
        items
            .iter()
            .filter(|item| item.invoice_no == sale.invoice_no)
            .map(|item| {
                let hit = self.catalog.resolve(&item.product_name);
                NewSaleItem {
                    product_id: hit.map(|h| h.product_id),
                    quantity: item.quantity,
                    rate: item.rate,
                    amount: item.amount,
                    liters: hit.map(|h| h.capacity_ltr * item.quantity).unwrap_or(0.0),
                }
            })
            .collect()
    }

    /// Payment rows from the sale's recorded method breakdown.
    fn build_payments(sale: &SaleCandidate) -> Vec<PaymentInput> {
        let methods = [
            ("G-Pay", sale.gpay_amount),
            ("Cash", sale.cash_amount),
            ("Cheque", sale.cheque_amount),
        ];
        methods
            .into_iter()
            .filter(|(_, amount)| *amount > 0.0)
            .map(|(method, amount)| PaymentInput {
                payment_date: sale.payment_date,
                method: method.to_string(),
                amount,
                rrn: sale.rrn.clone(),
                reference: sale.reference.clone(),
            })
            .collect()
    }

    fn ingest_sales_sheet(
        &self,
        sales: &[SaleCandidate],
        items: &[SaleItemCandidate],
        report: &mut IngestReport,
    ) -> Result<(), RepositoryError> {
        for sale in sales {
            if self.sales.exists_invoice(&sale.invoice_no)? {
                report.sales_skipped_existing += 1;
                continue;
            }

            let customer = CustomerCandidate {
                name: sale.customer_name.clone(),
                village: sale.village.clone(),
                taluka: sale.taluka.clone(),
                district: sale.district.clone(),
                provenance: sale.provenance.clone(),
                ..CustomerCandidate::default()
            };
            let customer_id = match self.customers.get_or_create(&customer) {
                Ok(id) => id,
                Err(e) if Self::is_row_error(&e) => {
                    warn!(invoice = %sale.invoice_no, error = %e, "sale skipped");
                    report.rows_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            report.customers_upserted += 1;

            let new_items = self.resolve_items(sale, items);
            let payments = Self::build_payments(sale);
            match self.sales.add_sale(sale, customer_id, &new_items, &payments) {
                Ok(_) => report.sales_created += 1,
                Err(e) if Self::is_row_error(&e) => {
                    warn!(invoice = %sale.invoice_no, error = %e, "sale skipped");
                    report.rows_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn ingest_sheet(
        &self,
        kind: SheetKind,
        sheet: &crate::domain::sheet::CleanSheet,
        provenance: &Provenance,
        report: &mut IngestReport,
    ) -> Result<bool, RepositoryError> {
        match kind {
            SheetKind::Sales => {
                let (sales, items) = extract_sales(sheet, provenance);
                self.ingest_sales_sheet(&sales, &items, report)?;
                Ok(true)
            }
            SheetKind::Customers => {
                for candidate in extract_customers(sheet, provenance) {
                    match self.customers.get_or_create(&candidate) {
                        Ok(_) => report.customers_upserted += 1,
                        Err(e) if Self::is_row_error(&e) => {
                            warn!(name = %candidate.name, error = %e, "customer skipped");
                            report.rows_skipped += 1;
                        }
                        Err(e) => return Err(e),
                    }
                }
                Ok(true)
            }
            SheetKind::Distributors => {
                for candidate in extract_distributors(sheet, provenance) {
                    match self.distributors.insert(&candidate) {
                        Ok(_) => report.distributors_created += 1,
                        Err(e) if Self::is_row_error(&e) => {
                            warn!(name = %candidate.name, error = %e, "distributor skipped");
                            report.rows_skipped += 1;
                        }
                        Err(e) => return Err(e),
                    }
                }
                Ok(true)
            }
            SheetKind::Unknown => {
                warn!(sheet = %sheet.name, "unknown sheet format, skipped");
                Ok(false)
            }
            SheetKind::Empty => Ok(false),
        }
    }
}

#[async_trait]
impl SheetIngestor for IngestPipeline {
    #[instrument(skip_all, fields(file = %file_path.as_ref().display()))]
    async fn process_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<IngestReport, IngestError> {
        let path = file_path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut report = IngestReport::new(&file_name);

        let raw_sheets = WorkbookParser::parse(path)?;
        report.sheets_total = raw_sheets.len();

        for raw in &raw_sheets {
            let sheet = clean_sheet(raw);
            let kind = classify_sheet(&sheet, ClassifyMode::Interactive);
            let provenance = Provenance::new(&file_name, &sheet.name);
            match self.ingest_sheet(kind, &sheet, &provenance, &mut report) {
                Ok(true) => report.sheets_processed += 1,
                Ok(false) => report.sheets_skipped += 1,
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            file = %file_name,
            sheets = report.sheets_processed,
            sales = report.sales_created,
            customers = report.customers_upserted,
            distributors = report.distributors_created,
            "file ingested"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sheet::CleanSheet;

    fn sheet(headers: &[&str], rows: &[&[&str]]) -> CleanSheet {
        CleanSheet {
            name: "Sheet1".to_string(),
            headers: headers.iter().map(|h| h.to_uppercase()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn pipeline() -> IngestPipeline {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        IngestPipeline::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_sales_sheet_persists_sale_items_and_customer() {
        let p = pipeline();
        let s = sheet(
            &["SR NO", "INVOICE", "CUSTOMER NAME", "PRODUCT", "QTY", "RATE"],
            &[&["1", "INV001", "Ramesh", "5 LTR STEEL BARNI", "2", "680"]],
        );
        let prov = Provenance::new("ledger.xlsx", "Sheet1");
        let mut report = IngestReport::new("ledger.xlsx");

        let processed = p
            .ingest_sheet(SheetKind::Sales, &s, &prov, &mut report)
            .unwrap();
        assert!(processed);
        assert_eq!(report.sales_created, 1);
        assert_eq!(report.customers_upserted, 1);

        let record = p.sales.get_by_invoice("INV001").unwrap().unwrap();
        assert_eq!(record.total_amount, 1360.0);
        assert_eq!(record.total_liters, 10.0);
        let items = p.sales.items_for_sale(record.sale_id).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2.0);
    }

    #[test]
    fn test_reingest_skips_existing_invoice_and_keeps_customer_id() {
        let p = pipeline();
        let s = sheet(
            &["SR NO", "INVOICE", "CUSTOMER NAME", "PRODUCT", "QTY", "RATE"],
            &[&["1", "INV001", "Ramesh", "5 LTR STEEL BARNI", "2", "680"]],
        );
        let prov = Provenance::new("ledger.xlsx", "Sheet1");

        let mut first = IngestReport::new("ledger.xlsx");
        p.ingest_sheet(SheetKind::Sales, &s, &prov, &mut first).unwrap();
        let id_before = p.customers.find_by_name_mobile("Ramesh", "").unwrap();

        let mut second = IngestReport::new("ledger.xlsx");
        p.ingest_sheet(SheetKind::Sales, &s, &prov, &mut second).unwrap();

        assert_eq!(second.sales_created, 0);
        assert_eq!(second.sales_skipped_existing, 1);
        assert_eq!(p.customers.count().unwrap(), 1);
        assert_eq!(p.customers.find_by_name_mobile("Ramesh", "").unwrap(), id_before);
    }

    #[test]
    fn test_unmatched_product_persists_with_null_product_id() {
        let p = pipeline();
        let s = sheet(
            &["SR NO", "INVOICE", "CUSTOMER NAME", "PRODUCT", "QTY", "RATE"],
            &[&["1", "INV002", "Ramesh", "Unknown Jumbo Pack", "4", "100"]],
        );
        let prov = Provenance::new("ledger.xlsx", "Sheet1");
        let mut report = IngestReport::new("ledger.xlsx");
        p.ingest_sheet(SheetKind::Sales, &s, &prov, &mut report).unwrap();

        let record = p.sales.get_by_invoice("INV002").unwrap().unwrap();
        let items = p.sales.items_for_sale(record.sale_id).unwrap();
        assert_eq!(items[0].product_id, None);
    }

    #[test]
    fn test_customer_store_row_error_skips_sale_and_continues() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let p = IngestPipeline::from_connection(conn.clone()).unwrap();
        // Simulated per-row store rejection during customer resolution.
        conn.lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER customers_reject_flagged BEFORE INSERT ON customers \
                 WHEN NEW.name = 'Flagged' \
                 BEGIN SELECT RAISE(ABORT, 'UNIQUE constraint failed: customers.name'); END;",
            )
            .unwrap();

        let s = sheet(
            &["SR NO", "INVOICE", "CUSTOMER NAME", "PRODUCT", "QTY", "RATE"],
            &[
                &["1", "INV001", "Flagged", "5 LTR STEEL BARNI", "2", "680"],
                &["2", "INV002", "Ramesh", "5 LTR STEEL BARNI", "1", "680"],
            ],
        );
        let prov = Provenance::new("ledger.xlsx", "Sheet1");
        let mut report = IngestReport::new("ledger.xlsx");

        let processed = p
            .ingest_sheet(SheetKind::Sales, &s, &prov, &mut report)
            .unwrap();
        assert!(processed);
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.sales_created, 1);
        assert_eq!(report.customers_upserted, 1);
        assert!(p.sales.get_by_invoice("INV001").unwrap().is_none());
        assert!(p.sales.get_by_invoice("INV002").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_process_file_counts_unknown_sheets() {
        let p = pipeline();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mystery.csv");
        std::fs::write(&path, "alpha,beta\n1,2\n").unwrap();

        let report = p.process_file(&path).await.unwrap();
        assert_eq!(report.sheets_total, 1);
        assert_eq!(report.sheets_processed, 0);
        assert_eq!(report.sheets_skipped, 1);
        assert!(!report.processed_any());
    }
}
