// ==========================================
// Rural Sales IMS - batch standardization
// ==========================================
// Standalone file-set entry point: every workbook in a directory is
// classified and extracted first, then foreign keys are resolved
// globally over the in-memory tables. Output is a set of timestamped
// CSV exports plus a standardized SQLite store, separate from the live
// one used by incremental ingestion.
// ==========================================

use crate::domain::product::{Product, PRODUCT_CATALOG};
use crate::domain::report::{BatchReport, BatchTables};
use crate::domain::sheet::{Provenance, SheetKind};
use crate::engine::classifier::{classify_sheet, ClassifyMode};
use crate::engine::extract::{extract_customers, extract_distributors, extract_sales};
use crate::engine::relationship::{link_tables, BatchCandidates};
use crate::importer::{clean_sheet, WorkbookParser};
use crate::repository::RepositoryError;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const STANDARDIZED_DB_NAME: &str = "sales_management.db";

const SPREADSHEET_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "csv"];

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("data directory unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("export write failed: {0}")]
    Export(#[from] csv::Error),

    #[error("store error: {0}")]
    Store(#[from] RepositoryError),
}

/// Directory-level standardizer. Holds only paths; every run re-reads
/// the file set from scratch.
pub struct BatchStandardizer {
    data_dir: PathBuf,
    output_dir: PathBuf,
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn fmt_id(id: Option<i64>) -> String {
    id.map(|v| v.to_string()).unwrap_or_default()
}

impl BatchStandardizer {
    pub fn new<P: Into<PathBuf>>(data_dir: P, output_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Process every spreadsheet in the data directory and resolve
    /// relationships globally. Side effects: timestamped CSV exports and
    /// a standardized SQLite store in the output directory.
    #[instrument(skip(self), fields(dir = %self.data_dir.display()))]
    pub async fn process_all_files(&self) -> Result<(BatchTables, BatchReport), BatchError> {
        std::fs::create_dir_all(&self.output_dir)?;

        let mut report = BatchReport::new();
        let mut candidates = BatchCandidates::default();

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.data_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| SPREADSHEET_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        report.files_total = files.len();

        for path in &files {
            match self.collect_file(path, &mut candidates, &mut report) {
                Ok(()) => report.files_processed += 1,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "file skipped");
                    report.files_failed += 1;
                }
            }
        }

        let products: Vec<Product> = PRODUCT_CATALOG
            .iter()
            .enumerate()
            .map(|(i, spec)| Product::from((i as i64 + 1, spec)))
            .collect();

        let linked = link_tables(candidates, &products);
        let tables = BatchTables {
            customers: linked.customers,
            products,
            sales: linked.sales,
            sale_items: linked.sale_items,
            distributors: linked.distributors,
        };

        report.customers = tables.customers.len();
        report.products = tables.products.len();
        report.sales = tables.sales.len();
        report.sale_items = tables.sale_items.len();
        report.distributors = tables.distributors.len();

        self.export_csv(&tables)?;
        self.write_standardized_db(&tables)?;

        info!(
            run_id = %report.run_id,
            files = report.files_processed,
            failed = report.files_failed,
            customers = report.customers,
            sales = report.sales,
            "batch standardization finished"
        );
        Ok((tables, report))
    }

    /// Extract all sheets of one workbook into the candidate tables.
    /// Sheet-level failures stay inside the file; only an unreadable
    /// workbook bubbles up.
    fn collect_file(
        &self,
        path: &Path,
        candidates: &mut BatchCandidates,
        report: &mut BatchReport,
    ) -> Result<(), crate::importer::ImportError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        for raw in WorkbookParser::parse(path)? {
            let sheet = clean_sheet(&raw);
            let provenance = Provenance::new(&file_name, &sheet.name);
            match classify_sheet(&sheet, ClassifyMode::FileBatch) {
                SheetKind::Sales => {
                    let (sales, items) = extract_sales(&sheet, &provenance);
                    candidates.sales.extend(sales);
                    candidates.sale_items.extend(items);
                }
                SheetKind::Customers => {
                    candidates
                        .customers
                        .extend(extract_customers(&sheet, &provenance));
                }
                SheetKind::Distributors => {
                    candidates
                        .distributors
                        .extend(extract_distributors(&sheet, &provenance));
                }
                SheetKind::Unknown => {
                    warn!(file = %file_name, sheet = %sheet.name, "unidentified sheet");
                    report.sheets_unknown += 1;
                }
                SheetKind::Empty => {}
            }
        }
        Ok(())
    }

    /// One timestamped CSV per non-empty entity table.
    fn export_csv(&self, tables: &BatchTables) -> Result<(), BatchError> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");

        if !tables.customers.is_empty() {
            let mut w = csv::Writer::from_path(self.output_dir.join(format!("customers_{stamp}.csv")))?;
            w.write_record([
                "customer_id", "customer_code", "name", "mobile", "village", "taluka",
                "district", "source_file", "source_sheet",
            ])?;
            for c in &tables.customers {
                w.write_record([
                    c.customer_id.to_string(),
                    c.customer_code.clone(),
                    c.name.clone(),
                    c.mobile.clone(),
                    c.village.clone(),
                    c.taluka.clone(),
                    c.district.clone(),
                    c.provenance.source_file.clone(),
                    c.provenance.source_sheet.clone(),
                ])?;
            }
            w.flush().map_err(BatchError::Io)?;
        }

        if !tables.products.is_empty() {
            let mut w = csv::Writer::from_path(self.output_dir.join(format!("products_{stamp}.csv")))?;
            w.write_record([
                "product_id", "product_name", "packing_type", "capacity_ltr", "category",
                "standard_rate",
            ])?;
            for p in &tables.products {
                w.write_record([
                    p.product_id.to_string(),
                    p.product_name.clone(),
                    p.packing_type.clone(),
                    p.capacity_ltr.to_string(),
                    p.category.clone(),
                    p.standard_rate.to_string(),
                ])?;
            }
            w.flush().map_err(BatchError::Io)?;
        }

        if !tables.sales.is_empty() {
            let mut w = csv::Writer::from_path(self.output_dir.join(format!("sales_{stamp}.csv")))?;
            w.write_record([
                "sale_id", "invoice_no", "customer_id", "sale_date", "dispatch_date",
                "total_amount", "total_liters", "payment_date", "gpay_amount", "cash_amount",
                "cheque_amount", "rrn", "reference", "source_file", "source_sheet",
            ])?;
            for s in &tables.sales {
                w.write_record([
                    s.sale_id.to_string(),
                    s.invoice_no.clone(),
                    fmt_id(s.customer_id),
                    fmt_date(s.sale_date),
                    fmt_date(s.dispatch_date),
                    s.total_amount.to_string(),
                    s.total_liters.to_string(),
                    fmt_date(s.payment_date),
                    s.gpay_amount.to_string(),
                    s.cash_amount.to_string(),
                    s.cheque_amount.to_string(),
                    s.rrn.clone(),
                    s.reference.clone(),
                    s.provenance.source_file.clone(),
                    s.provenance.source_sheet.clone(),
                ])?;
            }
            w.flush().map_err(BatchError::Io)?;
        }

        if !tables.sale_items.is_empty() {
            let mut w =
                csv::Writer::from_path(self.output_dir.join(format!("sale_items_{stamp}.csv")))?;
            w.write_record([
                "item_id", "sale_id", "product_id", "quantity", "rate", "amount",
                "source_file", "source_sheet",
            ])?;
            for i in &tables.sale_items {
                w.write_record([
                    i.item_id.to_string(),
                    fmt_id(i.sale_id),
                    fmt_id(i.product_id),
                    i.quantity.to_string(),
                    i.rate.to_string(),
                    i.amount.to_string(),
                    i.provenance.source_file.clone(),
                    i.provenance.source_sheet.clone(),
                ])?;
            }
            w.flush().map_err(BatchError::Io)?;
        }

        if !tables.distributors.is_empty() {
            let mut w =
                csv::Writer::from_path(self.output_dir.join(format!("distributors_{stamp}.csv")))?;
            w.write_record([
                "distributor_id", "name", "village", "taluka", "district", "mantri_name",
                "mantri_mobile", "sabhasad_count", "contact_in_group", "total_liters",
                "source_file", "source_sheet",
            ])?;
            for d in &tables.distributors {
                w.write_record([
                    d.distributor_id.to_string(),
                    d.name.clone(),
                    d.village.clone(),
                    d.taluka.clone(),
                    d.district.clone(),
                    d.mantri_name.clone(),
                    d.mantri_mobile.clone(),
                    d.sabhasad_count.to_string(),
                    d.contact_in_group.to_string(),
                    d.total_liters.to_string(),
                    d.provenance.source_file.clone(),
                    d.provenance.source_sheet.clone(),
                ])?;
            }
            w.flush().map_err(BatchError::Io)?;
        }

        Ok(())
    }

    /// Replace the standardized SQLite store with the linked tables.
    fn write_standardized_db(&self, tables: &BatchTables) -> Result<(), BatchError> {
        let db_path = self.output_dir.join(STANDARDIZED_DB_NAME);
        let mut conn = crate::db::open_sqlite_connection(db_path.to_string_lossy().as_ref())
            .map_err(RepositoryError::from)?;

        conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS sale_items;
            DROP TABLE IF EXISTS sales;
            DROP TABLE IF EXISTS distributors;
            DROP TABLE IF EXISTS customers;
            DROP TABLE IF EXISTS products;

            CREATE TABLE customers (
                customer_id INTEGER PRIMARY KEY,
                customer_code TEXT,
                name TEXT NOT NULL,
                mobile TEXT,
                village TEXT,
                taluka TEXT,
                district TEXT,
                source_file TEXT,
                source_sheet TEXT
            );
            CREATE TABLE products (
                product_id INTEGER PRIMARY KEY,
                product_name TEXT NOT NULL,
                packing_type TEXT,
                capacity_ltr REAL,
                category TEXT,
                standard_rate REAL
            );
            CREATE TABLE sales (
                sale_id INTEGER PRIMARY KEY,
                invoice_no TEXT UNIQUE,
                customer_id INTEGER,
                sale_date TEXT,
                dispatch_date TEXT,
                total_amount REAL,
                total_liters REAL,
                payment_date TEXT,
                gpay_amount REAL,
                cash_amount REAL,
                cheque_amount REAL,
                rrn TEXT,
                reference TEXT,
                source_file TEXT,
                source_sheet TEXT,
                FOREIGN KEY (customer_id) REFERENCES customers (customer_id)
            );
            CREATE TABLE sale_items (
                item_id INTEGER PRIMARY KEY,
                sale_id INTEGER,
                product_id INTEGER,
                quantity REAL,
                rate REAL,
                amount REAL,
                source_file TEXT,
                source_sheet TEXT,
                FOREIGN KEY (sale_id) REFERENCES sales (sale_id),
                FOREIGN KEY (product_id) REFERENCES products (product_id)
            );
            CREATE TABLE distributors (
                distributor_id INTEGER PRIMARY KEY,
                name TEXT,
                village TEXT,
                taluka TEXT,
                district TEXT,
                mantri_name TEXT,
                mantri_mobile TEXT,
                sabhasad_count INTEGER,
                contact_in_group INTEGER,
                total_liters REAL,
                source_file TEXT,
                source_sheet TEXT
            );
            "#,
        )
        .map_err(RepositoryError::from)?;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO customers VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )
                .map_err(RepositoryError::from)?;
            for c in &tables.customers {
                stmt.execute(rusqlite::params![
                    c.customer_id,
                    c.customer_code,
                    c.name,
                    c.mobile,
                    c.village,
                    c.taluka,
                    c.district,
                    c.provenance.source_file,
                    c.provenance.source_sheet,
                ])
                .map_err(RepositoryError::from)?;
            }

            let mut stmt = tx
                .prepare("INSERT INTO products VALUES (?1, ?2, ?3, ?4, ?5, ?6)")
                .map_err(RepositoryError::from)?;
            for p in &tables.products {
                stmt.execute(rusqlite::params![
                    p.product_id,
                    p.product_name,
                    p.packing_type,
                    p.capacity_ltr,
                    p.category,
                    p.standard_rate,
                ])
                .map_err(RepositoryError::from)?;
            }

            let mut stmt = tx
                .prepare(
                    "INSERT INTO sales VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                )
                .map_err(RepositoryError::from)?;
            for s in &tables.sales {
                stmt.execute(rusqlite::params![
                    s.sale_id,
                    s.invoice_no,
                    s.customer_id,
                    s.sale_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    s.dispatch_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    s.total_amount,
                    s.total_liters,
                    s.payment_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    s.gpay_amount,
                    s.cash_amount,
                    s.cheque_amount,
                    s.rrn,
                    s.reference,
                    s.provenance.source_file,
                    s.provenance.source_sheet,
                ])
                .map_err(RepositoryError::from)?;
            }

            let mut stmt = tx
                .prepare("INSERT INTO sale_items VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)")
                .map_err(RepositoryError::from)?;
            for i in &tables.sale_items {
                stmt.execute(rusqlite::params![
                    i.item_id,
                    i.sale_id,
                    i.product_id,
                    i.quantity,
                    i.rate,
                    i.amount,
                    i.provenance.source_file,
                    i.provenance.source_sheet,
                ])
                .map_err(RepositoryError::from)?;
            }

            let mut stmt = tx
                .prepare(
                    "INSERT INTO distributors VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                )
                .map_err(RepositoryError::from)?;
            for d in &tables.distributors {
                stmt.execute(rusqlite::params![
                    d.distributor_id,
                    d.name,
                    d.village,
                    d.taluka,
                    d.district,
                    d.mantri_name,
                    d.mantri_mobile,
                    d.sabhasad_count,
                    d.contact_in_group,
                    d.total_liters,
                    d.provenance.source_file,
                    d.provenance.source_sheet,
                ])
                .map_err(RepositoryError::from)?;
            }
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(db = %db_path.display(), "standardized store written");
        Ok(())
    }
}
