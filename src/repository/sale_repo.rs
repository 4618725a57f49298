// ==========================================
// Rural Sales IMS - sale repository
// ==========================================
// Responsibility: sales / sale_items / payments tables
// Constraint: a sale and its items land in one transaction; an item row
// is never written without its parent sale
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::sale::{NewSaleItem, PaymentInput, PaymentStatus, SaleCandidate};
use crate::domain::sheet::Provenance;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// Stored sale row as read back for verification and reporting.
#[derive(Debug, Clone)]
pub struct SaleRecord {
    pub sale_id: i64,
    pub invoice_no: String,
    pub customer_id: Option<i64>,
    pub total_amount: f64,
    pub total_liters: f64,
    pub payment_status: String,
    pub provenance: Provenance,
}

/// Stored line item row.
#[derive(Debug, Clone)]
pub struct SaleItemRecord {
    pub item_id: i64,
    pub sale_id: i64,
    pub product_id: Option<i64>,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
}

pub struct SaleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SaleRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_tables()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_tables()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_tables(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sales (
              sale_id INTEGER PRIMARY KEY AUTOINCREMENT,
              invoice_no TEXT NOT NULL UNIQUE,
              customer_id INTEGER,
              sale_date TEXT,
              dispatch_date TEXT,
              total_amount REAL NOT NULL DEFAULT 0,
              total_liters REAL NOT NULL DEFAULT 0,
              payment_date TEXT,
              gpay_amount REAL NOT NULL DEFAULT 0,
              cash_amount REAL NOT NULL DEFAULT 0,
              cheque_amount REAL NOT NULL DEFAULT 0,
              rrn TEXT NOT NULL DEFAULT '',
              reference TEXT NOT NULL DEFAULT '',
              payment_status TEXT NOT NULL DEFAULT 'Pending',
              source_file TEXT NOT NULL DEFAULT '',
              source_sheet TEXT NOT NULL DEFAULT '',
              created_at TEXT NOT NULL DEFAULT (datetime('now')),
              FOREIGN KEY (customer_id) REFERENCES customers (customer_id) ON DELETE SET NULL
            );

            CREATE TABLE IF NOT EXISTS sale_items (
              item_id INTEGER PRIMARY KEY AUTOINCREMENT,
              sale_id INTEGER NOT NULL,
              product_id INTEGER,
              quantity REAL NOT NULL DEFAULT 0,
              rate REAL NOT NULL DEFAULT 0,
              amount REAL NOT NULL DEFAULT 0,
              source_file TEXT NOT NULL DEFAULT '',
              source_sheet TEXT NOT NULL DEFAULT '',
              FOREIGN KEY (sale_id) REFERENCES sales (sale_id) ON DELETE CASCADE,
              FOREIGN KEY (product_id) REFERENCES products (product_id) ON DELETE SET NULL
            );

            CREATE TABLE IF NOT EXISTS payments (
              payment_id INTEGER PRIMARY KEY AUTOINCREMENT,
              sale_id INTEGER NOT NULL,
              payment_date TEXT,
              payment_method TEXT NOT NULL DEFAULT '',
              amount REAL NOT NULL DEFAULT 0,
              rrn TEXT NOT NULL DEFAULT '',
              reference TEXT NOT NULL DEFAULT '',
              FOREIGN KEY (sale_id) REFERENCES sales (sale_id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_sales_customer_id ON sales(customer_id);
            CREATE INDEX IF NOT EXISTS idx_sales_date ON sales(sale_date);
            CREATE INDEX IF NOT EXISTS idx_sales_invoice ON sales(invoice_no);
            CREATE INDEX IF NOT EXISTS idx_sale_items_sale_id ON sale_items(sale_id);
            CREATE INDEX IF NOT EXISTS idx_payments_sale_id ON payments(sale_id);
            "#,
        )?;
        Ok(())
    }

    /// True when an invoice is already stored; re-ingesting the same file
    /// skips these rows.
    pub fn exists_invoice(&self, invoice_no: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT sale_id FROM sales WHERE invoice_no = ?1",
                params![invoice_no],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert a sale with its line items and optional payments in a single
    /// transaction, then stamp the derived payment status.
    ///
    /// Totals left at zero by extraction are derived from the items.
    pub fn add_sale(
        &self,
        candidate: &SaleCandidate,
        customer_id: i64,
        items: &[NewSaleItem],
        payments: &[PaymentInput],
    ) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let total_amount = if candidate.total_amount > 0.0 {
            candidate.total_amount
        } else {
            items.iter().map(|i| i.amount).sum()
        };
        let total_liters = if candidate.total_liters > 0.0 {
            candidate.total_liters
        } else {
            items.iter().map(|i| i.liters).sum()
        };
        let paid: f64 = payments.iter().map(|p| p.amount).sum();
        let status = PaymentStatus::from_amounts(paid, total_amount);

        tx.execute(
            r#"
            INSERT INTO sales (
                invoice_no, customer_id, sale_date, dispatch_date,
                total_amount, total_liters, payment_date,
                gpay_amount, cash_amount, cheque_amount, rrn, reference,
                payment_status, source_file, source_sheet
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                candidate.invoice_no,
                customer_id,
                candidate.sale_date.map(fmt_date),
                candidate.dispatch_date.map(fmt_date),
                total_amount,
                total_liters,
                candidate.payment_date.map(fmt_date),
                candidate.gpay_amount,
                candidate.cash_amount,
                candidate.cheque_amount,
                candidate.rrn,
                candidate.reference,
                status.as_str(),
                candidate.provenance.source_file,
                candidate.provenance.source_sheet,
            ],
        )?;
        let sale_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO sale_items
                    (sale_id, product_id, quantity, rate, amount, source_file, source_sheet)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for item in items {
                stmt.execute(params![
                    sale_id,
                    item.product_id,
                    item.quantity,
                    item.rate,
                    item.amount,
                    candidate.provenance.source_file,
                    candidate.provenance.source_sheet,
                ])?;
            }

            let mut pay_stmt = tx.prepare(
                r#"
                INSERT INTO payments
                    (sale_id, payment_date, payment_method, amount, rrn, reference)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for payment in payments {
                pay_stmt.execute(params![
                    sale_id,
                    payment.payment_date.map(fmt_date),
                    payment.method,
                    payment.amount,
                    payment.rrn,
                    payment.reference,
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(sale_id)
    }

    /// Next invoice number continuing the highest stored INV{n} sequence.
    /// Only numeric invoices count; synthesized ones (INV_{file}_{sheet}_{n})
    /// are ignored so they cannot reset the sequence.
    pub fn next_invoice_no(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let max: Option<u64> = conn
            .query_row(
                "SELECT MAX(CAST(SUBSTR(invoice_no, 4) AS INTEGER)) FROM sales \
                 WHERE invoice_no GLOB 'INV[0-9]*'",
                [],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        Ok(format!("INV{:06}", max.unwrap_or(0) + 1))
    }

    pub fn count_sales(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM sales", [], |row| row.get(0))?;
        Ok(n)
    }

    pub fn get_by_invoice(&self, invoice_no: &str) -> RepositoryResult<Option<SaleRecord>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                r#"
                SELECT sale_id, invoice_no, customer_id, total_amount, total_liters,
                       payment_status, source_file, source_sheet
                FROM sales WHERE invoice_no = ?1
                "#,
                params![invoice_no],
                |row| {
                    Ok(SaleRecord {
                        sale_id: row.get(0)?,
                        invoice_no: row.get(1)?,
                        customer_id: row.get(2)?,
                        total_amount: row.get(3)?,
                        total_liters: row.get(4)?,
                        payment_status: row.get(5)?,
                        provenance: Provenance {
                            source_file: row.get(6)?,
                            source_sheet: row.get(7)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    pub fn items_for_sale(&self, sale_id: i64) -> RepositoryResult<Vec<SaleItemRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT item_id, sale_id, product_id, quantity, rate, amount
            FROM sale_items WHERE sale_id = ?1 ORDER BY item_id
            "#,
        )?;
        let items = stmt
            .query_map(params![sale_id], |row| {
                Ok(SaleItemRecord {
                    item_id: row.get(0)?,
                    sale_id: row.get(1)?,
                    product_id: row.get(2)?,
                    quantity: row.get(3)?,
                    rate: row.get(4)?,
                    amount: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

fn fmt_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::customer_repo::CustomerRepository;
    use crate::repository::product_repo::ProductRepository;
    use crate::domain::customer::CustomerCandidate;

    fn setup() -> (SaleRepository, i64) {
        let conn = Arc::new(Mutex::new(
            crate::db::open_sqlite_connection(":memory:").unwrap(),
        ));
        // sale_items carries FKs to both customers and products.
        ProductRepository::from_connection(conn.clone()).unwrap();
        let customers = CustomerRepository::from_connection(conn.clone()).unwrap();
        let customer_id = customers
            .get_or_create(&CustomerCandidate {
                name: "Ramesh".to_string(),
                ..Default::default()
            })
            .unwrap();
        let sales = SaleRepository::from_connection(conn).unwrap();
        (sales, customer_id)
    }

    fn item(quantity: f64, rate: f64) -> NewSaleItem {
        NewSaleItem {
            product_id: None,
            quantity,
            rate,
            amount: quantity * rate,
            liters: quantity * 5.0,
        }
    }

    #[test]
    fn test_add_sale_derives_totals_and_status() {
        let (repo, customer_id) = setup();
        let candidate = SaleCandidate {
            invoice_no: "INV001".to_string(),
            customer_name: "Ramesh".to_string(),
            ..Default::default()
        };

        let sale_id = repo
            .add_sale(&candidate, customer_id, &[item(2.0, 680.0)], &[])
            .unwrap();

        let stored = repo.get_by_invoice("INV001").unwrap().unwrap();
        assert_eq!(stored.sale_id, sale_id);
        assert_eq!(stored.total_amount, 1360.0);
        assert_eq!(stored.total_liters, 10.0);
        assert_eq!(stored.payment_status, "Pending");
        assert_eq!(repo.items_for_sale(sale_id).unwrap().len(), 1);
    }

    #[test]
    fn test_add_sale_with_full_payment_marks_paid() {
        let (repo, customer_id) = setup();
        let candidate = SaleCandidate {
            invoice_no: "INV002".to_string(),
            ..Default::default()
        };
        let payment = PaymentInput {
            payment_date: None,
            method: "Cash".to_string(),
            amount: 1360.0,
            rrn: String::new(),
            reference: String::new(),
        };

        repo.add_sale(&candidate, customer_id, &[item(2.0, 680.0)], &[payment])
            .unwrap();
        let stored = repo.get_by_invoice("INV002").unwrap().unwrap();
        assert_eq!(stored.payment_status, "Paid");
    }

    #[test]
    fn test_duplicate_invoice_rejected() {
        let (repo, customer_id) = setup();
        let candidate = SaleCandidate {
            invoice_no: "INV003".to_string(),
            ..Default::default()
        };
        repo.add_sale(&candidate, customer_id, &[], &[]).unwrap();
        assert!(repo.exists_invoice("INV003").unwrap());

        let err = repo.add_sale(&candidate, customer_id, &[], &[]);
        assert!(matches!(
            err,
            Err(RepositoryError::UniqueConstraintViolation(_))
        ));
    }

    #[test]
    fn test_next_invoice_no_continues_sequence() {
        let (repo, customer_id) = setup();
        assert_eq!(repo.next_invoice_no().unwrap(), "INV000001");

        let candidate = SaleCandidate {
            invoice_no: "INV000041".to_string(),
            ..Default::default()
        };
        repo.add_sale(&candidate, customer_id, &[], &[]).unwrap();
        assert_eq!(repo.next_invoice_no().unwrap(), "INV000042");
    }

    #[test]
    fn test_next_invoice_no_skips_synthesized_invoices() {
        let (repo, customer_id) = setup();
        let numbered = SaleCandidate {
            invoice_no: "INV000041".to_string(),
            ..Default::default()
        };
        repo.add_sale(&numbered, customer_id, &[], &[]).unwrap();

        let synthesized = SaleCandidate {
            invoice_no: "INV_ledger.xlsx_March_1".to_string(),
            ..Default::default()
        };
        repo.add_sale(&synthesized, customer_id, &[], &[]).unwrap();

        assert_eq!(repo.next_invoice_no().unwrap(), "INV000042");
    }
}
