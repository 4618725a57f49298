// ==========================================
// Rural Sales IMS - customer repository
// ==========================================
// Responsibility: customers table CRUD + identity resolution support
// Constraint: (name, mobile) is UNIQUE; get_or_create is one atomic
// statement, never insert-then-reread
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::customer::{Customer, CustomerCandidate};
use crate::domain::sheet::Provenance;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct CustomerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CustomerRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_table()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS customers (
              customer_id INTEGER PRIMARY KEY AUTOINCREMENT,
              customer_code TEXT NOT NULL DEFAULT '',
              name TEXT NOT NULL,
              mobile TEXT NOT NULL DEFAULT '',
              village TEXT NOT NULL DEFAULT '',
              taluka TEXT NOT NULL DEFAULT '',
              district TEXT NOT NULL DEFAULT '',
              source_file TEXT NOT NULL DEFAULT '',
              source_sheet TEXT NOT NULL DEFAULT '',
              created_at TEXT NOT NULL DEFAULT (datetime('now')),
              UNIQUE(name, mobile)
            );

            CREATE INDEX IF NOT EXISTS idx_customers_village ON customers(village);
            CREATE INDEX IF NOT EXISTS idx_customers_mobile ON customers(mobile);
            "#,
        )?;
        Ok(())
    }

    /// Resolve a sighting to a customer id, creating the customer when the
    /// (name, mobile) pair is new.
    ///
    /// One atomic upsert-with-returning: two concurrent resolutions of the
    /// same pair cannot create duplicates. On conflict, fields that were
    /// blank in the stored row are filled from the new sighting; non-blank
    /// fields are never overwritten.
    pub fn get_or_create(&self, candidate: &CustomerCandidate) -> RepositoryResult<i64> {
        let code = if candidate.customer_code.is_empty() {
            Self::generate_customer_code()
        } else {
            candidate.customer_code.clone()
        };

        let conn = self.get_conn()?;
        let customer_id: i64 = conn.query_row(
            r#"
            INSERT INTO customers (
                customer_code, name, mobile, village, taluka, district,
                source_file, source_sheet
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(name, mobile) DO UPDATE SET
                customer_code = CASE WHEN customers.customer_code = ''
                                     THEN excluded.customer_code
                                     ELSE customers.customer_code END,
                village  = CASE WHEN customers.village = ''
                                THEN excluded.village ELSE customers.village END,
                taluka   = CASE WHEN customers.taluka = ''
                                THEN excluded.taluka ELSE customers.taluka END,
                district = CASE WHEN customers.district = ''
                                THEN excluded.district ELSE customers.district END
            RETURNING customer_id
            "#,
            params![
                code,
                candidate.name,
                candidate.mobile,
                candidate.village,
                candidate.taluka,
                candidate.district,
                candidate.provenance.source_file,
                candidate.provenance.source_sheet,
            ],
            |row| row.get(0),
        )?;

        Ok(customer_id)
    }

    /// Look up an existing customer by the natural key.
    pub fn find_by_name_mobile(&self, name: &str, mobile: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT customer_id FROM customers WHERE name = ?1 AND mobile = ?2",
                params![name, mobile],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn get(&self, customer_id: i64) -> RepositoryResult<Customer> {
        let conn = self.get_conn()?;
        let customer = conn
            .query_row(
                r#"
                SELECT customer_id, customer_code, name, mobile, village, taluka,
                       district, source_file, source_sheet
                FROM customers WHERE customer_id = ?1
                "#,
                params![customer_id],
                Self::map_row,
            )
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Customer".to_string(),
                id: customer_id.to_string(),
            })?;
        Ok(customer)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?;
        Ok(n)
    }

    pub fn list(&self) -> RepositoryResult<Vec<Customer>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT customer_id, customer_code, name, mobile, village, taluka,
                   district, source_file, source_sheet
            FROM customers ORDER BY customer_id
            "#,
        )?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Customer> {
        Ok(Customer {
            customer_id: row.get(0)?,
            customer_code: row.get(1)?,
            name: row.get(2)?,
            mobile: row.get(3)?,
            village: row.get(4)?,
            taluka: row.get(5)?,
            district: row.get(6)?,
            provenance: Provenance {
                source_file: row.get(7)?,
                source_sheet: row.get(8)?,
            },
        })
    }

    /// Time-based surrogate code for customers first seen through a sale
    /// reference.
    fn generate_customer_code() -> String {
        format!("CUST{}", chrono::Local::now().format("%Y%m%d%H%M%S"))
    }
}
