// ==========================================
// Rural Sales IMS - product repository
// ==========================================
// Responsibility: products table + one-time catalog seeding
// Constraint: the catalog is closed; ingestion never inserts products
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::product::{Product, PRODUCT_CATALOG};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
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
            CREATE TABLE IF NOT EXISTS products (
              product_id INTEGER PRIMARY KEY AUTOINCREMENT,
              product_name TEXT NOT NULL UNIQUE,
              packing_type TEXT NOT NULL DEFAULT '',
              capacity_ltr REAL NOT NULL DEFAULT 0,
              category TEXT NOT NULL DEFAULT '',
              standard_rate REAL NOT NULL DEFAULT 0
            );
            "#,
        )?;
        Ok(())
    }

    /// Seed the fixed catalog. INSERT OR IGNORE keeps re-runs harmless and
    /// never touches existing rows.
    pub fn seed_catalog(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            INSERT OR IGNORE INTO products
                (product_name, packing_type, capacity_ltr, category, standard_rate)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;

        let mut inserted = 0;
        for spec in PRODUCT_CATALOG.iter() {
            inserted += stmt.execute(params![
                spec.name,
                spec.packing_type,
                spec.capacity_ltr,
                spec.category,
                spec.standard_rate,
            ])?;
        }
        Ok(inserted)
    }

    /// Load the full catalog in id order, for the in-memory resolver.
    pub fn load_catalog(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_id, product_name, packing_type, capacity_ltr,
                   category, standard_rate
            FROM products ORDER BY product_id
            "#,
        )?;
        let products = stmt
            .query_map([], |row| {
                Ok(Product {
                    product_id: row.get(0)?,
                    product_name: row.get(1)?,
                    packing_type: row.get(2)?,
                    capacity_ltr: row.get(3)?,
                    category: row.get(4)?,
                    standard_rate: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }
}
