// ==========================================
// Rural Sales IMS - demo repository
// ==========================================
// Responsibility: demos table (scheduled product trials, distinct from
// sales) + follow-up queries for the reminder path
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// Demo input.
#[derive(Debug, Clone)]
pub struct NewDemo {
    pub customer_id: i64,
    pub distributor_id: Option<i64>,
    pub product_id: Option<i64>,
    pub demo_date: NaiveDate,
    pub quantity_provided: i64,
    pub follow_up_date: Option<NaiveDate>,
    pub notes: String,
}

/// Follow-up due row, joined with customer contact fields for reminders.
#[derive(Debug, Clone)]
pub struct DueFollowUp {
    pub demo_id: i64,
    pub customer_name: String,
    pub mobile: String,
    pub follow_up_date: String,
    pub conversion_status: String,
}

pub struct DemoRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DemoRepository {
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
            CREATE TABLE IF NOT EXISTS demos (
              demo_id INTEGER PRIMARY KEY AUTOINCREMENT,
              customer_id INTEGER,
              distributor_id INTEGER,
              demo_date TEXT,
              product_id INTEGER,
              quantity_provided INTEGER NOT NULL DEFAULT 0,
              follow_up_date TEXT,
              conversion_status TEXT NOT NULL DEFAULT 'Not Converted',
              notes TEXT NOT NULL DEFAULT '',
              FOREIGN KEY (customer_id) REFERENCES customers (customer_id) ON DELETE SET NULL,
              FOREIGN KEY (distributor_id) REFERENCES distributors (distributor_id) ON DELETE SET NULL,
              FOREIGN KEY (product_id) REFERENCES products (product_id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_demos_customer_id ON demos(customer_id);
            CREATE INDEX IF NOT EXISTS idx_demos_follow_up ON demos(follow_up_date);
            "#,
        )?;
        Ok(())
    }

    pub fn add_demo(&self, demo: &NewDemo) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO demos (
                customer_id, distributor_id, demo_date, product_id,
                quantity_provided, follow_up_date, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                demo.customer_id,
                demo.distributor_id,
                demo.demo_date.format("%Y-%m-%d").to_string(),
                demo.product_id,
                demo.quantity_provided,
                demo.follow_up_date.map(|d| d.format("%Y-%m-%d").to_string()),
                demo.notes,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Follow-ups due on or before the given date for demos that have not
    /// converted yet.
    pub fn due_follow_ups(&self, on_or_before: NaiveDate) -> RepositoryResult<Vec<DueFollowUp>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT d.demo_id, COALESCE(c.name, ''), COALESCE(c.mobile, ''),
                   d.follow_up_date, d.conversion_status
            FROM demos d
            LEFT JOIN customers c ON d.customer_id = c.customer_id
            WHERE d.follow_up_date IS NOT NULL
              AND d.follow_up_date <= ?1
              AND d.conversion_status != 'Converted'
            ORDER BY d.follow_up_date ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![on_or_before.format("%Y-%m-%d").to_string()], |row| {
                Ok(DueFollowUp {
                    demo_id: row.get(0)?,
                    customer_name: row.get(1)?,
                    mobile: row.get(2)?,
                    follow_up_date: row.get(3)?,
                    conversion_status: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn mark_converted(&self, demo_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE demos SET conversion_status = 'Converted' WHERE demo_id = ?1",
            params![demo_id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Demo".to_string(),
                id: demo_id.to_string(),
            });
        }
        Ok(())
    }
}
