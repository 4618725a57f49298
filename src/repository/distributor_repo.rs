// ==========================================
// Rural Sales IMS - distributor repository
// ==========================================
// Responsibility: distributors table CRUD
// Note: name+village+taluka identity is heuristic and not enforced unique
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::distributor::{Distributor, DistributorCandidate};
use crate::domain::sheet::Provenance;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct DistributorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DistributorRepository {
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
            CREATE TABLE IF NOT EXISTS distributors (
              distributor_id INTEGER PRIMARY KEY AUTOINCREMENT,
              name TEXT NOT NULL DEFAULT '',
              village TEXT NOT NULL DEFAULT '',
              taluka TEXT NOT NULL DEFAULT '',
              district TEXT NOT NULL DEFAULT '',
              mantri_name TEXT NOT NULL DEFAULT '',
              mantri_mobile TEXT NOT NULL DEFAULT '',
              sabhasad_count INTEGER NOT NULL DEFAULT 0,
              contact_in_group INTEGER NOT NULL DEFAULT 0,
              total_liters REAL NOT NULL DEFAULT 0,
              source_file TEXT NOT NULL DEFAULT '',
              source_sheet TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_distributors_village ON distributors(village);
            "#,
        )?;
        Ok(())
    }

    pub fn insert(&self, candidate: &DistributorCandidate) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO distributors (
                name, village, taluka, district, mantri_name, mantri_mobile,
                sabhasad_count, contact_in_group, total_liters,
                source_file, source_sheet
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                candidate.name,
                candidate.village,
                candidate.taluka,
                candidate.district,
                candidate.mantri_name,
                candidate.mantri_mobile,
                candidate.sabhasad_count,
                candidate.contact_in_group,
                candidate.total_liters,
                candidate.provenance.source_file,
                candidate.provenance.source_sheet,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM distributors", [], |row| row.get(0))?;
        Ok(n)
    }

    pub fn list(&self) -> RepositoryResult<Vec<Distributor>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT distributor_id, name, village, taluka, district, mantri_name,
                   mantri_mobile, sabhasad_count, contact_in_group, total_liters,
                   source_file, source_sheet
            FROM distributors ORDER BY distributor_id
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Distributor {
                    distributor_id: row.get(0)?,
                    name: row.get(1)?,
                    village: row.get(2)?,
                    taluka: row.get(3)?,
                    district: row.get(4)?,
                    mantri_name: row.get(5)?,
                    mantri_mobile: row.get(6)?,
                    sabhasad_count: row.get(7)?,
                    contact_in_group: row.get(8)?,
                    total_liters: row.get(9)?,
                    provenance: Provenance {
                        source_file: row.get(10)?,
                        source_sheet: row.get(11)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
