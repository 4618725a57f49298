// ==========================================
// Rural Sales IMS - runtime configuration
// ==========================================
// Responsibility: resolve the database path and the data/export
// directories, creating them when missing.
// Constraint: no business logic, paths only.
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Default database file name
pub const DEFAULT_DB_NAME: &str = "sales_management.db";

/// Optional override file in the base directory
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Runtime paths for the ingestion system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Live relational store
    pub db_path: PathBuf,
    /// Incoming spreadsheet drop directory
    pub data_dir: PathBuf,
    /// Standardized export directory (batch mode output)
    pub export_dir: PathBuf,
}

impl AppConfig {
    /// Build a config rooted at an explicit base directory.
    pub fn rooted_at<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref();
        Self {
            db_path: base.join(DEFAULT_DB_NAME),
            data_dir: base.join("data"),
            export_dir: base.join("standardized_data"),
        }
    }

    fn default_base() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rural-sales-ims")
    }

    /// Platform default: a `rural-sales-ims` directory under the user data
    /// dir, falling back to the current directory.
    pub fn default_paths() -> Self {
        Self::rooted_at(Self::default_base())
    }

    /// Read a config from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Use `config.json` from the base directory when present, otherwise
    /// the platform defaults. A malformed file is logged and ignored.
    pub fn load_or_default() -> Self {
        let base = Self::default_base();
        let file = base.join(CONFIG_FILE_NAME);
        if file.exists() {
            match Self::load(&file) {
                Ok(cfg) => return cfg,
                Err(e) => warn!(file = %file.display(), error = %e, "config file ignored"),
            }
        }
        Self::rooted_at(base)
    }

    /// Create the data and export directories if they do not exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.export_dir)?;
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Database path as a string slice for rusqlite.
    pub fn db_path_str(&self) -> &str {
        self.db_path.to_str().unwrap_or(DEFAULT_DB_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_config_layout() {
        let cfg = AppConfig::rooted_at("/tmp/ims-test");
        assert!(cfg.db_path.ends_with(DEFAULT_DB_NAME));
        assert!(cfg.data_dir.ends_with("data"));
        assert!(cfg.export_dir.ends_with("standardized_data"));
    }

    #[test]
    fn test_config_json_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        let cfg = AppConfig::rooted_at("/srv/ims");
        cfg.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.db_path, cfg.db_path);
        assert_eq!(loaded.export_dir, cfg.export_dir);
    }

    #[test]
    fn test_malformed_config_is_a_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_ensure_dirs_creates_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = AppConfig::rooted_at(tmp.path().join("nested"));
        cfg.ensure_dirs().unwrap();
        assert!(cfg.data_dir.is_dir());
        assert!(cfg.export_dir.is_dir());
    }
}
