use std::fs;
use std::path::Path;

use log::info;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OptionalExtension;

use crate::error::HazardPulseError;
use crate::schema::{CREATE_SCHEMA_SQL, CURRENT_SCHEMA_VERSION};

pub type DbConnection = PooledConnection<SqliteConnectionManager>;

#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self, HazardPulseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder().build(manager)?;
        let db = Self { pool };
        db.ensure_schema()?;

        info!("Database opened at: {}", db_path.display());
        Ok(db)
    }

    #[cfg(test)]
    /// Single-connection in-memory database; every pooled connection would
    /// otherwise see its own empty database.
    pub fn open_in_memory() -> Result<Self, HazardPulseError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        let db = Self { pool };
        db.ensure_schema()?;
        Ok(db)
    }

    pub fn conn(&self) -> Result<DbConnection, HazardPulseError> {
        Ok(self.pool.get()?)
    }

    fn ensure_schema(&self) -> Result<(), HazardPulseError> {
        let conn = self.conn()?;

        let table_exists: bool = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |row| row.get::<_, i32>(0),
            )
            .map(|count| count > 0)?;

        if !table_exists {
            conn.execute_batch(CREATE_SCHEMA_SQL)?;
            return Ok(());
        }

        let stored_version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored_version.as_deref() {
            Some(CURRENT_SCHEMA_VERSION) => Ok(()),
            Some(other) => Err(HazardPulseError::Error(format!(
                "Schema version mismatch: database is '{}', expected '{}'",
                other, CURRENT_SCHEMA_VERSION
            ))),
            None => Err(HazardPulseError::Error("Schema version missing".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("alerts.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());

        let conn = db.conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT count(*) FROM alerts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_reopen_keeps_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alerts.db");
        {
            let db = Database::open(&path).unwrap();
            db.conn()
                .unwrap()
                .execute(
                    "INSERT INTO alerts (alert, created_at) VALUES ('flood', 0)",
                    [],
                )
                .unwrap();
        }
        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .conn()
            .unwrap()
            .query_row("SELECT count(*) FROM alerts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_version_mismatch_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alerts.db");
        {
            let db = Database::open(&path).unwrap();
            db.conn()
                .unwrap()
                .execute("UPDATE meta SET value = '99' WHERE key = 'schema_version'", [])
                .unwrap();
        }
        assert!(Database::open(&path).is_err());
    }
}
