//! SQLite persistence: connection management, schema migrations and seeding.

mod schema;
mod seed;

use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::errors::Result;

pub use schema::SCHEMA_VERSION;
pub use seed::{DefaultAccount, DefaultCategory, DEFAULT_ACCOUNTS, DEFAULT_CATEGORIES};

/// Tables in dependency order; deletes run in reverse.
pub const DATA_TABLES: [&str; 6] = [
    "categories",
    "accounts",
    "budgets",
    "transactions",
    "budget_progress",
    "budget_alerts",
];

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the database file at `path` and migrates it.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        let db = Self::from_connection(conn)?;
        info!(path = %path.display(), "opened database");
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn migrate(&self) -> Result<()> {
        schema::migrate(&self.conn)
    }

    pub fn schema_version(&self) -> Result<i64> {
        schema::schema_version(&self.conn)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Runs `f` inside an IMMEDIATE transaction. Commits on `Ok`, rolls back on `Err`.
    pub fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(&self.conn) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    debug!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    pub fn row_count(&self, table: &str) -> Result<i64> {
        let table = DATA_TABLES
            .iter()
            .find(|known| **known == table)
            .ok_or_else(|| crate::errors::TrackerError::validation(format!("unknown table `{table}`")))?;
        Ok(self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?)
    }

    /// Deletes every row of every data table on `conn`.
    pub(crate) fn clear_tables(conn: &Connection) -> Result<()> {
        for table in DATA_TABLES.iter().rev() {
            conn.execute(&format!("DELETE FROM {table}"), [])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TrackerError;

    #[test]
    fn in_memory_database_has_all_tables() {
        let db = Database::open_in_memory().unwrap();
        let names = db.table_names().unwrap();
        for table in DATA_TABLES {
            assert!(names.iter().any(|name| name == table), "missing {table}");
        }
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let result: Result<()> = db.with_transaction(|conn| {
            conn.execute(
                "INSERT INTO categories (name, icon, color, type, created_at, updated_at)
                 VALUES ('Temp', 'tag', '#000000', 'expense', '2024-01-01', '2024-01-01')",
                [],
            )?;
            Err(TrackerError::validation("abort"))
        });
        assert!(result.is_err());
        assert_eq!(db.row_count("categories").unwrap(), 0);
    }

    #[test]
    fn file_database_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.db");
        {
            let db = Database::open(&path).unwrap();
            assert!(db.seed_defaults(chrono::Utc::now()).unwrap());
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.row_count("categories").unwrap(), 16);
        assert!(!db.seed_defaults(chrono::Utc::now()).unwrap());
    }
}
