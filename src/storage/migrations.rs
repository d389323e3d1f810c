//! `SQLite` migration system for schema management.
//!
//! Migrations are compiled in and applied in order when a store is opened.
//! Applied versions are recorded in a `{table}_schema_migrations` tracking
//! table, so reopening an up-to-date database is a no-op.
//!
//! # Usage
//!
//! ```rust,ignore
//! use simdup::storage::migrations::{FINGERPRINT_MIGRATIONS, MigrationRunner};
//!
//! let runner = MigrationRunner::new("content_fingerprints");
//! runner.run(&mut conn, FINGERPRINT_MIGRATIONS)?;
//! ```

use crate::{Error, Result};
use rusqlite::Connection;

/// A single migration with version and SQL.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Migration version (sequential, starting at 1).
    pub version: i32,
    /// Human-readable description.
    pub description: &'static str,
    /// SQL to apply (may contain multiple statements separated by semicolons).
    /// Use `{table}` as a placeholder for the table name.
    pub sql: &'static str,
}

/// Schema history of the `content_fingerprints` table.
///
/// The fingerprint column is TEXT: values above `i64::MAX` would otherwise
/// be stored as negative integers.
pub const FINGERPRINT_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Create fingerprint table",
        sql: "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fingerprint TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                preview TEXT NOT NULL DEFAULT '',
                source_project TEXT NOT NULL DEFAULT '',
                document_path TEXT NOT NULL DEFAULT '',
                word_count INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_content_hash ON {table} (content_hash);
            CREATE INDEX IF NOT EXISTS idx_{table}_source_project ON {table} (source_project)",
    },
    Migration {
        version: 2,
        description: "Index creation time for retention pruning",
        sql: "CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table} (created_at)",
    },
];

/// Runs migrations for a `SQLite` table.
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    table_name: String,
}

impl MigrationRunner {
    /// Creates a new migration runner.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }

    /// Runs all pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails. A failed migration leaves the
    /// schema at the previous version.
    pub fn run(&self, conn: &mut Connection, migrations: &[Migration]) -> Result<()> {
        self.ensure_migrations_table(conn)?;
        let current_version = self.current_version(conn)?;

        for migration in migrations {
            if migration.version > current_version {
                self.apply_migration(conn, migration)?;
            }
        }

        Ok(())
    }

    /// Returns the current schema version (0 for a fresh database).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn current_version(&self, conn: &Connection) -> Result<i32> {
        let migrations_table = self.migrations_table_name();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                [&migrations_table],
                |row| row.get(0),
            )
            .map_err(|e| Error::OperationFailed {
                operation: "migration_table_exists".to_string(),
                cause: e.to_string(),
            })?;

        if !exists {
            return Ok(0);
        }

        conn.query_row(
            &format!("SELECT COALESCE(MAX(version), 0) FROM {migrations_table}"),
            [],
            |row| row.get(0),
        )
        .map_err(|e| Error::OperationFailed {
            operation: "migration_current_version".to_string(),
            cause: e.to_string(),
        })
    }

    /// Returns the name of the migrations tracking table.
    fn migrations_table_name(&self) -> String {
        format!("{}_schema_migrations", self.table_name)
    }

    fn ensure_migrations_table(&self, conn: &Connection) -> Result<()> {
        let migrations_table = self.migrations_table_name();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {migrations_table} (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            )"
        ))
        .map_err(|e| Error::OperationFailed {
            operation: "create_migrations_table".to_string(),
            cause: e.to_string(),
        })
    }

    /// Applies a single migration within a transaction.
    ///
    /// All statements and the version record commit together or not at all.
    fn apply_migration(&self, conn: &mut Connection, migration: &Migration) -> Result<()> {
        let migrations_table = self.migrations_table_name();
        let sql = migration.sql.replace("{table}", &self.table_name);

        let tx = conn.transaction().map_err(|e| Error::OperationFailed {
            operation: format!("migration_v{}_begin_tx", migration.version),
            cause: e.to_string(),
        })?;

        for statement in sql.split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }

            tx.execute(statement, [])
                .map_err(|e| Error::OperationFailed {
                    operation: format!(
                        "migration_v{}: {}",
                        migration.version, migration.description
                    ),
                    cause: e.to_string(),
                })?;
        }

        tx.execute(
            &format!("INSERT INTO {migrations_table} (version, description) VALUES (?1, ?2)"),
            rusqlite::params![migration.version, migration.description],
        )
        .map_err(|e| Error::OperationFailed {
            operation: "record_migration".to_string(),
            cause: e.to_string(),
        })?;

        tx.commit().map_err(|e| Error::OperationFailed {
            operation: format!("migration_v{}_commit", migration.version),
            cause: e.to_string(),
        })?;

        tracing::info!(
            version = migration.version,
            description = migration.description,
            table = %self.table_name,
            "Applied migration"
        );

        Ok(())
    }
}

/// Maximum version across a set of migrations.
#[must_use]
pub const fn max_version(migrations: &[Migration]) -> i32 {
    let mut max = 0;
    let mut i = 0;
    while i < migrations.len() {
        if migrations[i].version > max {
            max = migrations[i].version;
        }
        i += 1;
    }
    max
}
