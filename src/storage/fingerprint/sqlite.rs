//! `SQLite` backend for fingerprint storage.
//!
//! Records live in a single `content_fingerprints` table. Every operation
//! takes the connection lock for its own duration only; writes run inside a
//! transaction that is rolled back on any early return.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use rusqlite::{Connection, OptionalExtension, params};

use super::{rank_by_distance, retention_cutoff};
use crate::models::{
    FingerprintRecord, FingerprintStatistics, NewFingerprint, RecordId, truncate_preview,
};
use crate::simhash::hamming_distance;
use crate::storage::migrations::{FINGERPRINT_MIGRATIONS, MigrationRunner};
use crate::storage::sqlite::{
    FINGERPRINT_COLUMNS, FingerprintRow, acquire_lock, configure_connection, from_db_count,
    from_db_timestamp, record_operation_metrics, to_db_timestamp,
};
use crate::storage::traits::FingerprintStore;
use crate::{Error, Result, current_timestamp};

/// Table holding fingerprint records.
const TABLE: &str = "content_fingerprints";

/// Backend label for metrics.
const BACKEND: &str = "sqlite";

/// Seven days, for the "recent" statistic.
const RECENT_WINDOW_DAYS: u32 = 7;

/// Maps a `rusqlite` error to [`Error::OperationFailed`].
fn op_failed(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
    move |e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

const fn status<T, E>(result: &std::result::Result<T, E>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}

/// SQLite-based fingerprint store.
///
/// # Concurrency
///
/// The connection sits behind a `Mutex`; a poisoned lock is recovered rather
/// than propagated. Separate processes sharing one file are serialized by
/// `SQLite` itself (WAL mode with a busy timeout).
pub struct SqliteFingerprintStore {
    /// Database connection (mutex for interior mutability).
    conn: Mutex<Connection>,
    /// Database file, `None` for in-memory stores.
    db_path: Option<PathBuf>,
}

impl SqliteFingerprintStore {
    /// Opens (or creates) a store at the specified path.
    ///
    /// Missing parent directories are created and pending schema migrations
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_fingerprint_db_dir".to_string(),
                cause: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(op_failed("open_fingerprint_database"))?;
        Self::from_connection(conn, Some(path.to_path_buf()))
    }

    /// Creates an in-memory store (for testing and one-off runs).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(op_failed("open_fingerprint_database_memory"))?;
        Self::from_connection(conn, None)
    }

    fn from_connection(mut conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        configure_connection(&conn)?;
        MigrationRunner::new(TABLE).run(&mut conn, FINGERPRINT_MIGRATIONS)?;

        tracing::debug!(path = ?db_path, "Opened fingerprint store");
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Returns the default database path.
    ///
    /// The path is `~/.config/simdup/fingerprints.db`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|d| {
            d.home_dir()
                .join(".config")
                .join("simdup")
                .join("fingerprints.db")
        })
    }

    /// Returns the database file path, if file-backed.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Inserts a record with an explicit creation time.
    ///
    /// Used for imports and to age records in tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert or its transaction fails.
    pub fn insert_at(&self, entry: NewFingerprint, created_at: u64) -> Result<FingerprintRecord> {
        let start = Instant::now();
        let result = self.insert_inner(entry, created_at);
        record_operation_metrics(BACKEND, "insert", start, status(&result));

        if let Ok(record) = &result {
            tracing::debug!(
                record_id = %record.id,
                fingerprint = record.fingerprint,
                project = %record.source_project,
                "Stored fingerprint"
            );
        }
        result
    }

    fn insert_inner(&self, entry: NewFingerprint, created_at: u64) -> Result<FingerprintRecord> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn.transaction().map_err(op_failed("insert_fingerprint"))?;

        tx.execute(
            &format!(
                "INSERT INTO {TABLE} (fingerprint, content_hash, preview, source_project, \
                 document_path, word_count, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            params![
                entry.fingerprint.to_string(),
                entry.content_hash,
                truncate_preview(&entry.preview),
                entry.source_project,
                entry.document_path,
                i64::try_from(entry.word_count).unwrap_or(i64::MAX),
                to_db_timestamp(created_at),
            ],
        )
        .map_err(op_failed("insert_fingerprint"))?;
        let id = tx.last_insert_rowid();

        tx.commit().map_err(op_failed("insert_fingerprint_commit"))?;

        Ok(entry.into_record(RecordId::new(id), created_at))
    }

    /// Loads the rows of one project (or all rows).
    fn load_rows(&self, source_project: Option<&str>) -> rusqlite::Result<Vec<FingerprintRow>> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {FINGERPRINT_COLUMNS} FROM {TABLE} \
             WHERE (?1 IS NULL OR source_project = ?1) ORDER BY id"
        ))?;
        stmt.query_map(params![source_project], FingerprintRow::from_row)?
            .collect()
    }

    fn delete_where(
        &self,
        operation: &'static str,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<u64> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn.transaction().map_err(op_failed(operation))?;
        let deleted = tx.execute(sql, params).map_err(op_failed(operation))?;
        tx.commit().map_err(op_failed(operation))?;
        Ok(deleted as u64)
    }

    fn query_statistics(
        &self,
        source_project: Option<&str>,
    ) -> rusqlite::Result<FingerprintStatistics> {
        let recent_cutoff = retention_cutoff(current_timestamp(), RECENT_WINDOW_DAYS);
        let conn = acquire_lock(&self.conn);

        let (total, recent, earliest, latest): (i64, Option<i64>, Option<i64>, Option<i64>) = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*), SUM(CASE WHEN created_at >= ?2 THEN 1 ELSE 0 END), \
                     MIN(created_at), MAX(created_at) FROM {TABLE} \
                     WHERE (?1 IS NULL OR source_project = ?1)"
                ),
                params![source_project, to_db_timestamp(recent_cutoff)],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT source_project, COUNT(*) FROM {TABLE} GROUP BY source_project"
        ))?;
        let project_breakdown = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, from_db_count(row.get(1)?)))
            })?
            .collect::<rusqlite::Result<_>>()?;

        Ok(FingerprintStatistics {
            total_count: from_db_count(total),
            recent_week_count: recent.map_or(0, from_db_count),
            project_breakdown,
            earliest: earliest.map(from_db_timestamp),
            latest: latest.map(from_db_timestamp),
        })
    }
}

impl FingerprintStore for SqliteFingerprintStore {
    fn insert(&self, entry: NewFingerprint) -> Result<FingerprintRecord> {
        self.insert_at(entry, current_timestamp())
    }

    fn find_within_distance(
        &self,
        target: u64,
        max_distance: u32,
        source_project: Option<&str>,
        limit: usize,
    ) -> Vec<(FingerprintRecord, u32)> {
        let start = Instant::now();
        let rows = match self.load_rows(source_project) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "Fingerprint scan failed, reporting no matches");
                record_operation_metrics(BACKEND, "scan", start, "error");
                return Vec::new();
            },
        };

        let hits = rows
            .into_iter()
            .filter_map(FingerprintRow::into_record)
            .filter_map(|record| {
                let distance = hamming_distance(target, record.fingerprint);
                (distance <= max_distance).then_some((record, distance))
            })
            .collect();

        record_operation_metrics(BACKEND, "scan", start, "success");
        rank_by_distance(hits, limit)
    }

    fn exact_match(
        &self,
        content_hash: &str,
        source_project: Option<&str>,
    ) -> Option<FingerprintRecord> {
        let start = Instant::now();
        let result = {
            let conn = acquire_lock(&self.conn);
            conn.query_row(
                &format!(
                    "SELECT {FINGERPRINT_COLUMNS} FROM {TABLE} WHERE content_hash = ?1 \
                     AND (?2 IS NULL OR source_project = ?2) ORDER BY id LIMIT 1"
                ),
                params![content_hash, source_project],
                FingerprintRow::from_row,
            )
            .optional()
        };
        record_operation_metrics(BACKEND, "exact_match", start, status(&result));

        match result {
            Ok(row) => row.map(FingerprintRow::into_hash_match),
            Err(e) => {
                tracing::warn!(error = %e, "Exact-match lookup failed, reporting no match");
                None
            },
        }
    }

    fn prune_created_before(&self, cutoff: u64) -> Result<u64> {
        let start = Instant::now();
        let result = self.delete_where(
            "prune_fingerprints",
            &format!("DELETE FROM {TABLE} WHERE created_at < ?1"),
            params![to_db_timestamp(cutoff)],
        );
        record_operation_metrics(BACKEND, "prune", start, status(&result));

        if let Ok(deleted) = result {
            tracing::info!(cutoff, deleted, "Pruned old fingerprints");
        }
        result
    }

    fn delete(&self, id: RecordId) -> Result<bool> {
        let start = Instant::now();
        let result = self.delete_where(
            "delete_fingerprint",
            &format!("DELETE FROM {TABLE} WHERE id = ?1"),
            params![id.get()],
        );
        record_operation_metrics(BACKEND, "delete", start, status(&result));
        result.map(|deleted| deleted > 0)
    }

    fn clear(&self, source_project: Option<&str>) -> Result<u64> {
        let start = Instant::now();
        let result = self.delete_where(
            "clear_fingerprints",
            &format!("DELETE FROM {TABLE} WHERE (?1 IS NULL OR source_project = ?1)"),
            params![source_project],
        );
        record_operation_metrics(BACKEND, "clear", start, status(&result));

        if let Ok(deleted) = result {
            tracing::info!(project = ?source_project, deleted, "Cleared fingerprints");
        }
        result
    }

    fn statistics(&self, source_project: Option<&str>) -> FingerprintStatistics {
        let start = Instant::now();
        let result = self.query_statistics(source_project);
        record_operation_metrics(BACKEND, "statistics", start, status(&result));

        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to compute fingerprint statistics");
            FingerprintStatistics::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(fingerprint: u64, hash: &str, project: &str) -> NewFingerprint {
        NewFingerprint::new(fingerprint, hash)
            .with_preview("preview")
            .with_project(project)
            .with_document_path("out/doc.docx")
            .with_word_count(42)
    }

    #[test]
    fn test_insert_assigns_monotonic_ids() {
        let store = SqliteFingerprintStore::in_memory().unwrap();
        let a = store.insert(entry(1, "a", "p")).unwrap();
        let b = store.insert(entry(2, "b", "p")).unwrap();
        assert!(b.id > a.id);

        // AUTOINCREMENT never reuses identifiers of deleted rows
        store.clear(None).unwrap();
        let c = store.insert(entry(3, "c", "p")).unwrap();
        assert!(c.id > b.id);
    }

    #[test]
    fn test_full_u64_fingerprint_round_trips() {
        let store = SqliteFingerprintStore::in_memory().unwrap();
        store.insert(entry(u64::MAX, "max", "p")).unwrap();

        let hits = store.find_within_distance(u64::MAX, 0, None, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.fingerprint, u64::MAX);
        assert_eq!(hits[0].1, 0);
    }

    #[test]
    fn test_find_within_distance_sorted_and_limited() {
        let store = SqliteFingerprintStore::in_memory().unwrap();
        store.insert(entry(0b1111, "far", "p")).unwrap();
        store.insert(entry(0b0001, "near", "p")).unwrap();
        store.insert(entry(0, "exact", "p")).unwrap();
        store.insert(entry(u64::MAX, "outside", "p")).unwrap();

        let hits = store.find_within_distance(0, 4, Some("p"), 10);
        let distances: Vec<u32> = hits.iter().map(|(_, d)| *d).collect();
        assert_eq!(distances, vec![0, 1, 4]);

        let top = store.find_within_distance(0, 4, Some("p"), 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0.content_hash, "exact");
    }

    #[test]
    fn test_project_filter() {
        let store = SqliteFingerprintStore::in_memory().unwrap();
        store.insert(entry(7, "h", "alpha")).unwrap();

        assert_eq!(store.find_within_distance(7, 0, Some("beta"), 5).len(), 0);
        assert_eq!(store.find_within_distance(7, 0, Some("alpha"), 5).len(), 1);
        assert_eq!(store.find_within_distance(7, 0, None, 5).len(), 1);
        assert!(store.exact_match("h", Some("beta")).is_none());
        assert!(store.exact_match("h", Some("alpha")).is_some());
        assert!(store.exact_match("h", None).is_some());
    }

    #[test]
    fn test_corrupt_fingerprint_is_skipped() {
        let store = SqliteFingerprintStore::in_memory().unwrap();
        store.insert(entry(5, "good", "p")).unwrap();
        {
            let conn = acquire_lock(&store.conn);
            conn.execute(
                "INSERT INTO content_fingerprints (fingerprint, content_hash, created_at) \
                 VALUES ('garbage', 'bad', 0)",
                [],
            )
            .unwrap();
        }

        let hits = store.find_within_distance(5, 64, None, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.content_hash, "good");
    }

    #[test]
    fn test_exact_match_survives_corrupt_fingerprint() {
        let store = SqliteFingerprintStore::in_memory().unwrap();
        let stored = store.insert(entry(5, "same", "p")).unwrap();
        {
            let conn = acquire_lock(&store.conn);
            conn.execute("UPDATE content_fingerprints SET fingerprint = 'garbage'", [])
                .unwrap();
        }

        let record = store.exact_match("same", Some("p")).unwrap();
        assert_eq!(record.id, stored.id);
        assert_eq!(record.fingerprint, 0);
        assert!(store.find_within_distance(5, 64, None, 10).is_empty());
    }

    #[test]
    fn test_prune_created_before_boundary() {
        let store = SqliteFingerprintStore::in_memory().unwrap();
        store.insert_at(entry(1, "before", "p"), 999).unwrap();
        store.insert_at(entry(2, "at", "p"), 1_000).unwrap();
        store.insert_at(entry(3, "after", "p"), 1_001).unwrap();

        assert_eq!(store.prune_created_before(1_000).unwrap(), 1);
        assert!(store.exact_match("before", None).is_none());
        assert!(store.exact_match("at", None).is_some());
        assert!(store.exact_match("after", None).is_some());
    }

    #[test]
    fn test_prune_older_than() {
        let store = SqliteFingerprintStore::in_memory().unwrap();
        let now = current_timestamp();
        store.insert_at(entry(1, "old", "p"), now - 200 * 86_400).unwrap();
        store.insert_at(entry(2, "new", "p"), now - 86_400).unwrap();

        assert_eq!(store.prune_older_than(180).unwrap(), 1);
        assert_eq!(store.prune_older_than(180).unwrap(), 0);
        assert!(store.exact_match("old", None).is_none());
        assert!(store.exact_match("new", None).is_some());
    }

    #[test]
    fn test_delete_by_id() {
        let store = SqliteFingerprintStore::in_memory().unwrap();
        let record = store.insert(entry(1, "a", "p")).unwrap();

        assert!(store.delete(record.id).unwrap());
        assert!(!store.delete(record.id).unwrap());
        assert!(store.exact_match("a", None).is_none());
    }

    #[test]
    fn test_clear_scoped_and_global() {
        let store = SqliteFingerprintStore::in_memory().unwrap();
        store.insert(entry(1, "a", "alpha")).unwrap();
        store.insert(entry(2, "b", "alpha")).unwrap();
        store.insert(entry(3, "c", "beta")).unwrap();

        assert_eq!(store.clear(Some("alpha")).unwrap(), 2);
        assert_eq!(store.statistics(None).total_count, 1);
        assert_eq!(store.clear(None).unwrap(), 1);
        assert_eq!(store.statistics(None).total_count, 0);
    }

    #[test]
    fn test_statistics() {
        let store = SqliteFingerprintStore::in_memory().unwrap();
        let now = current_timestamp();
        store.insert_at(entry(1, "a", "alpha"), now - 30 * 86_400).unwrap();
        store.insert_at(entry(2, "b", "alpha"), now).unwrap();
        store.insert_at(entry(3, "c", ""), now).unwrap();

        let all = store.statistics(None);
        assert_eq!(all.total_count, 3);
        assert_eq!(all.recent_week_count, 2);
        assert_eq!(all.earliest, Some(now - 30 * 86_400));
        assert_eq!(all.latest, Some(now));
        assert_eq!(all.project_breakdown.get("alpha"), Some(&2));
        assert_eq!(all.project_breakdown.get(""), Some(&1));

        let alpha = store.statistics(Some("alpha"));
        assert_eq!(alpha.total_count, 2);
        assert_eq!(alpha.recent_week_count, 1);
    }

    #[test]
    fn test_empty_statistics() {
        let store = SqliteFingerprintStore::in_memory().unwrap();
        let stats = store.statistics(None);
        assert_eq!(stats, FingerprintStatistics::default());
    }

    #[test]
    fn test_preview_truncated_on_disk() {
        let store = SqliteFingerprintStore::in_memory().unwrap();
        store
            .insert(NewFingerprint::new(1, "long").with_preview("字".repeat(500)))
            .unwrap();

        let record = store.exact_match("long", None).unwrap();
        assert_eq!(record.preview.chars().count(), 200);
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fingerprints.db");

        {
            let store = SqliteFingerprintStore::new(&path).unwrap();
            store.insert(entry(99, "persisted", "p")).unwrap();
            assert_eq!(store.db_path(), Some(path.as_path()));
        }

        let reopened = SqliteFingerprintStore::new(&path).unwrap();
        let record = reopened.exact_match("persisted", Some("p")).unwrap();
        assert_eq!(record.fingerprint, 99);
        assert_eq!(record.word_count, 42);
    }
}
