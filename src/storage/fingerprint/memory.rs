//! In-memory fingerprint store.
//!
//! Provides a non-persistent implementation of [`FingerprintStore`] for unit
//! tests and ephemeral runs.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use super::{rank_by_distance, retention_cutoff};
use crate::models::{FingerprintRecord, FingerprintStatistics, NewFingerprint, RecordId};
use crate::simhash::hamming_distance;
use crate::storage::sqlite::record_operation_metrics;
use crate::storage::traits::FingerprintStore;
use crate::{Result, current_timestamp};

const BACKEND: &str = "memory";

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<FingerprintRecord>,
    /// Last assigned ID; never reused after deletions.
    last_id: i64,
}

/// In-memory fingerprint store.
///
/// Uses `RwLock` for thread-safe access with reader-writer semantics.
/// Data is not persisted between runs.
///
/// # Example
///
/// ```rust,ignore
/// use simdup::storage::{FingerprintStore, InMemoryFingerprintStore};
///
/// let store = InMemoryFingerprintStore::new();
/// assert_eq!(store.statistics(None).total_count, 0);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryFingerprintStore {
    state: RwLock<MemoryState>,
}

impl InMemoryFingerprintStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    /// Returns whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts a record with an explicit creation time.
    ///
    /// # Errors
    ///
    /// Never fails; the signature mirrors the `SQLite` store.
    pub fn insert_at(&self, entry: NewFingerprint, created_at: u64) -> Result<FingerprintRecord> {
        let start = Instant::now();
        let record = {
            let mut state = self.write();
            state.last_id += 1;
            let record = entry.into_record(RecordId::new(state.last_id), created_at);
            state.records.push(record.clone());
            record
        };
        record_operation_metrics(BACKEND, "insert", start, "success");
        Ok(record)
    }

    // A writer that panicked mid-push leaves the Vec valid, so poison is ignored
    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn retain(&self, operation: &'static str, keep: impl Fn(&FingerprintRecord) -> bool) -> u64 {
        let start = Instant::now();
        let removed = {
            let mut state = self.write();
            let before = state.records.len();
            state.records.retain(|record| keep(record));
            before - state.records.len()
        };
        record_operation_metrics(BACKEND, operation, start, "success");
        removed as u64
    }
}

impl FingerprintStore for InMemoryFingerprintStore {
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
        let hits = self
            .read()
            .records
            .iter()
            .filter(|record| record.in_project(source_project))
            .filter_map(|record| {
                let distance = hamming_distance(target, record.fingerprint);
                (distance <= max_distance).then(|| (record.clone(), distance))
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
        self.read()
            .records
            .iter()
            .find(|record| record.content_hash == content_hash && record.in_project(source_project))
            .cloned()
    }

    fn prune_created_before(&self, cutoff: u64) -> Result<u64> {
        Ok(self.retain("prune", |record| record.created_at >= cutoff))
    }

    fn delete(&self, id: RecordId) -> Result<bool> {
        Ok(self.retain("delete", |record| record.id != id) > 0)
    }

    fn clear(&self, source_project: Option<&str>) -> Result<u64> {
        Ok(self.retain("clear", |record| !record.in_project(source_project)))
    }

    fn statistics(&self, source_project: Option<&str>) -> FingerprintStatistics {
        let recent_cutoff = retention_cutoff(current_timestamp(), 7);
        let state = self.read();
        let mut stats = FingerprintStatistics::default();

        for record in &state.records {
            *stats
                .project_breakdown
                .entry(record.source_project.clone())
                .or_insert(0) += 1;

            if !record.in_project(source_project) {
                continue;
            }
            stats.total_count += 1;
            if record.created_at >= recent_cutoff {
                stats.recent_week_count += 1;
            }
            let ts = record.created_at;
            stats.earliest = Some(stats.earliest.map_or(ts, |earliest| earliest.min(ts)));
            stats.latest = Some(stats.latest.map_or(ts, |latest| latest.max(ts)));
        }

        stats
    }
}
