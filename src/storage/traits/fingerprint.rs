//! Fingerprint store trait.
//!
//! The store persists [`FingerprintRecord`]s and answers near-duplicate
//! queries over them.
//!
//! # Available Implementations
//!
//! | Backend | Use Case | Durability |
//! |---------|----------|------------|
//! | `SqliteFingerprintStore` | Default; embedded file | Transactional |
//! | `InMemoryFingerprintStore` | Tests, one-off runs | None |
//!
//! # Error Modes and Guarantees
//!
//! | Operation | On failure |
//! |-----------|------------|
//! | `insert`, `delete`, `prune_created_before`, `clear` | Transaction rolled back, `Err` returned |
//! | `find_within_distance`, `exact_match`, `statistics` | Logged, empty/default result returned |
//!
//! Read failures never abort a duplicate check: a store that cannot answer
//! reports "no match", and generation continues.
//!
//! ## Performance Characteristics
//!
//! - `exact_match` is an indexed lookup on `content_hash`
//! - `find_within_distance` is a linear scan over the (project-filtered)
//!   records, computing one XOR + popcount per record. This is comfortable for
//!   tens of thousands of records; a bucketed index can replace it behind this
//!   trait without touching the deduplicator.

use crate::models::{FingerprintRecord, FingerprintStatistics, NewFingerprint, RecordId};
use crate::storage::fingerprint::retention_cutoff;
use crate::{Result, current_timestamp};

/// Trait for fingerprint storage backends.
///
/// # Implementor Notes
///
/// - Methods use `&self` to enable sharing via `Arc<dyn FingerprintStore>`
/// - Use interior mutability (e.g., `Mutex<Connection>`) for mutable state
/// - `source_project: None` means "all projects"; `Some(p)` matches exactly `p`
/// - Record IDs must increase monotonically, including across deletions
pub trait FingerprintStore: Send + Sync {
    /// Appends a record; assigns its ID and creation time.
    ///
    /// No uniqueness constraint is enforced here.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written. No partial record
    /// is left behind.
    fn insert(&self, entry: NewFingerprint) -> Result<FingerprintRecord>;

    /// Finds records within `max_distance` bits of `target`.
    ///
    /// Results are sorted by ascending distance (ties by ID) and truncated to
    /// `limit`. Stored fingerprints that cannot be parsed are skipped.
    fn find_within_distance(
        &self,
        target: u64,
        max_distance: u32,
        source_project: Option<&str>,
        limit: usize,
    ) -> Vec<(FingerprintRecord, u32)>;

    /// Looks up a record by exact content hash.
    ///
    /// A matching record is returned even if its stored fingerprint is
    /// unreadable.
    fn exact_match(&self, content_hash: &str, source_project: Option<&str>)
    -> Option<FingerprintRecord>;

    /// Deletes records with `created_at` strictly before `cutoff`.
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails; nothing is deleted in that case.
    fn prune_created_before(&self, cutoff: u64) -> Result<u64>;

    /// Deletes records created more than `days` days ago.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails; nothing is deleted in that case.
    fn prune_older_than(&self, days: u32) -> Result<u64> {
        self.prune_created_before(retention_cutoff(current_timestamp(), days))
    }

    /// Deletes one record.
    ///
    /// Returns `false` if no record has that ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    fn delete(&self, id: RecordId) -> Result<bool>;

    /// Deletes all records, or all records of one project.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails; nothing is deleted in that case.
    fn clear(&self, source_project: Option<&str>) -> Result<u64>;

    /// Returns aggregate statistics.
    fn statistics(&self, source_project: Option<&str>) -> FingerprintStatistics;
}
