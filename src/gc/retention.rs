//! Retention policy garbage collector implementation.
//!
//! Removes fingerprints that are older than the retention window.
//!
//! # Configuration
//!
//! The window is `DeduplicationConfig::retention_days`, set via:
//! - Environment variable: `SIMDUP_RETENTION_DAYS` (default: 180)
//! - Config file: `[dedup] retention_days = 180`
//!
//! # Example
//!
//! ```rust,ignore
//! use simdup::gc::{RetentionConfig, RetentionGarbageCollector};
//! use simdup::storage::SqliteFingerprintStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteFingerprintStore::new("fingerprints.db")?);
//! let gc = RetentionGarbageCollector::new(store, RetentionConfig::new(180));
//!
//! let result = gc.gc_expired_fingerprints()?;
//! println!("{}", result.summary());
//! ```

use crate::Result;
use crate::services::deduplication::DEFAULT_RETENTION_DAYS;
use crate::storage::FingerprintStore;
use crate::storage::fingerprint::retention_cutoff;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Safely converts Duration to milliseconds as u64, capping at `u64::MAX`.
#[inline]
fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Converts u64 to f64 for metrics, capping at `u32::MAX`.
#[inline]
fn u64_to_f64(value: u64) -> f64 {
    let capped = u32::try_from(value).unwrap_or(u32::MAX);
    f64::from(capped)
}

/// Retention policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionConfig {
    /// Retention period in days.
    pub days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl RetentionConfig {
    /// Creates a retention config with an explicit window.
    #[must_use]
    pub const fn new(days: u32) -> Self {
        Self { days }
    }

    /// Returns the cutoff timestamp for expired fingerprints.
    ///
    /// Fingerprints with `created_at` before this timestamp are expired.
    #[must_use]
    pub fn cutoff_timestamp(&self) -> u64 {
        retention_cutoff(crate::current_timestamp(), self.days)
    }
}

/// Result of a retention garbage collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionGcResult {
    /// Retention window applied.
    pub retention_days: u32,

    /// `created_at` cutoff used.
    pub cutoff: u64,

    /// Number of fingerprints removed.
    pub fingerprints_pruned: u64,

    /// Fingerprints left in the store.
    pub fingerprints_remaining: u64,

    /// Duration of the GC operation in milliseconds.
    pub duration_ms: u64,
}

impl RetentionGcResult {
    /// Returns `true` if any fingerprints were removed.
    #[must_use]
    pub const fn has_pruned(&self) -> bool {
        self.fingerprints_pruned > 0
    }

    /// Returns a human-readable summary of the GC result.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.fingerprints_pruned == 0 {
            format!(
                "No fingerprints older than {} days ({} remaining, {}ms)",
                self.retention_days, self.fingerprints_remaining, self.duration_ms
            )
        } else {
            format!(
                "Pruned {} fingerprints older than {} days ({} remaining, {}ms)",
                self.fingerprints_pruned,
                self.retention_days,
                self.fingerprints_remaining,
                self.duration_ms
            )
        }
    }
}

/// Garbage collector for fingerprints outside the retention window.
///
/// # Thread Safety
///
/// The garbage collector holds an `Arc` reference to the store, making it
/// safe to share across threads.
pub struct RetentionGarbageCollector<S: FingerprintStore + ?Sized> {
    /// Store to prune.
    store: Arc<S>,

    /// Retention policy configuration.
    config: RetentionConfig,
}

impl<S: FingerprintStore + ?Sized> RetentionGarbageCollector<S> {
    /// Creates a new retention garbage collector.
    #[must_use]
    pub const fn new(store: Arc<S>, config: RetentionConfig) -> Self {
        Self { store, config }
    }

    /// Deletes fingerprints older than the retention window.
    ///
    /// Running it twice in a row removes nothing the second time.
    ///
    /// # Errors
    ///
    /// Returns an error if the store deletion fails; nothing is removed then.
    #[instrument(
        name = "simdup.gc.retention",
        skip(self),
        fields(component = "gc", operation = "retention", retention_days = self.config.days)
    )]
    pub fn gc_expired_fingerprints(&self) -> Result<RetentionGcResult> {
        let start = Instant::now();
        let cutoff = self.config.cutoff_timestamp();
        let pruned = self.store.prune_created_before(cutoff)?;
        let remaining = self.store.statistics(None).total_count;

        let result = RetentionGcResult {
            retention_days: self.config.days,
            cutoff,
            fingerprints_pruned: pruned,
            fingerprints_remaining: remaining,
            duration_ms: duration_to_millis(start.elapsed()),
        };

        metrics::counter!("gc_retention_runs_total").increment(1);
        metrics::counter!("gc_fingerprints_pruned_total").increment(pruned);
        metrics::histogram!("gc_retention_duration_ms").record(u64_to_f64(result.duration_ms));

        info!(
            fingerprints_pruned = result.fingerprints_pruned,
            fingerprints_remaining = result.fingerprints_remaining,
            duration_ms = result.duration_ms,
            "Retention GC completed"
        );

        Ok(result)
    }
}
