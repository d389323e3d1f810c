//! Deduplication service orchestrator.
//!
//! Coordinates the two-tier duplicate check:
//! 1. **Exact match**: SHA256 content hash lookup
//! 2. **Near duplicate**: SimHash fingerprints within `max_distance` bits
//!
//! Uses short-circuit evaluation, returning on first duplicate match.

use crate::models::{FingerprintStatistics, NewFingerprint};
use crate::simhash::SimHashEngine;
use crate::storage::FingerprintStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

use super::config::DeduplicationConfig;
use super::hasher::ContentHasher;
use super::types::{Deduplicator, DuplicateCheckResult};

/// Service for deduplication checking.
///
/// Holds the fingerprint store and decides whether candidate text duplicates
/// something already accepted. The check and the commit are separate calls:
/// callers check a candidate, decide, and only then record it with
/// [`add_content_fingerprint`](Self::add_content_fingerprint).
///
/// # Example
///
/// ```rust,ignore
/// use simdup::services::deduplication::{DeduplicationConfig, DeduplicationService};
/// use simdup::storage::InMemoryFingerprintStore;
/// use std::sync::Arc;
///
/// let store = Arc::new(InMemoryFingerprintStore::new());
/// let service = DeduplicationService::new(store, DeduplicationConfig::default());
///
/// let result = service.check_duplicate("本季度销售额同比增长", Some("report"));
/// if !result.is_duplicate {
///     service.add_content_fingerprint("本季度销售额同比增长", "report", "out/q3.docx");
/// }
/// ```
pub struct DeduplicationService<S: FingerprintStore + ?Sized> {
    /// Fingerprint store.
    store: Arc<S>,
    /// Configuration.
    config: DeduplicationConfig,
    /// Fingerprinting engine.
    engine: SimHashEngine,
}

impl<S: FingerprintStore + ?Sized> DeduplicationService<S> {
    /// Creates a new deduplication service over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, config: DeduplicationConfig) -> Self {
        Self {
            store,
            config,
            engine: SimHashEngine::new(),
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &DeduplicationConfig {
        &self.config
    }

    /// Replaces the configuration.
    pub fn set_config(&mut self, config: DeduplicationConfig) {
        self.config = config;
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns true if deduplication is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Computes the SimHash fingerprint and exact content hash of `text`.
    #[must_use]
    pub fn calculate_content_fingerprint(&self, text: &str) -> (u64, String) {
        (self.engine.fingerprint(text), ContentHasher::hash(text))
    }

    /// Checks if content is a duplicate.
    ///
    /// Performs checks in order: exact match → near duplicate.
    /// Returns early on first match (short-circuit evaluation). Store
    /// failures are logged by the store and read as "no match".
    #[allow(clippy::cast_possible_truncation)] // Duration in ms won't exceed u64::MAX
    #[instrument(
        skip_all,
        fields(
            operation = "dedup_check",
            project = ?source_project,
            content_length = content.len()
        )
    )]
    pub fn check_duplicate(
        &self,
        content: &str,
        source_project: Option<&str>,
    ) -> DuplicateCheckResult {
        let start = Instant::now();

        if !self.config.enabled {
            tracing::debug!("Deduplication disabled, skipping check");
            return DuplicateCheckResult::not_duplicate(start.elapsed().as_millis() as u64);
        }

        let (fingerprint, content_hash) = self.calculate_content_fingerprint(content);
        let project = self.config.effective_project(source_project);

        // 1. Exact match (indexed)
        if let Some(record) = self.store.exact_match(&content_hash, project) {
            let duration_ms = start.elapsed().as_millis() as u64;
            tracing::info!(
                record_id = %record.id,
                duration_ms,
                "Exact match duplicate found"
            );
            let result = DuplicateCheckResult::exact_match(record, duration_ms);
            Self::record_check_metrics(&result);
            return result;
        }

        // 2. Nearest fingerprint within the threshold
        let max_distance = u32::from(self.config.max_distance);
        if let Some((record, distance)) = self
            .store
            .find_within_distance(fingerprint, max_distance, project, 1)
            .into_iter()
            .next()
        {
            let duration_ms = start.elapsed().as_millis() as u64;
            tracing::info!(
                record_id = %record.id,
                distance,
                max_distance,
                duration_ms,
                "Near-duplicate found"
            );
            let result = DuplicateCheckResult::near_duplicate(record, distance, duration_ms);
            Self::record_check_metrics(&result);
            return result;
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(fingerprint, duration_ms, "No duplicate found");
        let result = DuplicateCheckResult::not_duplicate(duration_ms);
        Self::record_check_metrics(&result);
        result
    }

    /// Checks several candidates against the store.
    ///
    /// Each text is checked independently; texts in the same batch are not
    /// compared with each other.
    #[must_use]
    pub fn batch_check_duplicates(
        &self,
        contents: &[&str],
        source_project: Option<&str>,
    ) -> Vec<DuplicateCheckResult> {
        let results: Vec<DuplicateCheckResult> = contents
            .iter()
            .map(|content| self.check_duplicate(content, source_project))
            .collect();

        tracing::info!(
            total = results.len(),
            duplicates = results.iter().filter(|r| r.is_duplicate).count(),
            "Batch duplicate check completed"
        );
        results
    }

    /// Records final metrics for a completed check.
    #[allow(clippy::cast_precision_loss)]
    fn record_check_metrics(result: &DuplicateCheckResult) {
        let outcome = if result.is_duplicate {
            "duplicate"
        } else {
            "unique"
        };
        metrics::counter!("deduplication_checks_total", "result" => outcome).increment(1);
        if let Some(reason) = result.reason {
            metrics::counter!("deduplication_duplicates_total", "reason" => reason.as_str())
                .increment(1);
        }
        metrics::histogram!("deduplication_check_duration_ms")
            .record(result.check_duration_ms as f64);
    }

    /// Records accepted content in the store.
    ///
    /// The record is labelled with `source_project`, or the configured
    /// project when that is empty. Errors are logged and reported as `false`.
    #[instrument(
        skip_all,
        fields(operation = "add_fingerprint", project = %source_project, path = %document_path)
    )]
    pub fn add_content_fingerprint(
        &self,
        content: &str,
        source_project: &str,
        document_path: &str,
    ) -> bool {
        let (fingerprint, content_hash) = self.calculate_content_fingerprint(content);
        let entry = NewFingerprint::new(fingerprint, content_hash)
            .with_preview(content)
            .with_project(self.config.record_project(source_project))
            .with_document_path(document_path)
            .with_word_count(content.chars().count() as u64);

        match self.store.insert(entry) {
            Ok(record) => {
                tracing::debug!(record_id = %record.id, fingerprint, "Recorded content fingerprint");
                true
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to record content fingerprint");
                false
            },
        }
    }

    /// Removes fingerprints older than the retention window.
    ///
    /// Returns the number of records removed; 0 on failure.
    #[instrument(skip(self), fields(operation = "clean_old_fingerprints"))]
    pub fn clean_old_fingerprints(&self) -> u64 {
        match self.store.prune_older_than(self.config.retention_days) {
            Ok(deleted) => {
                metrics::counter!("gc_fingerprints_pruned_total").increment(deleted);
                deleted
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to prune old fingerprints");
                0
            },
        }
    }

    /// Returns store statistics, optionally for one project.
    #[must_use]
    pub fn get_statistics(&self, source_project: Option<&str>) -> FingerprintStatistics {
        self.store.statistics(source_project)
    }

    /// Deletes all fingerprints, or those of one project.
    ///
    /// Returns the number of records removed; 0 on failure.
    #[instrument(skip_all, fields(operation = "clear_fingerprints", project = ?source_project))]
    pub fn clear_all_fingerprints(&self, source_project: Option<&str>) -> u64 {
        self.store.clear(source_project).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to clear fingerprints");
            0
        })
    }
}

/// Implementation of the Deduplicator trait.
impl<S: FingerprintStore + ?Sized> Deduplicator for DeduplicationService<S> {
    fn check_duplicate(&self, content: &str, source_project: Option<&str>) -> DuplicateCheckResult {
        Self::check_duplicate(self, content, source_project)
    }

    fn add_content_fingerprint(
        &self,
        content: &str,
        source_project: &str,
        document_path: &str,
    ) -> bool {
        Self::add_content_fingerprint(self, content, source_project, document_path)
    }

    fn max_retries(&self) -> u32 {
        self.config.max_retries
    }
}
