//! Deduplication result types.
//!
//! This module defines the result types returned by deduplication checks and
//! the [`Deduplicator`] trait consumed by the generation loop.

use crate::models::{FingerprintRecord, RecordId};
use crate::simhash::distance_to_similarity;
use serde::{Deserialize, Serialize};

/// Summary of the stored record a candidate collided with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRecord {
    /// ID of the matched record.
    pub record_id: RecordId,
    /// When the matched record was stored (Unix epoch seconds).
    pub created_at: u64,
    /// Partition of the matched record.
    pub source_project: String,
    /// Provenance of the matched record.
    pub document_path: String,
    /// Preview of the matched record.
    pub preview: String,
}

impl From<FingerprintRecord> for MatchedRecord {
    fn from(record: FingerprintRecord) -> Self {
        Self {
            record_id: record.id,
            created_at: record.created_at,
            source_project: record.source_project,
            document_path: record.document_path,
            preview: record.preview,
        }
    }
}

/// Result of a deduplication check.
///
/// Contains information about whether content was found to be a duplicate,
/// the reason for duplication, and the record it matched.
///
/// # Example
///
/// ```rust
/// use simdup::services::deduplication::{DuplicateCheckResult, DuplicateReason};
///
/// let result = DuplicateCheckResult::not_duplicate(3);
/// assert!(!result.is_duplicate);
/// assert_eq!(result.reason, None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCheckResult {
    /// Whether the content is a duplicate.
    pub is_duplicate: bool,

    /// The reason content was identified as a duplicate.
    pub reason: Option<DuplicateReason>,

    /// The stored record that was matched.
    ///
    /// Always populated when `is_duplicate == true`.
    pub matched: Option<MatchedRecord>,

    /// Hamming distance to the matched record (0 for exact matches).
    pub hamming_distance: Option<u32>,

    /// Similarity to the matched record in percent (0.0 to 100.0).
    pub similarity_percent: Option<f64>,

    /// Duration of the deduplication check in milliseconds.
    pub check_duration_ms: u64,
}

impl DuplicateCheckResult {
    /// Creates a result indicating no duplicate was found.
    #[must_use]
    pub const fn not_duplicate(duration_ms: u64) -> Self {
        Self {
            is_duplicate: false,
            reason: None,
            matched: None,
            hamming_distance: None,
            similarity_percent: None,
            check_duration_ms: duration_ms,
        }
    }

    /// Creates a result for an identical content hash.
    ///
    /// Distance is reported as 0 and similarity as 100%.
    #[must_use]
    pub fn exact_match(record: FingerprintRecord, duration_ms: u64) -> Self {
        Self {
            is_duplicate: true,
            reason: Some(DuplicateReason::ExactMatch),
            matched: Some(record.into()),
            hamming_distance: Some(0),
            similarity_percent: Some(100.0),
            check_duration_ms: duration_ms,
        }
    }

    /// Creates a result for a fingerprint within the distance threshold.
    #[must_use]
    pub fn near_duplicate(record: FingerprintRecord, distance: u32, duration_ms: u64) -> Self {
        Self {
            is_duplicate: true,
            reason: Some(DuplicateReason::NearDuplicate),
            matched: Some(record.into()),
            hamming_distance: Some(distance),
            similarity_percent: Some(distance_to_similarity(distance) * 100.0),
            check_duration_ms: duration_ms,
        }
    }
}

impl Default for DuplicateCheckResult {
    fn default() -> Self {
        Self::not_duplicate(0)
    }
}

/// The reason content was identified as a duplicate.
///
/// # Variants
///
/// - `ExactMatch`: Content hash matches an existing record exactly
/// - `NearDuplicate`: Fingerprint lies within the configured Hamming distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateReason {
    /// Content hash matches exactly (SHA256).
    ExactMatch,

    /// SimHash fingerprint within the distance threshold.
    NearDuplicate,
}

impl DuplicateReason {
    /// Returns the reason as a metrics/log label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExactMatch => "exact_match",
            Self::NearDuplicate => "near_duplicate",
        }
    }
}

impl std::fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for deduplication checking.
///
/// Allows for different implementations (e.g., scripted fakes for testing the
/// generation loop).
pub trait Deduplicator: Send + Sync {
    /// Checks if content duplicates something already stored.
    ///
    /// Never fails: storage problems are reported as "not a duplicate".
    fn check_duplicate(&self, content: &str, source_project: Option<&str>)
    -> DuplicateCheckResult;

    /// Records accepted content so later checks can see it.
    ///
    /// Returns `false` if the record could not be written.
    fn add_content_fingerprint(
        &self,
        content: &str,
        source_project: &str,
        document_path: &str,
    ) -> bool;

    /// Regeneration attempts allowed per document.
    fn max_retries(&self) -> u32;
}
