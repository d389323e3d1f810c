//! Fingerprint records and identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of characters kept in a record preview.
pub const PREVIEW_MAX_CHARS: usize = 200;

/// Identifier assigned to a fingerprint record by its store.
///
/// Identifiers increase monotonically within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Creates a record ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// One persisted fingerprint, written when a document is accepted.
///
/// Records are immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// 64-bit SimHash of the document text.
    pub fingerprint: u64,
    /// SHA-256 hex digest of the exact document text.
    pub content_hash: String,
    /// Truncated copy of the text for inspection; never used for matching.
    pub preview: String,
    /// Partition label; empty means no partition.
    pub source_project: String,
    /// Caller-supplied provenance (e.g. output path).
    pub document_path: String,
    /// Character count of the text.
    pub word_count: u64,
    /// Insertion time (Unix epoch seconds).
    pub created_at: u64,
}

impl FingerprintRecord {
    /// Returns whether this record belongs to `project`.
    ///
    /// `None` matches every record.
    #[must_use]
    pub fn in_project(&self, project: Option<&str>) -> bool {
        project.is_none_or(|p| self.source_project == p)
    }
}

/// Insert payload for a fingerprint store.
///
/// The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewFingerprint {
    /// 64-bit SimHash of the document text.
    pub fingerprint: u64,
    /// SHA-256 hex digest of the exact document text.
    pub content_hash: String,
    /// Preview text; stores truncate it to [`PREVIEW_MAX_CHARS`].
    pub preview: String,
    /// Partition label.
    pub source_project: String,
    /// Provenance string.
    pub document_path: String,
    /// Character count of the text.
    pub word_count: u64,
}

impl NewFingerprint {
    /// Creates a payload with the required hash fields.
    #[must_use]
    pub fn new(fingerprint: u64, content_hash: impl Into<String>) -> Self {
        Self {
            fingerprint,
            content_hash: content_hash.into(),
            ..Self::default()
        }
    }

    /// Sets the preview.
    #[must_use]
    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = preview.into();
        self
    }

    /// Sets the partition label.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.source_project = project.into();
        self
    }

    /// Sets the document path.
    #[must_use]
    pub fn with_document_path(mut self, path: impl Into<String>) -> Self {
        self.document_path = path.into();
        self
    }

    /// Sets the word count.
    #[must_use]
    pub const fn with_word_count(mut self, word_count: u64) -> Self {
        self.word_count = word_count;
        self
    }

    /// Turns the payload into a record with the given identity.
    ///
    /// The preview is truncated to [`PREVIEW_MAX_CHARS`] characters.
    #[must_use]
    pub fn into_record(self, id: RecordId, created_at: u64) -> FingerprintRecord {
        FingerprintRecord {
            id,
            fingerprint: self.fingerprint,
            content_hash: self.content_hash,
            preview: truncate_preview(&self.preview),
            source_project: self.source_project,
            document_path: self.document_path,
            word_count: self.word_count,
            created_at,
        }
    }
}

/// Truncates text to at most [`PREVIEW_MAX_CHARS`] characters.
///
/// Cuts on character boundaries, never inside a multi-byte sequence.
#[must_use]
pub fn truncate_preview(text: &str) -> String {
    text.chars().take(PREVIEW_MAX_CHARS).collect()
}
