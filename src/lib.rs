//! # Simdup
//!
//! Near-duplicate content detection for generated documents.
//!
//! Simdup fingerprints text with a 64-bit SimHash, remembers the fingerprints
//! of every accepted document in a persistent store, and rejects new candidates
//! that land within a configured Hamming distance of something already produced.
//!
//! ## Features
//!
//! - Language-agnostic SimHash over 2/3-character n-grams (works for CJK text)
//! - Exact-match short-circuit through a SHA-256 content hash
//! - Pluggable fingerprint stores (`SQLite`, in-memory)
//! - Project-scoped or cross-project duplicate search
//! - Bounded retry loop for generation pipelines
//! - Retention-window pruning of old fingerprints
//!
//! ## Example
//!
//! ```rust,ignore
//! use simdup::services::deduplication::{DeduplicationConfig, DeduplicationService};
//! use simdup::storage::SqliteFingerprintStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteFingerprintStore::new("fingerprints.db")?);
//! let service = DeduplicationService::new(store, DeduplicationConfig::default());
//!
//! let result = service.check_duplicate("generated body text", Some("campaign-a"));
//! if !result.is_duplicate {
//!     service.add_content_fingerprint("generated body text", "campaign-a", "out/001.docx");
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod gc;
pub mod models;
pub mod observability;
pub mod services;
pub mod simhash;
pub mod storage;

pub use config::SimdupConfig;
pub use models::{FingerprintRecord, FingerprintStatistics, NewFingerprint, RecordId};
pub use services::{
    BatchReport, CancellationToken, DeduplicationConfig, DeduplicationService, Deduplicator,
    DuplicateCheckResult, GenerationLoop,
};
pub use simhash::SimHashEngine;
pub use storage::{FingerprintStore, InMemoryFingerprintStore, SqliteFingerprintStore};

/// Error type for simdup operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Out-of-range thresholds, unreadable candidate pools, bad CLI arguments |
/// | `OperationFailed` | `SQLite` errors, migration failures, filesystem I/O |
/// | `Cancelled` | A generation run observed its cancellation token |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A similarity threshold lies outside `[0.0, 1.0]`
    /// - A configuration file contains an unusable value
    /// - A candidate pool is empty
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` statements or transactions fail (the transaction is rolled back)
    /// - Schema migrations cannot be applied
    /// - Filesystem I/O errors occur while reading config or writing documents
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The operation was cancelled cooperatively.
    #[error("operation cancelled")]
    Cancelled,
}

/// Result type alias for simdup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
///
/// # Examples
///
/// ```rust
/// use simdup::current_timestamp;
///
/// assert!(current_timestamp() > 0);
/// ```
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
