//! Deduplication service for generated documents.
//!
//! This module provides two-tier duplicate checking:
//! 1. **Exact match**: SHA256 hash of the exact text, looked up by index
//! 2. **Near duplicate**: 64-bit SimHash fingerprints compared by Hamming distance
//!
//! The service implements short-circuit evaluation, exiting early on first match.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                  DeduplicationService                     │
//! │  ┌──────────────────┐   ┌──────────────────────────────┐  │
//! │  │ ContentHasher    │   │ SimHashEngine                │  │
//! │  │ SHA256 hex       │   │ 2/3-gram fingerprint         │  │
//! │  └────────┬─────────┘   └──────────────┬───────────────┘  │
//! │           │ exact_match                │ find_within_     │
//! │           ▼                            ▼ distance         │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │ FingerprintStore (SQLite / in-memory)               │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use simdup::services::deduplication::{DeduplicationService, DeduplicationConfig};
//!
//! let config = DeduplicationConfig::configure(true, 0.90, 10, 180, false, "default")?;
//! let service = DeduplicationService::new(store, config);
//!
//! let result = service.check_duplicate(&candidate, Some("campaign-a"));
//! if result.is_duplicate {
//!     println!("Regenerating: {:?}", result.reason);
//! }
//! ```

mod config;
mod hasher;
mod service;
mod types;

pub use config::{
    DEFAULT_MAX_RETRIES, DEFAULT_PROJECT_NAME, DEFAULT_RETENTION_DAYS,
    DEFAULT_SIMILARITY_THRESHOLD, DeduplicationConfig, validate_threshold,
};
pub(crate) use config::env_bool;
pub use hasher::ContentHasher;
pub use service::DeduplicationService;
pub use types::{Deduplicator, DuplicateCheckResult, DuplicateReason, MatchedRecord};
