//! Garbage collection module.
//!
//! Fingerprints only matter while the content they describe could still be
//! regenerated. The retention collector removes fingerprints older than the
//! configured window so the store (and the linear duplicate scan over it)
//! stays bounded.
//!
//! # Example
//!
//! ```rust,ignore
//! use simdup::gc::{RetentionConfig, RetentionGarbageCollector};
//!
//! // Window normally comes from `DeduplicationConfig::retention_days`
//! let config = RetentionConfig::new(180);
//!
//! let gc = RetentionGarbageCollector::new(store, config);
//! let result = gc.gc_expired_fingerprints()?;
//! println!("Pruned {} fingerprints", result.fingerprints_pruned);
//! ```

mod retention;

pub use retention::{RetentionConfig, RetentionGarbageCollector, RetentionGcResult};
