//! Prune CLI command.

#![allow(clippy::print_stdout)]

use crate::Result;
use crate::gc::{RetentionConfig, RetentionGarbageCollector, RetentionGcResult};
use crate::storage::FingerprintStore;
use std::sync::Arc;

/// Deletes fingerprints older than `days`.
///
/// # Errors
///
/// Returns an error if the store deletion fails.
pub fn execute<S: FingerprintStore + ?Sized>(store: Arc<S>, days: u32) -> Result<RetentionGcResult> {
    let gc = RetentionGarbageCollector::new(store, RetentionConfig::new(days));
    let result = gc.gc_expired_fingerprints()?;
    println!("{}", result.summary());
    Ok(result)
}
