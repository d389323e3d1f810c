//! Clear CLI command.

#![allow(clippy::print_stdout)]

use crate::services::DeduplicationService;
use crate::storage::FingerprintStore;
use crate::{Error, Result};

/// Deletes every fingerprint, or every fingerprint of `project`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] unless `confirmed` is set.
pub fn execute<S: FingerprintStore + ?Sized>(
    service: &DeduplicationService<S>,
    project: Option<&str>,
    confirmed: bool,
) -> Result<u64> {
    if !confirmed {
        return Err(Error::InvalidInput(
            "clear is irreversible; pass --yes to confirm".to_string(),
        ));
    }

    let deleted = service.clear_all_fingerprints(project);
    match project {
        Some(project) => println!("Cleared {deleted} fingerprints from project '{project}'"),
        None => println!("Cleared {deleted} fingerprints"),
    }
    Ok(deleted)
}
