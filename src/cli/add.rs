//! Add CLI command.

#![allow(clippy::print_stdout)]

use crate::services::DeduplicationService;
use crate::storage::FingerprintStore;
use crate::{Error, Result};

/// Records the fingerprint of `text`.
///
/// An empty `project` records under the configured project name.
///
/// # Errors
///
/// Returns an error if the store rejected the record.
pub fn execute<S: FingerprintStore + ?Sized>(
    service: &DeduplicationService<S>,
    text: &str,
    project: Option<&str>,
    document_path: Option<&str>,
) -> Result<u64> {
    let project = project.unwrap_or_default();
    if !service.add_content_fingerprint(text, project, document_path.unwrap_or_default()) {
        return Err(Error::OperationFailed {
            operation: "add_fingerprint".to_string(),
            cause: "store rejected the record; see logs".to_string(),
        });
    }

    let (fingerprint, content_hash) = service.calculate_content_fingerprint(text);
    println!(
        "Recorded fingerprint {fingerprint:016x} (sha256 {}) in project '{}'",
        &content_hash[..12],
        service.config().record_project(project)
    );

    Ok(fingerprint)
}
