//! Check CLI command.

#![allow(clippy::print_stdout)]

use crate::services::{DeduplicationService, DuplicateCheckResult};
use crate::storage::FingerprintStore;
use crate::{Error, Result};

/// Checks `text` and prints the result as pretty JSON.
///
/// # Errors
///
/// Returns an error only if the result cannot be serialized.
pub fn execute<S: FingerprintStore + ?Sized>(
    service: &DeduplicationService<S>,
    text: &str,
    project: Option<&str>,
) -> Result<DuplicateCheckResult> {
    let result = service.check_duplicate(text, project);

    let json = serde_json::to_string_pretty(&result).map_err(|e| Error::OperationFailed {
        operation: "serialize_check_result".to_string(),
        cause: e.to_string(),
    })?;
    println!("{json}");

    Ok(result)
}
