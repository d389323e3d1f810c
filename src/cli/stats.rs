//! Stats CLI command.

#![allow(clippy::print_stdout)]

use crate::models::FingerprintStatistics;
use crate::services::DeduplicationService;
use crate::storage::FingerprintStore;
use crate::{Error, Result};

/// Prints store statistics as text or JSON.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn execute<S: FingerprintStore + ?Sized>(
    service: &DeduplicationService<S>,
    project: Option<&str>,
    json: bool,
) -> Result<FingerprintStatistics> {
    let stats = service.get_statistics(project);

    if json {
        let rendered =
            serde_json::to_string_pretty(&stats).map_err(|e| Error::OperationFailed {
                operation: "serialize_statistics".to_string(),
                cause: e.to_string(),
            })?;
        println!("{rendered}");
    } else {
        if let Some(project) = project {
            println!("Project: {project}");
        }
        print!("{stats}");
    }

    Ok(stats)
}
