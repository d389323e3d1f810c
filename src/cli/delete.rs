//! Delete CLI command for removing single fingerprints.
//!
//! # Usage
//!
//! ```bash
//! simdup delete 17
//! simdup delete 17 18 42
//! ```

#![allow(clippy::print_stdout)]

use crate::Result;
use crate::models::RecordId;
use crate::storage::FingerprintStore;

/// Result of a delete operation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeleteResult {
    /// Record ids that were deleted.
    pub deleted_ids: Vec<i64>,
    /// Record ids that did not exist.
    pub not_found_ids: Vec<i64>,
}

/// Executes the delete command.
///
/// # Errors
///
/// Returns the first storage error; ids before it stay deleted.
pub fn execute<S: FingerprintStore + ?Sized>(store: &S, ids: &[i64]) -> Result<DeleteResult> {
    let mut result = DeleteResult::default();

    for &id in ids {
        if store.delete(RecordId::new(id))? {
            result.deleted_ids.push(id);
        } else {
            result.not_found_ids.push(id);
        }
    }

    if !result.not_found_ids.is_empty() {
        println!("Not found ({}):", result.not_found_ids.len());
        for id in &result.not_found_ids {
            println!("  - {id}");
        }
    }
    println!("Deleted {} fingerprints", result.deleted_ids.len());

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewFingerprint;
    use crate::storage::InMemoryFingerprintStore;

    #[test]
    fn test_delete_splits_found_and_missing() {
        let store = InMemoryFingerprintStore::new();
        let record = store.insert(NewFingerprint::new(7, "h")).unwrap();

        let result = execute(&store, &[record.id.get(), 999]).unwrap();
        assert_eq!(result.deleted_ids, vec![record.id.get()]);
        assert_eq!(result.not_found_ids, vec![999]);
        assert!(store.is_empty());
    }
}
