//! CLI command implementations.
//!
//! Each submodule implements one `simdup` subcommand on top of the library
//! services. Argument parsing lives in the binary; these functions take
//! already-parsed values, print their output and return what they did.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `check` | Check text against stored fingerprints, print the result as JSON |
//! | `add` | Record the fingerprint of accepted text |
//! | `stats` | Show store statistics |
//! | `prune` | Delete fingerprints outside the retention window |
//! | `delete` | Delete fingerprints by record id |
//! | `clear` | Delete all fingerprints, or one project's |
//! | `generate` | Run the retry loop over a candidate pool |
//! | `config` | Print the effective configuration |
//!
//! # Example Usage
//!
//! ```bash
//! simdup add --project campaign-a --path out/001.txt "first generated body"
//! simdup check --project campaign-a "first generated body!"
//! simdup generate --pool pool.txt --count 20 --output-dir out/ --seed 7
//! simdup prune --days 90
//! ```

pub mod add;
pub mod check;
pub mod clear;
pub mod config;
pub mod delete;
pub mod generate;
pub mod prune;
pub mod stats;

pub use delete::DeleteResult;
pub use generate::{FileSink, GenerateArgs, PoolSource, load_pool};

use crate::config::SimdupConfig;
use crate::storage::SqliteFingerprintStore;
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;

/// Opens the fingerprint database named by the config, or the default one.
///
/// # Errors
///
/// Returns an error if no path can be resolved or the database cannot be
/// opened and migrated.
pub fn open_store(config: &SimdupConfig) -> Result<Arc<SqliteFingerprintStore>> {
    let path = match &config.db_path {
        Some(path) => path.clone(),
        None => SqliteFingerprintStore::default_path().ok_or_else(|| Error::OperationFailed {
            operation: "resolve_db_path".to_string(),
            cause: "no home directory; pass --db".to_string(),
        })?,
    };

    tracing::debug!(path = %path.display(), "Opening fingerprint store");
    SqliteFingerprintStore::new(&path).map(Arc::new)
}

/// Resolves command input from `--file` or the positional text.
///
/// # Errors
///
/// Returns an error if the file cannot be read or neither source was given.
pub fn read_input(text: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(file) = file {
        return std::fs::read_to_string(file).map_err(|e| Error::OperationFailed {
            operation: "read_input_file".to_string(),
            cause: format!("{}: {e}", file.display()),
        });
    }

    text.ok_or_else(|| Error::InvalidInput("provide TEXT or --file".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_input_prefers_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "from file").unwrap();

        let input = read_input(Some("inline".to_string()), Some(file.path())).unwrap();
        assert_eq!(input, "from file");
    }

    #[test]
    fn test_read_input_inline_and_missing() {
        assert_eq!(read_input(Some("inline".to_string()), None).unwrap(), "inline");
        assert!(matches!(read_input(None, None), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_open_store_with_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = SimdupConfig::new().with_db_path(dir.path().join("nested").join("fp.db"));

        let store = open_store(&config).unwrap();
        assert_eq!(store.db_path(), Some(dir.path().join("nested").join("fp.db").as_path()));
    }
}
