//! Config CLI command.

#![allow(clippy::print_stdout)]

use crate::config::SimdupConfig;
use crate::storage::SqliteFingerprintStore;

/// Prints the effective configuration as TOML.
pub fn execute(config: &SimdupConfig) {
    print!("{}", config.to_toml());
    if config.db_path.is_none() {
        if let Some(path) = SqliteFingerprintStore::default_path() {
            println!("# default db_path resolves to {}", path.display());
        }
    }
}
