//! Storage layer for fingerprint records.
//!
//! - [`traits`]: the [`FingerprintStore`] contract
//! - [`fingerprint`]: `SQLite` and in-memory implementations
//! - [`migrations`]: versioned schema for the `SQLite` store
//! - [`sqlite`]: shared `SQLite` helpers (locking, row mapping, metrics)

// Allow significant_drop_tightening - dropping database connections slightly early
// provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]
// Row counts never approach u64::MAX.
#![allow(clippy::cast_possible_truncation)]

pub mod fingerprint;
pub mod migrations;
pub mod sqlite;
pub mod traits;

pub use fingerprint::{InMemoryFingerprintStore, SqliteFingerprintStore};
pub use traits::FingerprintStore;
