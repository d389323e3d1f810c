//! Shared `SQLite` infrastructure for the fingerprint store.
//!
//! ## Module Structure
//!
//! - [`connection`]: Connection handling ([`Mutex<Connection>`](rusqlite::Connection), lock acquisition, pragmas)
//! - [`fingerprint_row`]: Row conversion for [`FingerprintRecord`](crate::models::FingerprintRecord)
//! - [`metrics`]: Operation metrics recording

mod connection;
mod fingerprint_row;
mod metrics;

pub use connection::{acquire_lock, configure_connection};
pub use fingerprint_row::{
    FINGERPRINT_COLUMNS, FingerprintRow, from_db_count, from_db_timestamp, to_db_timestamp,
};
pub use metrics::record_operation_metrics;
