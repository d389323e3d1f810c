//! Shared connection handling for `SQLite` backends.
//!
//! Utilities for managing `SQLite` connections with mutex poison recovery and
//! the pragmas the fingerprint store relies on.

use crate::Result;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Acquires a mutex lock with poison recovery.
///
/// If the mutex is poisoned (a previous holder panicked), the inner value is
/// recovered and a warning logged. `SQLite` rolls back any transaction that the
/// panicking holder left open, so the connection is still usable.
///
/// # Examples
///
/// ```ignore
/// use std::sync::Mutex;
/// use simdup::storage::sqlite::acquire_lock;
///
/// let mutex = Mutex::new(connection);
/// let guard = acquire_lock(&mutex);
/// ```
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a `SQLite` connection for the fingerprint store.
///
/// # Configuration Applied
///
/// - **WAL mode**: concurrent readers alongside the single writer
/// - **NORMAL synchronous**: durable at transaction boundaries in WAL mode
/// - **`busy_timeout`**: 5 seconds, so a second process sharing the file waits
///   instead of failing with `SQLITE_BUSY`
///
/// # Errors
///
/// Currently infallible; pragma failures (e.g. WAL on an in-memory database)
/// are ignored and the connection keeps its defaults.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // journal_mode returns a row ("wal"/"memory"), which execute_batch rejects
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", "5000");

    Ok(())
}
