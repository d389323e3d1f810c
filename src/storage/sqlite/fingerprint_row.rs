//! Row conversion for the `content_fingerprints` table.
//!
//! The fingerprint column is stored as a decimal string so the full unsigned
//! 64-bit range survives `SQLite`'s signed integers. Conversion back to a
//! [`FingerprintRecord`] is fallible: a row whose fingerprint does not parse
//! is reported as `None` and skipped by distance scans. Hash lookups use
//! [`FingerprintRow::into_hash_match`], which keeps such rows.

use crate::models::{FingerprintRecord, RecordId};
use rusqlite::Row;

/// Column list matching [`FingerprintRow::from_row`].
pub const FINGERPRINT_COLUMNS: &str = "id, fingerprint, content_hash, preview, source_project, \
                                       document_path, word_count, created_at";

/// Raw row from the `content_fingerprints` table.
#[derive(Debug)]
pub struct FingerprintRow {
    /// Row identifier.
    pub id: i64,
    /// Decimal string form of the fingerprint.
    pub fingerprint: String,
    /// SHA-256 hex digest.
    pub content_hash: String,
    /// Preview text.
    pub preview: String,
    /// Partition label.
    pub source_project: String,
    /// Provenance string.
    pub document_path: String,
    /// Character count.
    pub word_count: i64,
    /// Creation time (Unix epoch seconds).
    pub created_at: i64,
}

impl FingerprintRow {
    /// Reads a row selected with [`FINGERPRINT_COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns the `rusqlite` error if a column has an unexpected type.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            fingerprint: row.get(1)?,
            content_hash: row.get(2)?,
            preview: row.get(3)?,
            source_project: row.get(4)?,
            document_path: row.get(5)?,
            word_count: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    /// Converts the row into a record.
    ///
    /// Returns `None` (with a warning) if the stored fingerprint is not a
    /// valid unsigned 64-bit decimal.
    #[must_use]
    pub fn into_record(self) -> Option<FingerprintRecord> {
        let fingerprint = self.parse_fingerprint()?;
        Some(self.with_fingerprint(fingerprint))
    }

    /// Converts a row found by content hash into a record.
    ///
    /// Equal hashes mean identical content, so the row is kept even when its
    /// fingerprint is corrupt; the fingerprint then reads as 0.
    #[must_use]
    pub fn into_hash_match(self) -> FingerprintRecord {
        let fingerprint = self.parse_fingerprint().unwrap_or(0);
        self.with_fingerprint(fingerprint)
    }

    fn parse_fingerprint(&self) -> Option<u64> {
        match self.fingerprint.trim().parse::<u64>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    record_id = self.id,
                    stored_value = %self.fingerprint,
                    error = %e,
                    "Record has an invalid fingerprint"
                );
                metrics::counter!("fingerprint_store_corrupt_rows_total").increment(1);
                None
            },
        }
    }

    fn with_fingerprint(self, fingerprint: u64) -> FingerprintRecord {
        FingerprintRecord {
            id: RecordId::new(self.id),
            fingerprint,
            content_hash: self.content_hash,
            preview: self.preview,
            source_project: self.source_project,
            document_path: self.document_path,
            word_count: u64::try_from(self.word_count).unwrap_or(0),
            created_at: from_db_timestamp(self.created_at),
        }
    }
}

/// Converts a u64 timestamp to i64 for `SQLite` storage.
#[must_use]
pub fn to_db_timestamp(ts: u64) -> i64 {
    i64::try_from(ts).unwrap_or(i64::MAX)
}

/// Converts an i64 from `SQLite` back to a u64 timestamp.
#[must_use]
pub fn from_db_timestamp(ts: i64) -> u64 {
    u64::try_from(ts).unwrap_or(0)
}

/// Converts a `COUNT(*)` or `SUM(..)` result to a u64 row count.
#[must_use]
pub fn from_db_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}
