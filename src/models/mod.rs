//! Data models for simdup.

mod fingerprint;
mod stats;

pub use fingerprint::{
    FingerprintRecord, NewFingerprint, PREVIEW_MAX_CHARS, RecordId, truncate_preview,
};
pub use stats::FingerprintStatistics;
