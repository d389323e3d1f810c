//! Storage backend traits.

mod fingerprint;

pub use fingerprint::FingerprintStore;
