//! SimHash fingerprinting.
//!
//! A 64-bit locality-sensitive hash over character n-grams: texts that differ
//! by a few characters produce fingerprints that differ in a few bits, while
//! unrelated texts differ in roughly half of them.
//!
//! ```text
//! text ──normalize──▶ segments ──2/3-grams──▶ tokens ──SHA-256──▶ u64 per token
//!                                                              │
//!                         fingerprint ◀──sign(Σ ±1 per bit)────┘
//! ```
//!
//! The engine is pure and stateless; distance and similarity helpers are free
//! functions so the store and the deduplicator can share them.

mod distance;
mod engine;

pub use distance::{
    distance_to_similarity, hamming_distance, is_similar, similarity, similarity_to_distance,
};
pub use engine::{FINGERPRINT_BITS, SEGMENT_DELIMITERS, SimHashEngine};
