//! Business logic services.
//!
//! Services orchestrate the fingerprint store and provide high-level operations.

pub mod deduplication;
pub mod generation;

pub use deduplication::{
    DeduplicationConfig, DeduplicationService, Deduplicator, DuplicateCheckResult,
    DuplicateReason,
};
pub use generation::{
    BatchReport, Candidate, CandidateSource, CancellationToken, DocumentSink, GenerationLoop,
    SlotOutcome, SlotState,
};
