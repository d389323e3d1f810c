//! Generation retry loop.
//!
//! Wraps a document generator with duplicate checks: candidates that collide
//! with earlier output are regenerated a bounded number of times, and every
//! accepted document is fingerprinted so later batches see it.
//!
//! The loop is single-threaded and blocking. Cancellation is cooperative
//! through [`CancellationToken`], checked between attempts.

mod retry;
mod types;

pub use retry::GenerationLoop;
pub use types::{
    BatchReport, Candidate, CandidateSource, CancellationToken, DocumentSink, SlotOutcome,
    SlotState,
};
