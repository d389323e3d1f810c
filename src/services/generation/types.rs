//! Types shared by the generation loop and its collaborators.

use crate::Result;
use crate::services::deduplication::DuplicateReason;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A generated document candidate.
///
/// `text` is what gets fingerprinted; `payload` is whatever the sink needs to
/// materialize the document and is never inspected by the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<P = ()> {
    /// Body text to fingerprint.
    pub text: String,
    /// Opaque data for the sink.
    pub payload: P,
}

impl Candidate<()> {
    /// Creates a candidate without a payload.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            payload: (),
        }
    }
}

impl<P> Candidate<P> {
    /// Creates a candidate with a payload.
    #[must_use]
    pub fn with_payload(text: impl Into<String>, payload: P) -> Self {
        Self {
            text: text.into(),
            payload,
        }
    }
}

/// Produces candidates for a document slot.
pub trait CandidateSource {
    /// Payload carried alongside the text.
    type Payload;

    /// Produces the candidate for `attempt` (0-based) of `slot` (0-based).
    ///
    /// # Errors
    ///
    /// Any error aborts the whole batch.
    fn next_candidate(&mut self, slot: usize, attempt: u32) -> Result<Candidate<Self::Payload>>;
}

/// Materializes accepted candidates.
pub trait DocumentSink<P> {
    /// Persists the accepted candidate and returns its document path.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole batch.
    fn persist(&mut self, slot: usize, candidate: &Candidate<P>) -> Result<String>;
}

/// Per-slot progress through the retry state machine.
///
/// ```text
/// Generating → Checking → Accepted
///                  │
///                  └→ Retrying → Generating
///                  └→ Exhausted → AcceptedAsDuplicate
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    /// Waiting for a candidate from the source.
    Generating,
    /// Candidate under duplicate check.
    Checking,
    /// Duplicate found, another attempt follows.
    Retrying,
    /// Retry budget spent on duplicates.
    Exhausted,
    /// Unique candidate accepted.
    Accepted,
    /// Duplicate accepted after exhausting retries or the batch budget.
    AcceptedAsDuplicate,
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Generating => "generating",
            Self::Checking => "checking",
            Self::Retrying => "retrying",
            Self::Exhausted => "exhausted",
            Self::Accepted => "accepted",
            Self::AcceptedAsDuplicate => "accepted_as_duplicate",
        };
        f.write_str(label)
    }
}

/// Outcome of one document slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotOutcome {
    /// Slot index (0-based).
    pub slot: usize,
    /// Terminal state.
    pub state: SlotState,
    /// Candidates produced for this slot.
    pub attempts: u32,
    /// Path returned by the sink.
    pub document_path: String,
    /// Why the accepted candidate still counted as a duplicate, if it did.
    pub duplicate_reason: Option<DuplicateReason>,
    /// Whether the accepted candidate was never checked (batch budget spent).
    pub unchecked: bool,
}

/// Aggregate result of a generation batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Documents requested.
    pub requested: usize,
    /// Documents produced.
    pub generated: usize,
    /// Candidates produced across all slots.
    pub attempts: u64,
    /// Candidates rejected as duplicates and regenerated.
    pub duplicates_intercepted: u64,
    /// Slots that accepted a duplicate after exhausting their retries.
    pub exhausted_slots: usize,
    /// Whether the batch stopped on a cancellation request.
    pub cancelled: bool,
    /// Per-slot outcomes, in slot order.
    pub documents: Vec<SlotOutcome>,
}

impl BatchReport {
    /// One-line human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "Generated {}/{} documents; {} duplicates intercepted across {} attempts",
            self.generated, self.requested, self.duplicates_intercepted, self.attempts
        );
        if self.exhausted_slots > 0 {
            line.push_str(&format!(
                "; {} accepted after exhausting retries",
                self.exhausted_slots
            ));
        }
        if self.cancelled {
            line.push_str(" (cancelled)");
        }
        line
    }
}

/// Cooperative cancellation flag shared between the loop and its caller.
///
/// Cloning shares the flag. The loop polls it between attempts only; an
/// in-flight candidate, check or persist always completes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates an untriggered token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
