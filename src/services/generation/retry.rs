//! Bounded regenerate-on-duplicate loop.

use super::types::{
    BatchReport, Candidate, CandidateSource, CancellationToken, DocumentSink, SlotOutcome,
    SlotState,
};
use crate::Result;
use crate::services::deduplication::Deduplicator;

/// Drives a batch of document slots through check-then-commit.
///
/// For every slot the loop asks the [`CandidateSource`] for a candidate,
/// checks it, and either accepts it (persist through the [`DocumentSink`],
/// then record its fingerprint) or asks for another one. A slot that keeps
/// producing duplicates accepts its last candidate once its retry counter
/// reaches `max_retries`, so every slot terminates.
///
/// A batch-wide budget of `count * max(max_retries, 1)` attempts caps the
/// total work; once spent, each remaining slot gets a single attempt whose
/// candidate is accepted without a check.
///
/// # Example
///
/// ```rust,ignore
/// let token = CancellationToken::new();
/// let report = GenerationLoop::new(&service)
///     .with_project("campaign-a")
///     .with_cancellation(token.clone())
///     .run(20, &mut pool, &mut writer)?;
/// println!("{}", report.summary());
/// ```
pub struct GenerationLoop<'a, D: Deduplicator + ?Sized> {
    dedup: &'a D,
    project: Option<&'a str>,
    token: CancellationToken,
}

impl<'a, D: Deduplicator + ?Sized> GenerationLoop<'a, D> {
    /// Creates a loop over `dedup` with no project and a fresh token.
    #[must_use]
    pub fn new(dedup: &'a D) -> Self {
        Self {
            dedup,
            project: None,
            token: CancellationToken::new(),
        }
    }

    /// Scopes checks and records to `project`.
    #[must_use]
    pub const fn with_project(mut self, project: &'a str) -> Self {
        self.project = Some(project);
        self
    }

    /// Uses `token` for cooperative cancellation.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Returns the loop's cancellation token.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Generates `count` documents.
    ///
    /// Cancellation is observed before each attempt; the report then covers
    /// the slots finished so far and has `cancelled` set.
    ///
    /// # Errors
    ///
    /// Returns the first error from the source or the sink. Documents
    /// persisted before the failure stay persisted.
    #[tracing::instrument(skip_all, fields(operation = "generate_batch", count = count, project = ?self.project))]
    pub fn run<C, K>(&self, count: usize, source: &mut C, sink: &mut K) -> Result<BatchReport>
    where
        C: CandidateSource,
        K: DocumentSink<C::Payload>,
    {
        let budget = (count as u64).saturating_mul(u64::from(self.dedup.max_retries().max(1)));
        let mut report = BatchReport {
            requested: count,
            ..BatchReport::default()
        };

        'slots: for slot in 0..count {
            let max_retries = self.dedup.max_retries();
            let mut attempt: u32 = 0;
            let mut retries: u32 = 0;

            loop {
                if self.token.is_cancelled() {
                    tracing::info!(slot, attempt, "Generation cancelled");
                    report.cancelled = true;
                    break 'slots;
                }

                let over_budget = report.attempts >= budget;
                Self::trace_state(slot, SlotState::Generating);
                let candidate = source.next_candidate(slot, attempt)?;
                attempt += 1;
                report.attempts += 1;
                metrics::counter!("generation_attempts_total").increment(1);

                if over_budget {
                    tracing::warn!(slot, budget, "Attempt budget spent, accepting candidate unchecked");
                    let outcome = SlotOutcome {
                        slot,
                        state: SlotState::Accepted,
                        attempts: attempt,
                        document_path: String::new(),
                        duplicate_reason: None,
                        unchecked: true,
                    };
                    self.accept(sink, &mut report, &candidate, outcome)?;
                    break;
                }

                Self::trace_state(slot, SlotState::Checking);
                let check = self.dedup.check_duplicate(&candidate.text, self.project);
                if !check.is_duplicate {
                    let outcome = SlotOutcome {
                        slot,
                        state: SlotState::Accepted,
                        attempts: attempt,
                        document_path: String::new(),
                        duplicate_reason: None,
                        unchecked: false,
                    };
                    self.accept(sink, &mut report, &candidate, outcome)?;
                    break;
                }

                retries += 1;
                if retries >= max_retries {
                    Self::trace_state(slot, SlotState::Exhausted);
                    tracing::warn!(
                        slot,
                        attempts = attempt,
                        distance = ?check.hamming_distance,
                        "Retries exhausted, accepting duplicate"
                    );
                    report.exhausted_slots += 1;
                    let outcome = SlotOutcome {
                        slot,
                        state: SlotState::AcceptedAsDuplicate,
                        attempts: attempt,
                        document_path: String::new(),
                        duplicate_reason: check.reason,
                        unchecked: false,
                    };
                    self.accept(sink, &mut report, &candidate, outcome)?;
                    break;
                }

                report.duplicates_intercepted += 1;
                Self::trace_state(slot, SlotState::Retrying);
                tracing::debug!(
                    slot,
                    retries,
                    max_retries,
                    reason = ?check.reason,
                    distance = ?check.hamming_distance,
                    "Duplicate intercepted, regenerating"
                );
            }
        }

        tracing::info!(
            generated = report.generated,
            attempts = report.attempts,
            duplicates_intercepted = report.duplicates_intercepted,
            exhausted_slots = report.exhausted_slots,
            cancelled = report.cancelled,
            "Generation batch finished"
        );
        Ok(report)
    }

    /// Persists, records and reports an accepted candidate.
    fn accept<P, K: DocumentSink<P>>(
        &self,
        sink: &mut K,
        report: &mut BatchReport,
        candidate: &Candidate<P>,
        mut outcome: SlotOutcome,
    ) -> Result<()> {
        outcome.document_path = sink.persist(outcome.slot, candidate)?;

        let recorded = self.dedup.add_content_fingerprint(
            &candidate.text,
            self.project.unwrap_or_default(),
            &outcome.document_path,
        );
        if !recorded {
            tracing::warn!(
                slot = outcome.slot,
                path = %outcome.document_path,
                "Document persisted but its fingerprint was not recorded"
            );
        }

        Self::trace_state(outcome.slot, outcome.state);
        report.generated += 1;
        report.documents.push(outcome);
        Ok(())
    }

    fn trace_state(slot: usize, state: SlotState) {
        tracing::trace!(slot, state = %state, "Slot state");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::models::{NewFingerprint, RecordId};
    use crate::services::deduplication::{
        DeduplicationConfig, DeduplicationService, DuplicateCheckResult, DuplicateReason,
    };
    use crate::storage::InMemoryFingerprintStore;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Deduplicator answering from a script; `true` means duplicate.
    struct ScriptedDeduplicator {
        verdicts: Mutex<VecDeque<bool>>,
        max_retries: u32,
        checks: AtomicU32,
        recorded: Mutex<Vec<(String, String, String)>>,
    }

    impl ScriptedDeduplicator {
        fn new(max_retries: u32, verdicts: &[bool]) -> Self {
            Self {
                verdicts: Mutex::new(verdicts.iter().copied().collect()),
                max_retries,
                checks: AtomicU32::new(0),
                recorded: Mutex::new(Vec::new()),
            }
        }

        fn always_duplicate(max_retries: u32) -> Self {
            Self::new(max_retries, &[])
        }
    }

    impl Deduplicator for ScriptedDeduplicator {
        fn check_duplicate(&self, _content: &str, _project: Option<&str>) -> DuplicateCheckResult {
            self.checks.fetch_add(1, Ordering::SeqCst);
            let duplicate = self.verdicts.lock().unwrap().pop_front().unwrap_or(true);
            if duplicate {
                let record = NewFingerprint::new(0, "h").into_record(RecordId::new(1), 0);
                DuplicateCheckResult::near_duplicate(record, 2, 0)
            } else {
                DuplicateCheckResult::not_duplicate(0)
            }
        }

        fn add_content_fingerprint(&self, content: &str, project: &str, path: &str) -> bool {
            self.recorded.lock().unwrap().push((
                content.to_string(),
                project.to_string(),
                path.to_string(),
            ));
            true
        }

        fn max_retries(&self) -> u32 {
            self.max_retries
        }
    }

    /// Source producing "slot-attempt" texts.
    #[derive(Default)]
    struct CountingSource {
        calls: Vec<(usize, u32)>,
    }

    impl CandidateSource for CountingSource {
        type Payload = usize;

        fn next_candidate(&mut self, slot: usize, attempt: u32) -> Result<Candidate<usize>> {
            self.calls.push((slot, attempt));
            Ok(Candidate::with_payload(format!("{slot}-{attempt}"), slot))
        }
    }

    #[derive(Default)]
    struct VecSink {
        persisted: Vec<String>,
    }

    impl DocumentSink<usize> for VecSink {
        fn persist(&mut self, slot: usize, candidate: &Candidate<usize>) -> Result<String> {
            assert_eq!(candidate.payload, slot);
            self.persisted.push(candidate.text.clone());
            Ok(format!("out/{slot}.txt"))
        }
    }

    #[test]
    fn test_unique_candidates_accepted_first_try() {
        let dedup = ScriptedDeduplicator::new(3, &[false, false]);
        let (mut source, mut sink) = (CountingSource::default(), VecSink::default());

        let report = GenerationLoop::new(&dedup)
            .with_project("p")
            .run(2, &mut source, &mut sink)
            .unwrap();

        assert_eq!(report.generated, 2);
        assert_eq!(report.attempts, 2);
        assert_eq!(report.duplicates_intercepted, 0);
        assert!(report.documents.iter().all(|d| d.state == SlotState::Accepted));
        assert_eq!(sink.persisted, vec!["0-0", "1-0"]);

        let recorded = dedup.recorded.lock().unwrap();
        assert_eq!(recorded[1], ("1-0".to_string(), "p".to_string(), "out/1.txt".to_string()));
    }

    #[test]
    fn test_retry_until_unique() {
        let dedup = ScriptedDeduplicator::new(5, &[true, true, false]);
        let (mut source, mut sink) = (CountingSource::default(), VecSink::default());

        let report = GenerationLoop::new(&dedup).run(1, &mut source, &mut sink).unwrap();

        assert_eq!(source.calls, vec![(0, 0), (0, 1), (0, 2)]);
        assert_eq!(report.attempts, 3);
        assert_eq!(report.duplicates_intercepted, 2);
        assert_eq!(report.documents[0].state, SlotState::Accepted);
        assert_eq!(sink.persisted, vec!["0-2"]);
    }

    #[test]
    fn test_exactly_max_retries_attempts_per_slot() {
        let dedup = ScriptedDeduplicator::always_duplicate(3);
        let (mut source, mut sink) = (CountingSource::default(), VecSink::default());

        let report = GenerationLoop::new(&dedup).run(2, &mut source, &mut sink).unwrap();

        assert_eq!(report.attempts, 6);
        assert_eq!(report.exhausted_slots, 2);
        assert_eq!(report.generated, 2);
        for outcome in &report.documents {
            assert_eq!(outcome.attempts, 3);
            assert_eq!(outcome.state, SlotState::AcceptedAsDuplicate);
            assert_eq!(outcome.duplicate_reason, Some(DuplicateReason::NearDuplicate));
        }
        assert_eq!(sink.persisted, vec!["0-2", "1-2"]);
    }

    #[test]
    fn test_zero_retries_single_attempt() {
        let dedup = ScriptedDeduplicator::always_duplicate(0);
        let (mut source, mut sink) = (CountingSource::default(), VecSink::default());

        let report = GenerationLoop::new(&dedup).run(3, &mut source, &mut sink).unwrap();

        assert_eq!(report.attempts, 3);
        assert_eq!(report.exhausted_slots, 3);
        assert_eq!(report.duplicates_intercepted, 0);
    }

    /// Reports one retry while the budget is computed, then many.
    struct GrowingRetries {
        inner: ScriptedDeduplicator,
        calls: AtomicU32,
    }

    impl Deduplicator for GrowingRetries {
        fn check_duplicate(&self, content: &str, project: Option<&str>) -> DuplicateCheckResult {
            self.inner.check_duplicate(content, project)
        }

        fn add_content_fingerprint(&self, content: &str, project: &str, path: &str) -> bool {
            self.inner.add_content_fingerprint(content, project, path)
        }

        fn max_retries(&self) -> u32 {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 { 1 } else { 10 }
        }
    }

    #[test]
    fn test_batch_budget_accepts_unchecked() {
        let dedup = GrowingRetries {
            inner: ScriptedDeduplicator::always_duplicate(10),
            calls: AtomicU32::new(0),
        };
        let (mut source, mut sink) = (CountingSource::default(), VecSink::default());

        // Budget is 2 attempts; slot 0 spends both, slot 1 gets one unchecked attempt
        let report = GenerationLoop::new(&dedup).run(2, &mut source, &mut sink).unwrap();

        assert_eq!(report.attempts, 4);
        assert_eq!(source.calls, vec![(0, 0), (0, 1), (0, 2), (1, 0)]);
        assert!(report.documents.iter().all(|d| d.unchecked));
        assert_eq!(dedup.inner.checks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cancelled_before_start() {
        let dedup = ScriptedDeduplicator::always_duplicate(3);
        let token = CancellationToken::new();
        token.cancel();
        let (mut source, mut sink) = (CountingSource::default(), VecSink::default());

        let report = GenerationLoop::new(&dedup)
            .with_cancellation(token)
            .run(5, &mut source, &mut sink)
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.generated, 0);
        assert!(source.calls.is_empty());
    }

    /// Sink that cancels the batch after its first document.
    struct CancellingSink {
        token: CancellationToken,
        persisted: usize,
    }

    impl DocumentSink<usize> for CancellingSink {
        fn persist(&mut self, slot: usize, _candidate: &Candidate<usize>) -> Result<String> {
            self.persisted += 1;
            self.token.cancel();
            Ok(format!("out/{slot}.txt"))
        }
    }

    #[test]
    fn test_cancelled_between_slots() {
        let dedup = ScriptedDeduplicator::new(3, &[false, false, false]);
        let token = CancellationToken::new();
        let mut sink = CancellingSink {
            token: token.clone(),
            persisted: 0,
        };
        let mut source = CountingSource::default();

        let report = GenerationLoop::new(&dedup)
            .with_cancellation(token)
            .run(3, &mut source, &mut sink)
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.generated, 1);
        assert_eq!(sink.persisted, 1);
        assert!(report.summary().ends_with("(cancelled)"));
    }

    struct FailingSource;

    impl CandidateSource for FailingSource {
        type Payload = ();

        fn next_candidate(&mut self, _slot: usize, _attempt: u32) -> Result<Candidate> {
            Err(Error::InvalidInput("pool exhausted".to_string()))
        }
    }

    struct NullSink;

    impl DocumentSink<()> for NullSink {
        fn persist(&mut self, slot: usize, _candidate: &Candidate) -> Result<String> {
            Ok(slot.to_string())
        }
    }

    #[test]
    fn test_source_error_aborts_batch() {
        let dedup = ScriptedDeduplicator::always_duplicate(3);
        let result = GenerationLoop::new(&dedup).run(2, &mut FailingSource, &mut NullSink);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    /// Source that returns the same text every time.
    struct RepeatingSource(&'static str);

    impl CandidateSource for RepeatingSource {
        type Payload = ();

        fn next_candidate(&mut self, _slot: usize, _attempt: u32) -> Result<Candidate> {
            Ok(Candidate::text(self.0))
        }
    }

    #[test]
    fn test_with_real_service() {
        let store = Arc::new(InMemoryFingerprintStore::new());
        let service = DeduplicationService::new(
            Arc::clone(&store),
            DeduplicationConfig::default().with_max_retries(3),
        );

        let report = GenerationLoop::new(&service)
            .with_project("p")
            .run(2, &mut RepeatingSource("同一段文本内容，每次都一样。"), &mut NullSink)
            .unwrap();

        // Slot 0 is unique; slot 1 sees it and exhausts its retries
        assert_eq!(report.attempts, 4);
        assert_eq!(report.duplicates_intercepted, 2);
        assert_eq!(report.exhausted_slots, 1);
        assert_eq!(report.documents[1].duplicate_reason, Some(DuplicateReason::ExactMatch));
        assert_eq!(store.len(), 2);
    }
}
