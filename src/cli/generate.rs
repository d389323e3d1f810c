//! Generate CLI command.
//!
//! Drives the generation retry loop with a stand-in generator: candidates are
//! sampled from a newline-separated pool file, and accepted documents are
//! written as numbered text files.
//!
//! ```bash
//! simdup generate --pool pool.txt --count 20 --output-dir out/ --seed 7
//! ```

#![allow(clippy::print_stdout)]

use crate::services::{
    BatchReport, Candidate, CandidateSource, CancellationToken, Deduplicator, DocumentSink,
    GenerationLoop,
};
use crate::{Error, Result};
use rand::prelude::*;
use std::path::{Path, PathBuf};

/// Arguments of the generate command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateArgs {
    /// Newline-separated candidate pool.
    pub pool: PathBuf,
    /// Documents to produce.
    pub count: usize,
    /// Directory receiving the accepted documents.
    pub output_dir: PathBuf,
    /// Partition to check and record under.
    pub project: Option<String>,
    /// Sampling seed; `None` derives one from the clock.
    pub seed: Option<u64>,
}

/// Reads a candidate pool: one candidate per non-blank line.
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds no candidates.
pub fn load_pool(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
        operation: "read_pool".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;

    let pool: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if pool.is_empty() {
        return Err(Error::InvalidInput(format!(
            "candidate pool {} is empty",
            path.display()
        )));
    }
    Ok(pool)
}

/// Samples candidates uniformly from a fixed pool.
pub struct PoolSource {
    pool: Vec<String>,
    rng: StdRng,
}

impl PoolSource {
    /// Creates a source over `pool`, seeded for reproducible sampling.
    #[must_use]
    pub fn new(pool: Vec<String>, seed: u64) -> Self {
        Self {
            pool,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl CandidateSource for PoolSource {
    type Payload = ();

    fn next_candidate(&mut self, _slot: usize, _attempt: u32) -> Result<Candidate> {
        if self.pool.is_empty() {
            return Err(Error::InvalidInput("candidate pool is empty".to_string()));
        }
        let index = self.rng.random_range(0..self.pool.len());
        Ok(Candidate::text(self.pool[index].clone()))
    }
}

/// Writes accepted candidates as `doc_0001.txt`, `doc_0002.txt`, ...
#[derive(Debug, Clone)]
pub struct FileSink {
    output_dir: PathBuf,
}

impl FileSink {
    /// Creates the output directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).map_err(|e| Error::OperationFailed {
            operation: "create_output_dir".to_string(),
            cause: format!("{}: {e}", output_dir.display()),
        })?;
        Ok(Self { output_dir })
    }
}

impl DocumentSink<()> for FileSink {
    fn persist(&mut self, slot: usize, candidate: &Candidate) -> Result<String> {
        let path = self.output_dir.join(format!("doc_{:04}.txt", slot + 1));
        std::fs::write(&path, &candidate.text).map_err(|e| Error::OperationFailed {
            operation: "write_document".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Ok(path.display().to_string())
    }
}

/// Runs the generation loop and prints its summary.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] after printing the partial summary if `token`
/// fired, or the first pool, write or source error.
pub fn execute<D: Deduplicator + ?Sized>(
    dedup: &D,
    args: &GenerateArgs,
    token: CancellationToken,
) -> Result<BatchReport> {
    let pool = load_pool(&args.pool)?;
    let seed = args.seed.unwrap_or_else(crate::current_timestamp);
    tracing::info!(pool_size = pool.len(), seed, count = args.count, "Starting generation");

    let mut source = PoolSource::new(pool, seed);
    let mut sink = FileSink::new(&args.output_dir)?;

    let mut generation = GenerationLoop::new(dedup).with_cancellation(token);
    if let Some(project) = args.project.as_deref() {
        generation = generation.with_project(project);
    }

    let report = generation.run(args.count, &mut source, &mut sink)?;
    println!("{} (seed {seed})", report.summary());

    if report.cancelled {
        return Err(Error::Cancelled);
    }
    Ok(report)
}
