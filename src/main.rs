//! Binary entry point for simdup.
//!
//! This binary provides the CLI interface for the simdup fingerprint store.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use simdup::cli::{self, GenerateArgs};
use simdup::config::SimdupConfig;
use simdup::observability::{self, InitOptions};
use simdup::{CancellationToken, DeduplicationService, Error};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Simdup - SimHash near-duplicate detection for generated documents.
#[derive(Parser)]
#[command(name = "simdup")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "SIMDUP_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Path to the fingerprint database.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Record metrics and print them in Prometheus format on exit.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Check text against stored fingerprints.
    Check {
        /// Text to check.
        text: Option<String>,

        /// Read the text from a file.
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Project partition to search.
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Record the fingerprint of accepted text.
    Add {
        /// Text to record.
        text: Option<String>,

        /// Read the text from a file.
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Project to record under.
        #[arg(short, long)]
        project: Option<String>,

        /// Path of the document the text belongs to.
        #[arg(long)]
        path: Option<String>,
    },

    /// Show store statistics.
    Stats {
        /// Restrict counts to one project.
        #[arg(short, long)]
        project: Option<String>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Delete fingerprints outside the retention window.
    Prune {
        /// Retention window in days (default: configured `retention_days`).
        #[arg(long)]
        days: Option<u32>,
    },

    /// Delete fingerprints by record id.
    Delete {
        /// Record ids.
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Delete all fingerprints, or one project's.
    Clear {
        /// Only clear this project.
        #[arg(short, long)]
        project: Option<String>,

        /// Confirm the irreversible deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Generate documents from a candidate pool, rejecting near duplicates.
    Generate {
        /// Newline-separated candidate pool.
        #[arg(long)]
        pool: PathBuf,

        /// Number of documents to generate.
        #[arg(short = 'n', long)]
        count: usize,

        /// Directory for generated documents.
        #[arg(short, long, default_value = "generated")]
        output_dir: PathBuf,

        /// Project partition.
        #[arg(short, long)]
        project: Option<String>,

        /// Sampling seed.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the effective configuration.
    Config,
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match SimdupConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };
    let config = match cli.db.clone() {
        Some(db) => config.with_db_path(db),
        None => config,
    };

    let observability = match observability::init_from_env(InitOptions {
        verbose: cli.verbose,
        metrics: cli.metrics,
    }) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    let result = run_command(cli.command, &config);

    if let Some(rendered) = observability.render_metrics() {
        eprintln!("{rendered}");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Cancelled) => {
            eprintln!("Cancelled");
            ExitCode::FAILURE
        },
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: &SimdupConfig) -> simdup::Result<()> {
    if let Commands::Config = command {
        cli::config::execute(config);
        return Ok(());
    }
    run_store_command(command, config)
}

/// Runs a command that needs the fingerprint store.
fn run_store_command(command: Commands, config: &SimdupConfig) -> simdup::Result<()> {
    let store = cli::open_store(config)?;
    let service = DeduplicationService::new(Arc::clone(&store), config.dedup.clone());

    match command {
        Commands::Check {
            text,
            file,
            project,
        } => {
            let text = cli::read_input(text, file.as_deref())?;
            cli::check::execute(&service, &text, project.as_deref()).map(drop)
        },

        Commands::Add {
            text,
            file,
            project,
            path,
        } => {
            let text = cli::read_input(text, file.as_deref())?;
            cli::add::execute(&service, &text, project.as_deref(), path.as_deref()).map(drop)
        },

        Commands::Stats { project, json } => {
            cli::stats::execute(&service, project.as_deref(), json).map(drop)
        },

        Commands::Prune { days } => {
            cli::prune::execute(store, days.unwrap_or(config.dedup.retention_days)).map(drop)
        },

        Commands::Delete { ids } => cli::delete::execute(store.as_ref(), &ids).map(drop),

        Commands::Clear { project, yes } => {
            cli::clear::execute(&service, project.as_deref(), yes).map(drop)
        },

        Commands::Generate {
            pool,
            count,
            output_dir,
            project,
            seed,
        } => {
            let token = install_interrupt_handler();
            let args = GenerateArgs {
                pool,
                count,
                output_dir,
                project,
                seed,
            };
            cli::generate::execute(&service, &args, token).map(drop)
        },

        Commands::Config => {
            cli::config::execute(config);
            Ok(())
        },
    }
}

/// Wires Ctrl-C to a cancellation token.
///
/// The loop stops at the next attempt boundary; repeated interrupts only
/// re-set the flag.
fn install_interrupt_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("Interrupt received, finishing current attempt...");
        handler_token.cancel();
    }) {
        tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
    }
    token
}
