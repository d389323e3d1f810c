//! Structured logging configuration.

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Filter directive environment variable, checked before `RUST_LOG`.
pub const LOG_ENV: &str = "SIMDUP_LOG";

/// Output format environment variable (`pretty` or `json`).
pub const LOG_FORMAT_ENV: &str = "SIMDUP_LOG_FORMAT";

/// Log file environment variable.
pub const LOG_FILE_ENV: &str = "SIMDUP_LOG_FILE";

const DEFAULT_DIRECTIVE: &str = "warn";
const VERBOSE_DIRECTIVE: &str = "debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, falling back to [`LogFormat::Pretty`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `warn` or `simdup=debug`.
    pub directive: String,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            directive: DEFAULT_DIRECTIVE.to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds logging configuration from environment variables.
    ///
    /// An explicit `SIMDUP_LOG`/`RUST_LOG` directive wins over `verbose`.
    #[must_use]
    pub fn from_env(verbose: bool) -> Self {
        let directive = std::env::var(LOG_ENV)
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| {
                if verbose {
                    VERBOSE_DIRECTIVE.to_string()
                } else {
                    DEFAULT_DIRECTIVE.to_string()
                }
            });

        let format = std::env::var(LOG_FORMAT_ENV)
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();

        let file = std::env::var(LOG_FILE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            format,
            directive,
            file,
        }
    }

    /// Builds the `EnvFilter`, falling back to `warn` on a bad directive.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
    }
}
