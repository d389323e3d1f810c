//! Deduplication configuration.
//!
//! This module defines the knobs of the deduplicator: whether it runs, how
//! close two fingerprints must be to count as duplicates, how often a caller
//! may regenerate, how long fingerprints are kept, and how the store is
//! partitioned.

use crate::simhash::{distance_to_similarity, similarity_to_distance};
use crate::{Error, Result};

/// Default similarity threshold (90%, i.e. 6 differing bits).
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.90;

/// Default number of regeneration attempts per document.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Default retention window in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 180;

/// Default partition label.
pub const DEFAULT_PROJECT_NAME: &str = "default";

/// Configuration for the deduplication service.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `SIMDUP_DEDUP_ENABLED` | bool | `true` | Enable deduplication |
/// | `SIMDUP_DEDUP_THRESHOLD` | f64 | `0.90` | Similarity threshold in `[0, 1]` |
/// | `SIMDUP_DEDUP_MAX_RETRIES` | u32 | `10` | Regeneration attempts per document |
/// | `SIMDUP_RETENTION_DAYS` | u32 | `180` | Fingerprint retention window |
/// | `SIMDUP_DEDUP_CROSS_PROJECT` | bool | `false` | Search across all projects |
/// | `SIMDUP_PROJECT` | string | `default` | Partition label |
///
/// # Example
///
/// ```rust
/// use simdup::services::deduplication::DeduplicationConfig;
///
/// let config = DeduplicationConfig::default();
/// assert!(config.enabled);
/// assert_eq!(config.max_distance, 6);
/// assert_eq!(config.max_retries, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeduplicationConfig {
    /// Enable/disable entire deduplication.
    pub enabled: bool,

    /// Largest Hamming distance still counted as a duplicate.
    pub max_distance: u8,

    /// Regeneration attempts per document before accepting a duplicate.
    pub max_retries: u32,

    /// Fingerprints older than this many days are pruned.
    pub retention_days: u32,

    /// Search every project instead of only the caller's.
    pub cross_project: bool,

    /// Partition used when the caller names none.
    pub project_name: String,
}

impl DeduplicationConfig {
    /// Builds a configuration from a similarity threshold.
    ///
    /// `max_distance` is derived with
    /// [`similarity_to_distance`](crate::simhash::similarity_to_distance).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `similarity_threshold` is not a
    /// number in `[0.0, 1.0]`.
    pub fn configure(
        enabled: bool,
        similarity_threshold: f64,
        max_retries: u32,
        retention_days: u32,
        cross_project: bool,
        project_name: impl Into<String>,
    ) -> Result<Self> {
        validate_threshold(similarity_threshold)?;

        let config = Self {
            enabled,
            max_distance: similarity_to_distance(similarity_threshold),
            max_retries,
            retention_days,
            cross_project,
            project_name: project_name.into(),
        };

        tracing::debug!(
            enabled,
            similarity_threshold,
            max_distance = config.max_distance,
            max_retries,
            retention_days,
            cross_project,
            project = %config.project_name,
            "Configured deduplication"
        );
        Ok(config)
    }

    /// Applies environment variable overrides on top of `self`.
    ///
    /// Unset or unparseable variables, including thresholds outside `[0, 1]`,
    /// leave the current value in place.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(enabled) = env_bool("SIMDUP_DEDUP_ENABLED") {
            self.enabled = enabled;
        }

        if let Some(threshold) = env_parse::<f64>("SIMDUP_DEDUP_THRESHOLD") {
            match validate_threshold(threshold) {
                Ok(()) => self.max_distance = similarity_to_distance(threshold),
                Err(e) => tracing::warn!(error = %e, "Ignoring SIMDUP_DEDUP_THRESHOLD"),
            }
        }

        if let Some(retries) = env_parse("SIMDUP_DEDUP_MAX_RETRIES") {
            self.max_retries = retries;
        }

        if let Some(days) = env_parse("SIMDUP_RETENTION_DAYS") {
            self.retention_days = days;
        }

        if let Some(cross) = env_bool("SIMDUP_DEDUP_CROSS_PROJECT") {
            self.cross_project = cross;
        }

        if let Ok(project) = std::env::var("SIMDUP_PROJECT") {
            self.project_name = project;
        }

        self
    }

    /// Returns the similarity equivalent of `max_distance`.
    #[must_use]
    pub fn similarity_threshold(&self) -> f64 {
        distance_to_similarity(u32::from(self.max_distance))
    }

    /// Resolves the partition a store query should use.
    ///
    /// `None` (search everything) when `cross_project` is on; otherwise the
    /// caller's project, else the configured `project_name`. An empty
    /// result also means `None`.
    #[must_use]
    pub fn effective_project<'a>(&'a self, source_project: Option<&'a str>) -> Option<&'a str> {
        if self.cross_project {
            return None;
        }
        let project = source_project
            .filter(|p| !p.is_empty())
            .unwrap_or(self.project_name.as_str());
        (!project.is_empty()).then_some(project)
    }

    /// Resolves the partition label written on new records.
    ///
    /// The caller's project, else the configured `project_name`. Unlike
    /// [`effective_project`](Self::effective_project) this ignores
    /// `cross_project`: search scope and record ownership are separate.
    #[must_use]
    pub fn record_project<'a>(&'a self, source_project: &'a str) -> &'a str {
        if source_project.is_empty() {
            &self.project_name
        } else {
            source_project
        }
    }

    /// Builder method to set enabled state.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder method to set the maximum distance directly.
    #[must_use]
    pub fn with_max_distance(mut self, max_distance: u8) -> Self {
        self.max_distance = max_distance.min(64);
        self
    }

    /// Builder method to set the retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Builder method to set the retention window.
    #[must_use]
    pub const fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    /// Builder method to toggle cross-project search.
    #[must_use]
    pub const fn with_cross_project(mut self, cross_project: bool) -> Self {
        self.cross_project = cross_project;
        self
    }

    /// Builder method to set the default partition.
    #[must_use]
    pub fn with_project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = project_name.into();
        self
    }
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_distance: similarity_to_distance(DEFAULT_SIMILARITY_THRESHOLD),
            max_retries: DEFAULT_MAX_RETRIES,
            retention_days: DEFAULT_RETENTION_DAYS,
            cross_project: false,
            project_name: DEFAULT_PROJECT_NAME.to_string(),
        }
    }
}

/// Rejects thresholds outside `[0.0, 1.0]` (including NaN).
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] describing the bad value.
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "similarity threshold must be within [0.0, 1.0], got {threshold}"
        )))
    }
}

/// Parses a boolean environment variable (`true/1/yes/on`, `false/0/no/off`).
pub(crate) fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parses an environment variable into `T`, ignoring unparseable values.
pub(crate) fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
