//! Configuration management.
//!
//! Configuration is layered: built-in defaults, then a TOML file, then
//! `SIMDUP_*` environment variables, then CLI flags.
//!
//! ```toml
//! [dedup]
//! enabled = true
//! similarity_threshold = 0.9
//! max_retries = 10
//! retention_days = 180
//! cross_project = false
//! project_name = "default"
//!
//! [storage]
//! db_path = "/var/lib/simdup/fingerprints.db"
//! ```

use crate::services::deduplication::{DeduplicationConfig, validate_threshold};
use crate::simhash::similarity_to_distance;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the database path.
pub const DB_PATH_ENV: &str = "SIMDUP_DB_PATH";

/// Main configuration for simdup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimdupConfig {
    /// Deduplication settings.
    pub dedup: DeduplicationConfig,
    /// Fingerprint database path; `None` means the platform default.
    pub db_path: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Deduplication section.
    pub dedup: Option<ConfigFileDedup>,
    /// Storage section.
    pub storage: Option<ConfigFileStorage>,
}

/// `[dedup]` section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileDedup {
    /// Enable deduplication.
    pub enabled: Option<bool>,
    /// Similarity threshold in `[0, 1]`.
    pub similarity_threshold: Option<f64>,
    /// Regeneration attempts per document.
    pub max_retries: Option<u32>,
    /// Retention window in days.
    pub retention_days: Option<u32>,
    /// Search across projects.
    pub cross_project: Option<bool>,
    /// Default partition label.
    pub project_name: Option<String>,
}

/// `[storage]` section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileStorage {
    /// Database path.
    pub db_path: Option<String>,
}

impl SimdupConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it holds
    /// a similarity threshold outside `[0, 1]`.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::parse(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration TOML.
    pub fn parse(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_config_file(file)
    }

    /// Returns the default config file location (`~/.config/simdup/config.toml`).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| {
            dirs.home_dir()
                .join(".config")
                .join("simdup")
                .join("config.toml")
        })
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/simdup/` on macOS)
    /// 2. XDG config dir (`~/.config/simdup/` for Unix compatibility)
    ///
    /// Returns default configuration if no usable config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("simdup").join("config.toml");
        let candidates = [Some(platform_config), Self::default_path()];

        for path in candidates.into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(&path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring config file");
                },
            }
        }

        Self::default()
    }

    /// Loads `path` if given, else the default location, then applies
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error only when an explicit `path` cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Applies `SIMDUP_*` environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        self.dedup = self.dedup.with_env_overrides();
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            if !path.trim().is_empty() {
                self.db_path = Some(PathBuf::from(path));
            }
        }
        self
    }

    /// Converts a `ConfigFile` to `SimdupConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dedup) = file.dedup {
            if let Some(v) = dedup.enabled {
                config.dedup.enabled = v;
            }
            if let Some(threshold) = dedup.similarity_threshold {
                validate_threshold(threshold)?;
                config.dedup.max_distance = similarity_to_distance(threshold);
            }
            if let Some(v) = dedup.max_retries {
                config.dedup.max_retries = v;
            }
            if let Some(v) = dedup.retention_days {
                config.dedup.retention_days = v;
            }
            if let Some(v) = dedup.cross_project {
                config.dedup.cross_project = v;
            }
            if let Some(v) = dedup.project_name {
                config.dedup.project_name = v;
            }
        }
        if let Some(path) = file.storage.and_then(|s| s.db_path) {
            config.db_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    /// Returns the deduplication settings.
    #[must_use]
    pub const fn dedup_config(&self) -> &DeduplicationConfig {
        &self.dedup
    }

    /// Renders the effective configuration as TOML.
    #[must_use]
    pub fn to_toml(&self) -> String {
        let db_path = self
            .db_path
            .as_ref()
            .map_or_else(|| "(platform default)".to_string(), |p| p.display().to_string());
        format!(
            "[dedup]\n\
             enabled = {}\n\
             similarity_threshold = {}\n\
             max_distance = {}\n\
             max_retries = {}\n\
             retention_days = {}\n\
             cross_project = {}\n\
             project_name = {:?}\n\
             \n\
             [storage]\n\
             db_path = {:?}\n",
            self.dedup.enabled,
            self.dedup.similarity_threshold(),
            self.dedup.max_distance,
            self.dedup.max_retries,
            self.dedup.retention_days,
            self.dedup.cross_project,
            self.dedup.project_name,
            db_path,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_is_default() {
        let config = SimdupConfig::parse("").unwrap();
        assert_eq!(config, SimdupConfig::default());
    }

    #[test]
    fn test_parse_all_sections() {
        let config = SimdupConfig::parse(
            r#"
            [dedup]
            enabled = false
            similarity_threshold = 0.95
            max_retries = 3
            retention_days = 30
            cross_project = true
            project_name = "campaign-a"

            [storage]
            db_path = "/tmp/fp.db"
            "#,
        )
        .unwrap();

        assert!(!config.dedup.enabled);
        assert_eq!(config.dedup.max_distance, 3);
        assert_eq!(config.dedup.max_retries, 3);
        assert_eq!(config.dedup.retention_days, 30);
        assert!(config.dedup.cross_project);
        assert_eq!(config.dedup.project_name, "campaign-a");
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/fp.db")));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let err = SimdupConfig::parse("[dedup]\nsimilarity_threshold = 1.5\n").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = SimdupConfig::parse("[dedup]\nthreshold = 0.9\n").unwrap_err();
        assert!(matches!(err, Error::OperationFailed { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dedup]\nmax_retries = 5").unwrap();

        let config = SimdupConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.dedup.max_retries, 5);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = SimdupConfig::load_from_file(Path::new("/nonexistent/simdup.toml")).unwrap_err();
        assert!(err.to_string().contains("read_config_file"));
    }

    #[test]
    fn test_to_toml_mentions_effective_values() {
        let config = SimdupConfig::new().with_db_path("/data/fp.db");
        let rendered = config.to_toml();
        assert!(rendered.contains("max_distance = 6"));
        assert!(rendered.contains("db_path = \"/data/fp.db\""));
    }
}
