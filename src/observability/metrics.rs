//! Prometheus metrics.

use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Metrics enable environment variable.
pub const METRICS_ENV: &str = "SIMDUP_METRICS_ENABLED";

/// Metrics configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsConfig {
    /// Whether a recorder is installed at all.
    pub enabled: bool,
}

impl MetricsConfig {
    /// Builds metrics configuration from the CLI flag and `SIMDUP_METRICS_ENABLED`.
    #[must_use]
    pub fn from_env(requested: bool) -> Self {
        let enabled = requested || crate::services::deduplication::env_bool(METRICS_ENV) == Some(true);
        Self { enabled }
    }
}

/// Metrics handle for rendering on shutdown.
#[derive(Debug, Clone)]
pub struct MetricsHandle {
    prometheus: PrometheusHandle,
}

impl MetricsHandle {
    /// Renders every recorded metric in the Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.prometheus.render()
    }
}

/// Installs the global Prometheus recorder.
///
/// Returns `None` when metrics are disabled; `metrics` macros are then no-ops.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn install_prometheus(config: MetricsConfig) -> Result<Option<MetricsHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::OperationFailed {
            operation: "metrics_recorder_install".to_string(),
            cause: e.to_string(),
        })?;

    tracing::debug!("Installed Prometheus metrics recorder");
    Ok(Some(MetricsHandle { prometheus }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_installs_nothing() {
        let handle = install_prometheus(MetricsConfig { enabled: false }).unwrap();
        assert!(handle.is_none());
    }

    #[test]
    fn test_requested_flag_enables() {
        assert!(MetricsConfig::from_env(true).enabled);
    }
}
