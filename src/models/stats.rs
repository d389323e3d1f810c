//! Aggregate statistics over a fingerprint store.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Operational snapshot of a fingerprint store.
///
/// `total_count`, `recent_week_count`, `earliest` and `latest` honour the
/// project filter; `project_breakdown` always covers every project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintStatistics {
    /// Records matching the filter.
    pub total_count: u64,
    /// Records matching the filter created in the last seven days.
    pub recent_week_count: u64,
    /// Record counts per project (empty key for unpartitioned records).
    pub project_breakdown: BTreeMap<String, u64>,
    /// Oldest `created_at` among matching records.
    pub earliest: Option<u64>,
    /// Newest `created_at` among matching records.
    pub latest: Option<u64>,
}

/// Formats a Unix timestamp as RFC 3339, or `-` when absent.
fn format_timestamp(ts: Option<u64>) -> String {
    ts.and_then(|ts| i64::try_from(ts).ok())
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .map_or_else(|| "-".to_string(), |dt| dt.to_rfc3339())
}

impl fmt::Display for FingerprintStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total fingerprints: {}", self.total_count)?;
        writeln!(f, "Added in last 7 days: {}", self.recent_week_count)?;
        writeln!(f, "Earliest: {}", format_timestamp(self.earliest))?;
        writeln!(f, "Latest: {}", format_timestamp(self.latest))?;
        if !self.project_breakdown.is_empty() {
            writeln!(f, "By project:")?;
            for (project, count) in &self.project_breakdown {
                let label = if project.is_empty() {
                    "(none)"
                } else {
                    project.as_str()
                };
                writeln!(f, "  {label}: {count}")?;
            }
        }
        Ok(())
    }
}
