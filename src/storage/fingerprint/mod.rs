//! Fingerprint store implementations.
//!
//! Both backends answer near-duplicate queries with a linear scan over the
//! project-filtered records and share the ranking rule in [`rank_by_distance`].

mod memory;
mod sqlite;

pub use memory::InMemoryFingerprintStore;
pub use sqlite::SqliteFingerprintStore;

use crate::models::FingerprintRecord;

/// Seconds per day, used to turn retention windows into cutoffs.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Returns the `created_at` cutoff for a retention window of `days` days.
///
/// Records created strictly before the cutoff are outside the window.
#[must_use]
pub fn retention_cutoff(now: u64, days: u32) -> u64 {
    now.saturating_sub(u64::from(days) * SECONDS_PER_DAY)
}

/// Orders scan hits by ascending distance, then by ID, and keeps `limit`.
pub(crate) fn rank_by_distance(
    mut hits: Vec<(FingerprintRecord, u32)>,
    limit: usize,
) -> Vec<(FingerprintRecord, u32)> {
    hits.sort_by(|(a, da), (b, db)| da.cmp(db).then_with(|| a.id.cmp(&b.id)));
    hits.truncate(limit);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewFingerprint, RecordId};

    fn hit(id: i64, distance: u32) -> (FingerprintRecord, u32) {
        (
            NewFingerprint::new(0, "h").into_record(RecordId::new(id), 0),
            distance,
        )
    }

    #[test]
    fn test_rank_by_distance_orders_and_truncates() {
        let ranked = rank_by_distance(vec![hit(3, 2), hit(1, 4), hit(2, 2), hit(4, 0)], 3);
        let order: Vec<(i64, u32)> = ranked.iter().map(|(r, d)| (r.id.get(), *d)).collect();
        assert_eq!(order, vec![(4, 0), (2, 2), (3, 2)]);
    }

    #[test]
    fn test_rank_by_distance_zero_limit() {
        assert!(rank_by_distance(vec![hit(1, 0)], 0).is_empty());
    }

    #[test]
    fn test_retention_cutoff() {
        assert_eq!(retention_cutoff(10 * SECONDS_PER_DAY, 3), 7 * SECONDS_PER_DAY);
        assert_eq!(retention_cutoff(100, 1), 0);
        assert_eq!(retention_cutoff(100, 0), 100);
    }
}
