//! Hamming distance and similarity between fingerprints.
//!
//! The threshold/distance conversion rounds half away from zero:
//! `max_distance = round((1 - threshold) * 64)`. This single rule decides which
//! candidates count as duplicates at threshold boundaries.
//!
//! | Threshold | Max distance |
//! |-----------|--------------|
//! | 0.98 | 1 |
//! | 0.95 | 3 |
//! | 0.90 | 6 |
//! | 0.85 | 10 |

use super::engine::FINGERPRINT_BITS;

/// Number of differing bits between two fingerprints, in `[0, 64]`.
#[must_use]
pub const fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Similarity in `[0.0, 1.0]`: `1 - hamming_distance / 64`.
#[must_use]
pub fn similarity(a: u64, b: u64) -> f64 {
    distance_to_similarity(hamming_distance(a, b))
}

/// Returns whether `similarity(a, b) >= threshold`, together with the similarity.
#[must_use]
pub fn is_similar(a: u64, b: u64, threshold: f64) -> (bool, f64) {
    let score = similarity(a, b);
    (score >= threshold, score)
}

/// Converts a Hamming distance to a similarity.
///
/// Distances above 64 are clamped to 64.
#[must_use]
pub fn distance_to_similarity(distance: u32) -> f64 {
    let distance = distance.min(FINGERPRINT_BITS);
    1.0 - f64::from(distance) / f64::from(FINGERPRINT_BITS)
}

/// Converts a similarity threshold to the largest Hamming distance it admits.
///
/// Rounds half away from zero and clamps the result to `[0, 64]`; non-finite
/// input is treated as 0.0 similarity.
///
/// # Example
///
/// ```rust
/// use simdup::simhash::similarity_to_distance;
///
/// assert_eq!(similarity_to_distance(0.90), 6);
/// assert_eq!(similarity_to_distance(0.85), 10);
/// assert_eq!(similarity_to_distance(1.0), 0);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn similarity_to_distance(similarity: f64) -> u8 {
    let similarity = if similarity.is_finite() {
        similarity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let distance = ((1.0 - similarity) * f64::from(FINGERPRINT_BITS)).round();
    // Clamped to [0, 64] above, so the cast is lossless.
    distance.clamp(0.0, f64::from(FINGERPRINT_BITS)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0.98 => 1 ; "ninety eight percent")]
    #[test_case(0.95 => 3 ; "ninety five percent")]
    #[test_case(0.90 => 6 ; "ninety percent")]
    #[test_case(0.85 => 10 ; "eighty five percent rounds up")]
    #[test_case(1.0 => 0 ; "identical only")]
    #[test_case(0.0 => 64 ; "anything")]
    #[test_case(1.5 => 0 ; "clamped above")]
    #[test_case(-0.2 => 64 ; "clamped below")]
    #[test_case(f64::NAN => 64 ; "nan")]
    fn test_similarity_to_distance(similarity: f64) -> u8 {
        similarity_to_distance(similarity)
    }

    #[test]
    fn test_rounding_boundaries() {
        // (1 - 0.9) * 64 = 6.4 lands below the half and rounds down
        assert_eq!(similarity_to_distance(0.9), 6);
        // 0.9921875 = 1 - 0.5/64, exactly half a bit: rounds away from zero
        assert_eq!(similarity_to_distance(0.992_187_5), 1);
        // Slightly above the half rounds down to 0
        assert_eq!(similarity_to_distance(0.993), 0);
    }

    #[test]
    fn test_round_trip_all_distances() {
        for d in 0..=64u32 {
            let s = distance_to_similarity(d);
            assert_eq!(u32::from(similarity_to_distance(s)), d, "distance {d}");
        }
    }

    #[test]
    fn test_round_trip_non_dyadic() {
        // d/64 is exact in binary for every d, but 1 - d/64 recomputed from a
        // percentage is not: 3/64 = 4.6875% and the float path must still land on 3.
        let s = 1.0 - 4.6875 / 100.0;
        assert_eq!(similarity_to_distance(s), 3);
        let s = 1.0 - 0.1;
        assert_eq!(similarity_to_distance(s), 6);
    }

    #[test]
    fn test_distance_bounds() {
        assert_eq!(hamming_distance(0, 0), 0);
        assert_eq!(hamming_distance(u64::MAX, u64::MAX), 0);
        assert_eq!(hamming_distance(0, u64::MAX), 64);
        assert_eq!(hamming_distance(0b1011, 0b0001), 2);
    }

    #[test]
    fn test_similarity_values() {
        assert!((similarity(0, 0) - 1.0).abs() < f64::EPSILON);
        assert!(similarity(0, u64::MAX).abs() < f64::EPSILON);
        assert!((similarity(0, 0xFFFF_FFFF) - 0.5).abs() < f64::EPSILON);
        assert!((distance_to_similarity(100) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_is_similar_threshold_inclusive() {
        // 6 differing bits -> 0.90625
        let (similar, score) = is_similar(0, 0b11_1111, 0.90625);
        assert!(similar);
        assert!((score - 0.906_25).abs() < f64::EPSILON);

        let (similar, _) = is_similar(0, 0b111_1111, 0.90625);
        assert!(!similar);
    }
}
