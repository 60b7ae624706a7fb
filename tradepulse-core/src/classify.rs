//! Anomaly classifier.
//!
//! Pure, deterministic thresholding over the rolling z-score and the trade's
//! quote-notional volume. Any randomized "interesting trade" sampling belongs
//! to the presentation layer, not here.

use crate::event::Status;

/// Classify a trade from its z-score and volume.
///
/// Returns `(status, is_whale)`. Thresholds are strict for PUMP / DUMP
/// (a z-score of exactly +/- sigma is NEUTRAL) and inclusive for the whale
/// flag (`volume >= whale_threshold`).
pub fn classify(
    z_score: f64,
    volume: f64,
    sigma_threshold: f64,
    whale_threshold: f64,
) -> (Status, bool) {
    let status = if z_score > sigma_threshold {
        Status::Pump
    } else if z_score < -sigma_threshold {
        Status::Dump
    } else {
        Status::Neutral
    };

    (status, is_whale(volume, whale_threshold))
}

/// Whale flag: pure function of volume and the configured threshold.
pub fn is_whale(volume: f64, whale_threshold: f64) -> bool {
    volume >= whale_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_thresholds() {
        struct TestCase {
            z_score: f64,
            expected: Status,
        }

        let tests = vec![
            TestCase {
                // TC0: well above threshold
                z_score: 3.5,
                expected: Status::Pump,
            },
            TestCase {
                // TC1: just above threshold
                z_score: 2.0001,
                expected: Status::Pump,
            },
            TestCase {
                // TC2: exactly on the boundary is non-anomalous
                z_score: 2.0,
                expected: Status::Neutral,
            },
            TestCase {
                // TC3: exactly on the negative boundary is non-anomalous
                z_score: -2.0,
                expected: Status::Neutral,
            },
            TestCase {
                // TC4: just below the negative threshold
                z_score: -2.0001,
                expected: Status::Dump,
            },
            TestCase {
                // TC5: zero is neutral
                z_score: 0.0,
                expected: Status::Neutral,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let (status, _) = classify(test.z_score, 0.0, 2.0, 50_000.0);
            assert_eq!(status, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_whale_boundary_is_inclusive() {
        assert!(is_whale(50_000.0, 50_000.0));
        assert!(is_whale(50_000.01, 50_000.0));
        assert!(!is_whale(49_999.99, 50_000.0));
    }

    #[test]
    fn test_custom_sigma_threshold() {
        let (status, _) = classify(2.5, 0.0, 3.0, 50_000.0);
        assert_eq!(status, Status::Neutral);

        let (status, _) = classify(3.1, 0.0, 3.0, 50_000.0);
        assert_eq!(status, Status::Pump);
    }
}
