//! Rolling statistics engine.
//!
//! Maintains a fixed-capacity window of recent prices with incrementally
//! updated mean and variance, and enriches each trade event into a
//! [`Snapshot`] via the anomaly classifier.

use crate::classify::{classify, is_whale};
use crate::config::Config;
use crate::event::{Snapshot, SnapshotStats, Status, TradeEvent};
use std::collections::VecDeque;

/// Rolling price window with O(1) amortized mean / std-dev updates.
///
/// The engine is the sole writer of the window: it is owned by the single
/// ingestion task and never shared, so the hot path takes no locks. Window
/// state persists across feed gaps - it never resets.
#[derive(Debug, Clone)]
pub struct RollingStats {
    /// Prices in arrival order, bounded at `capacity`
    window: VecDeque<f64>,
    capacity: usize,
    /// Running sum of window prices
    sum: f64,
    /// Running sum of squared window prices
    sum_sq: f64,
    sigma_threshold: f64,
    whale_threshold: f64,
}

impl RollingStats {
    pub fn new(config: &Config) -> Self {
        Self {
            window: VecDeque::with_capacity(config.window_size),
            capacity: config.window_size.max(1),
            sum: 0.0,
            sum_sq: 0.0,
            sigma_threshold: config.sigma_threshold,
            whale_threshold: config.whale_threshold,
        }
    }

    /// Observe one trade event: admit its price into the window (evicting the
    /// oldest entry if at capacity) and produce the enriched snapshot.
    pub fn observe(&mut self, event: &TradeEvent) -> Snapshot {
        if self.window.len() >= self.capacity {
            if let Some(evicted) = self.window.pop_front() {
                self.sum -= evicted;
                self.sum_sq -= evicted * evicted;
            }
        }

        self.window.push_back(event.price);
        self.sum += event.price;
        self.sum_sq += event.price * event.price;

        let mean = self.mean();
        let std_dev = self.std_dev(mean);

        // Degenerate window (single sample or zero variance): z-score is
        // undefined, report 0 and the INIT status instead of NaN/Inf.
        let (z_score, status) = if self.window.len() < 2 || std_dev == 0.0 {
            (0.0, Status::Init)
        } else {
            let z_score = (event.price - mean) / std_dev;
            let (status, _) = classify(
                z_score,
                event.volume,
                self.sigma_threshold,
                self.whale_threshold,
            );
            (z_score, status)
        };

        Snapshot {
            price: event.price,
            volume: event.volume,
            is_whale: is_whale(event.volume, self.whale_threshold),
            stats: SnapshotStats {
                mean_price: mean,
                std_dev,
                z_score,
                status,
            },
            time: event.time,
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Prices currently held, oldest first.
    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().copied()
    }

    fn mean(&self) -> f64 {
        // observe() always inserts before computing, so the window is non-empty
        self.sum / self.window.len() as f64
    }

    /// Population standard deviation over the window.
    ///
    /// Floating-point cancellation in `sum_sq/n - mean^2` can dip fractionally
    /// below zero for near-constant prices; clamp before the square root.
    fn std_dev(&self, mean: f64) -> f64 {
        let n = self.window.len() as f64;
        let variance = (self.sum_sq / n - mean * mean).max(0.0);
        variance.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn config(window_size: usize) -> Config {
        Config {
            window_size,
            ..Config::default()
        }
    }

    fn event(price: f64) -> TradeEvent {
        TradeEvent {
            price,
            volume: 1_000.0,
            time: Utc::now(),
        }
    }

    #[test]
    fn test_window_bounded_and_ordered() {
        let mut engine = RollingStats::new(&config(3));

        for price in [1.0, 2.0, 3.0, 4.0, 5.0] {
            engine.observe(&event(price));
            assert!(engine.len() <= 3);
        }

        // Window holds exactly the last min(count, N) prices in arrival order
        let held: Vec<f64> = engine.prices().collect();
        assert_eq!(held, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_partial_window_holds_all_observed() {
        let mut engine = RollingStats::new(&config(10));
        engine.observe(&event(7.0));
        engine.observe(&event(8.0));

        let held: Vec<f64> = engine.prices().collect();
        assert_eq!(held, vec![7.0, 8.0]);
    }

    #[test]
    fn test_flat_prices_are_init_not_nan() {
        let mut engine = RollingStats::new(&config(100));

        for _ in 0..50 {
            let snapshot = engine.observe(&event(42.0));
            assert_eq!(snapshot.stats.std_dev, 0.0);
            assert_eq!(snapshot.stats.z_score, 0.0);
            assert_eq!(snapshot.stats.status, Status::Init);
            assert!(snapshot.stats.mean_price.is_finite());
        }
    }

    #[test]
    fn test_single_sample_is_init() {
        let mut engine = RollingStats::new(&config(100));
        let snapshot = engine.observe(&event(123.45));

        assert_eq!(snapshot.stats.status, Status::Init);
        assert_eq!(snapshot.stats.z_score, 0.0);
        assert_eq!(snapshot.stats.mean_price, 123.45);
    }

    #[test]
    fn test_small_window_progression_from_flat_to_neutral() {
        let mut engine = RollingStats::new(&config(3));

        // [100, 100, 100] -> mean 100, std 0, INIT
        engine.observe(&event(100.0));
        engine.observe(&event(100.0));
        let snapshot = engine.observe(&event(100.0));
        assert_eq!(snapshot.stats.mean_price, 100.0);
        assert_eq!(snapshot.stats.std_dev, 0.0);
        assert_eq!(snapshot.stats.status, Status::Init);

        // Observe 130 -> window [100, 100, 130], mean 110, std ~14.14, z ~1.41
        let snapshot = engine.observe(&event(130.0));
        assert!((snapshot.stats.mean_price - 110.0).abs() < 1e-9);
        assert!((snapshot.stats.std_dev - 14.142).abs() < 0.01);
        assert!((snapshot.stats.z_score - 1.414).abs() < 0.01);
        assert_eq!(snapshot.stats.status, Status::Neutral);

        // Observe 200 -> eviction shifts both mean and std before the
        // threshold is crossed: window [100, 130, 200], mean ~143.3,
        // std ~41.9, z ~1.35, still NEUTRAL
        let snapshot = engine.observe(&event(200.0));
        assert!((snapshot.stats.mean_price - 143.3333).abs() < 0.01);
        assert!((snapshot.stats.std_dev - 41.8994).abs() < 0.01);
        assert!((snapshot.stats.z_score - 1.3525).abs() < 0.01);
        assert_eq!(snapshot.stats.status, Status::Neutral);
    }

    #[test]
    fn test_pump_detected_on_spike() {
        let mut engine = RollingStats::new(&config(100));
        for _ in 0..9 {
            engine.observe(&event(100.0));
        }

        // Window [100 x9, 200]: mean 110, std 30, z = 3.0
        let snapshot = engine.observe(&event(200.0));
        assert!((snapshot.stats.z_score - 3.0).abs() < 1e-9);
        assert_eq!(snapshot.stats.status, Status::Pump);
    }

    #[test]
    fn test_dump_detected_on_crash() {
        let mut engine = RollingStats::new(&config(100));
        for _ in 0..9 {
            engine.observe(&event(100.0));
        }

        // Window [100 x9, 40]: mean 94, std 18, z = -3.0
        let snapshot = engine.observe(&event(40.0));
        assert!((snapshot.stats.z_score + 3.0).abs() < 1e-9);
        assert_eq!(snapshot.stats.status, Status::Dump);
    }

    #[test]
    fn test_whale_flag_during_init() {
        let mut engine = RollingStats::new(&config(100));
        let snapshot = engine.observe(&TradeEvent {
            price: 100.0,
            volume: 50_000.0,
            time: Utc::now(),
        });

        // Whale detection is independent of statistical calibration
        assert_eq!(snapshot.stats.status, Status::Init);
        assert!(snapshot.is_whale);
    }

    #[test]
    fn test_eviction_keeps_running_sums_consistent() {
        let mut engine = RollingStats::new(&config(5));

        for price in [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0] {
            engine.observe(&event(price));
        }

        // Incremental sums must agree with a full rescan of the window
        let held: Vec<f64> = engine.prices().collect();
        assert_eq!(held, vec![30.0, 40.0, 50.0, 60.0, 70.0]);
        let mean = held.iter().sum::<f64>() / held.len() as f64;
        let variance =
            held.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / held.len() as f64;

        assert!((engine.mean() - mean).abs() < 1e-9);
        assert!((engine.std_dev(mean) - variance.sqrt()).abs() < 1e-9);
    }
}
