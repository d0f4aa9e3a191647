//! Tick-indexed rolling window of per-tick predicates.
//!
//! One slot per tick, written at `tick mod W`. The oldest slot is overwritten
//! in place and running counts are adjusted on overwrite, so a tick costs the
//! same for any W.

use serde::{Deserialize, Serialize};

/// Instantaneous predicates evaluated once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickPredicates {
    pub heavy_press: bool,
    pub extreme_tilt: bool,
    pub burst: bool,
}

/// Features derived from the window after a tick was recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowFeatures {
    /// Share of the window spent pressing heavily, in [0, 1]
    pub heavy_press_pct: f64,
    /// Share of the window spent rotated sideways, in [0, 1]
    pub extreme_tilt_pct: f64,
    /// Ticks in the window with a motion burst
    pub burst_count: u32,
    /// `burst_count / divisor`, clamped to [0, 1]
    pub burst_norm: f64,
}

#[derive(Debug, Clone)]
pub struct RollingWindow {
    heavy_press: Vec<bool>,
    extreme_tilt: Vec<bool>,
    bursts: Vec<u8>,
    index: usize,
    heavy_press_count: usize,
    extreme_tilt_count: usize,
    burst_count: u32,
    burst_divisor: f64,
}

impl RollingWindow {
    /// Create a window of `size` slots, all initially false.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize, burst_divisor: f64) -> Self {
        assert!(size > 0, "rolling window needs at least one slot");
        Self {
            heavy_press: vec![false; size],
            extreme_tilt: vec![false; size],
            bursts: vec![0; size],
            index: 0,
            heavy_press_count: 0,
            extreme_tilt_count: 0,
            burst_count: 0,
            burst_divisor,
        }
    }

    pub fn size(&self) -> usize {
        self.heavy_press.len()
    }

    /// Slot the next tick will be written to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Overwrite the current slot and advance.
    pub fn record(&mut self, now: TickPredicates) -> WindowFeatures {
        let i = self.index;

        replace_flag(&mut self.heavy_press[i], now.heavy_press, &mut self.heavy_press_count);
        replace_flag(&mut self.extreme_tilt[i], now.extreme_tilt, &mut self.extreme_tilt_count);

        let burst = u8::from(now.burst);
        self.burst_count = self.burst_count - u32::from(self.bursts[i]) + u32::from(burst);
        self.bursts[i] = burst;

        self.index = (i + 1) % self.size();
        self.features()
    }

    pub fn features(&self) -> WindowFeatures {
        let size = self.size() as f64;
        WindowFeatures {
            heavy_press_pct: self.heavy_press_count as f64 / size,
            extreme_tilt_pct: self.extreme_tilt_count as f64 / size,
            burst_count: self.burst_count,
            burst_norm: clamp01(f64::from(self.burst_count) / self.burst_divisor),
        }
    }
}

fn replace_flag(slot: &mut bool, value: bool, count: &mut usize) {
    match (*slot, value) {
        (false, true) => *count += 1,
        (true, false) => *count -= 1,
        _ => {}
    }
    *slot = value;
}

/// Clamp into [0, 1], mapping NaN to 0.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEAVY: TickPredicates = TickPredicates {
        heavy_press: true,
        extreme_tilt: false,
        burst: false,
    };

    #[test]
    fn test_heavy_press_share() {
        let mut window = RollingWindow::new(10, 6.0);
        let mut features = WindowFeatures::default();
        for _ in 0..3 {
            features = window.record(HEAVY);
        }
        assert!((features.heavy_press_pct - 0.3).abs() < 1e-12);
        assert_eq!(features.extreme_tilt_pct, 0.0);
    }

    #[test]
    fn test_oldest_slot_is_overwritten() {
        let mut window = RollingWindow::new(4, 6.0);
        for _ in 0..4 {
            window.record(HEAVY);
        }
        assert_eq!(window.features().heavy_press_pct, 1.0);
        assert_eq!(window.index(), 0);

        // Each quiet tick evicts exactly one heavy slot.
        for remaining in (0..4).rev() {
            let features = window.record(TickPredicates::default());
            assert_eq!(features.heavy_press_pct, remaining as f64 / 4.0);
        }
    }

    #[test]
    fn test_percentages_stay_bounded() {
        let mut window = RollingWindow::new(3, 6.0);
        for i in 0..50 {
            let features = window.record(TickPredicates {
                heavy_press: i % 2 == 0,
                extreme_tilt: i % 3 != 0,
                burst: true,
            });
            assert!((0.0..=1.0).contains(&features.heavy_press_pct));
            assert!((0.0..=1.0).contains(&features.extreme_tilt_pct));
            assert!((0.0..=1.0).contains(&features.burst_norm));
            assert!(features.burst_count <= 3);
        }
    }

    #[test]
    fn test_burst_norm_clamps() {
        let mut window = RollingWindow::new(10, 6.0);
        let burst = TickPredicates {
            burst: true,
            ..TickPredicates::default()
        };
        let mut features = WindowFeatures::default();
        for _ in 0..3 {
            features = window.record(burst);
        }
        assert_eq!(features.burst_count, 3);
        assert!((features.burst_norm - 0.5).abs() < 1e-12);

        for _ in 0..7 {
            features = window.record(burst);
        }
        assert_eq!(features.burst_count, 10);
        assert_eq!(features.burst_norm, 1.0);
    }

    #[test]
    fn test_clamp01() {
        assert_eq!(clamp01(-0.5), 0.0);
        assert_eq!(clamp01(1.7), 1.0);
        assert_eq!(clamp01(0.25), 0.25);
        assert_eq!(clamp01(f64::NAN), 0.0);
    }
}
