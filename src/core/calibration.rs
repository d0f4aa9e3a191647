//! One-shot baseline calibration of the wearer's light press.
//!
//! During a fixed time-box after start, ticks with a light, steady press are
//! averaged. When the time-box ends the calibrator resolves exactly once,
//! falling back to a default if too few samples qualified. The result is
//! exposed for threshold personalization; nothing consumes it yet.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Resolved light-press reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub light_press: f64,
    pub samples: u32,
    /// True when too few samples qualified and the default was kept
    pub used_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CalibrationState {
    Collecting {
        sum: f64,
        count: u32,
        started_at: DateTime<Utc>,
    },
    Resolved(Baseline),
}

/// Bounds a tick has to fall within to count as a calibration sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationBand {
    pub pressure_min: f64,
    pub pressure_max: f64,
    pub motion_max: f64,
}

impl CalibrationBand {
    fn accepts(&self, pressure: f64, motion: f64) -> bool {
        (self.pressure_min..=self.pressure_max).contains(&pressure) && motion <= self.motion_max
    }
}

#[derive(Debug, Clone)]
pub struct BaselineCalibrator {
    state: CalibrationState,
    duration: Duration,
    min_samples: u32,
    default_light_press: f64,
    band: CalibrationBand,
}

impl BaselineCalibrator {
    pub fn new(
        started_at: DateTime<Utc>,
        duration: Duration,
        min_samples: u32,
        default_light_press: f64,
        band: CalibrationBand,
    ) -> Self {
        Self {
            state: CalibrationState::Collecting {
                sum: 0.0,
                count: 0,
                started_at,
            },
            duration,
            min_samples,
            default_light_press,
            band,
        }
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    pub fn baseline(&self) -> Option<Baseline> {
        match self.state {
            CalibrationState::Resolved(baseline) => Some(baseline),
            CalibrationState::Collecting { .. } => None,
        }
    }

    /// Feed one tick.
    ///
    /// Returns the baseline on the tick it resolves, `None` on every other
    /// tick. The resolving tick itself is not accumulated.
    pub fn observe(&mut self, pressure: f64, motion: f64, now: DateTime<Utc>) -> Option<Baseline> {
        let CalibrationState::Collecting {
            sum,
            count,
            started_at,
        } = &mut self.state
        else {
            return None;
        };

        if now - *started_at < self.duration {
            if self.band.accepts(pressure, motion) {
                *sum += pressure;
                *count += 1;
            }
            return None;
        }

        let baseline = if *count > self.min_samples {
            Baseline {
                light_press: *sum / f64::from(*count),
                samples: *count,
                used_default: false,
            }
        } else {
            Baseline {
                light_press: self.default_light_press,
                samples: *count,
                used_default: true,
            }
        };

        self.state = CalibrationState::Resolved(baseline);
        Some(baseline)
    }
}
