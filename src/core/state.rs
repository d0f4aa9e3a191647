//! Latest value per channel and the motion magnitude derived from it.

use crate::core::decoder::{ChannelKind, RawSample};
use crate::core::streams::SampleStreams;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Most recent reading of every channel.
///
/// Combined pressure is always derived from the two pads, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatestState {
    pub pressure_a: f64,
    pub pressure_b: f64,
    pub tilt: f64,
    pub axis_x: f64,
    pub axis_y: f64,
    pub delta_x: f64,
    pub delta_y: f64,
    /// `hypot(|delta_x|, |delta_y|)`
    pub motion_magnitude: f64,
    pub last_update: Option<DateTime<Utc>>,
}

impl LatestState {
    pub fn new(initial_tilt: f64) -> Self {
        Self {
            pressure_a: 0.0,
            pressure_b: 0.0,
            tilt: initial_tilt,
            axis_x: 0.0,
            axis_y: 0.0,
            delta_x: 0.0,
            delta_y: 0.0,
            motion_magnitude: 0.0,
            last_update: None,
        }
    }

    /// Larger of the two pressure pads.
    pub fn combined_pressure(&self) -> f64 {
        self.pressure_a.max(self.pressure_b)
    }

    fn recompute_magnitude(&mut self) -> f64 {
        self.motion_magnitude = self.delta_x.abs().hypot(self.delta_y.abs());
        self.motion_magnitude
    }
}

/// Sample store: latest state plus the wall-clock logs it feeds.
#[derive(Debug, Clone)]
pub struct SampleStore {
    latest: LatestState,
    streams: SampleStreams,
}

impl SampleStore {
    pub fn new(initial_tilt: f64, log_age: Duration) -> Self {
        Self {
            latest: LatestState::new(initial_tilt),
            streams: SampleStreams::new(log_age),
        }
    }

    pub fn latest(&self) -> &LatestState {
        &self.latest
    }

    pub fn streams(&self) -> &SampleStreams {
        &self.streams
    }

    pub fn streams_mut(&mut self) -> &mut SampleStreams {
        &mut self.streams
    }

    /// Apply one decoded sample.
    ///
    /// Axis samples update their delta against the previous reading of the
    /// same axis and recompute the magnitude using the other axis' last delta.
    pub fn apply(&mut self, sample: RawSample) {
        let RawSample {
            kind,
            value,
            arrived_at: at,
        } = sample;
        let latest = &mut self.latest;
        latest.last_update = Some(at);

        match kind {
            ChannelKind::AxisX => {
                latest.delta_x = value - latest.axis_x;
                latest.axis_x = value;
                let magnitude = latest.recompute_magnitude();
                self.streams.motion.push(at, magnitude);
            }
            ChannelKind::AxisY => {
                latest.delta_y = value - latest.axis_y;
                latest.axis_y = value;
                let magnitude = latest.recompute_magnitude();
                self.streams.motion.push(at, magnitude);
            }
            ChannelKind::Tilt => {
                latest.tilt = value;
                self.streams.tilt.push(at, value);
            }
            ChannelKind::PressureA => {
                latest.pressure_a = value;
                self.streams.pressure.push(at, latest.combined_pressure());
            }
            ChannelKind::PressureB => {
                latest.pressure_b = value;
                self.streams.pressure.push(at, latest.combined_pressure());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SampleStore {
        SampleStore::new(700.0, Duration::seconds(10))
    }

    fn sample(kind: ChannelKind, value: f64) -> RawSample {
        RawSample::new(kind, value, Utc::now())
    }

    #[test]
    fn test_defaults() {
        let store = store();
        let latest = store.latest();
        assert_eq!(latest.tilt, 700.0);
        assert_eq!(latest.combined_pressure(), 0.0);
        assert!(latest.last_update.is_none());
    }

    #[test]
    fn test_combined_pressure_is_max_of_pads() {
        let mut store = store();
        store.apply(sample(ChannelKind::PressureA, 40.0));
        store.apply(sample(ChannelKind::PressureB, 90.0));
        assert_eq!(store.latest().combined_pressure(), 90.0);

        store.apply(sample(ChannelKind::PressureB, 10.0));
        assert_eq!(store.latest().combined_pressure(), 40.0);
        assert_eq!(store.streams().pressure.len(), 3);
    }

    #[test]
    fn test_axis_deltas_and_magnitude() {
        let mut store = store();
        store.apply(sample(ChannelKind::AxisX, 100.0));
        store.apply(sample(ChannelKind::AxisY, 50.0));
        store.apply(sample(ChannelKind::AxisX, 103.0));
        store.apply(sample(ChannelKind::AxisY, 54.0));

        let latest = store.latest();
        assert_eq!(latest.delta_x, 3.0);
        assert_eq!(latest.delta_y, 4.0);
        assert!((latest.motion_magnitude - 5.0).abs() < 1e-9);
        assert_eq!(store.streams().motion.len(), 4);
    }

    #[test]
    fn test_negative_delta_uses_absolute_value() {
        let mut store = store();
        store.apply(sample(ChannelKind::AxisX, 10.0));
        store.apply(sample(ChannelKind::AxisX, 4.0));
        assert_eq!(store.latest().delta_x, -6.0);
        assert!((store.latest().motion_magnitude - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_axis_value_settles_motion() {
        let mut store = store();
        store.apply(sample(ChannelKind::AxisX, 0.0));
        store.apply(sample(ChannelKind::AxisY, 0.0));
        assert_eq!(store.latest().motion_magnitude, 0.0);
    }

    #[test]
    fn test_tilt_is_logged() {
        let mut store = store();
        store.apply(sample(ChannelKind::Tilt, 80.0));
        assert_eq!(store.latest().tilt, 80.0);
        assert_eq!(store.streams().tilt.len(), 1);
    }
}
