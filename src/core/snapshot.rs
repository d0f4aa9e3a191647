//! The per-tick record published to subscribers.
//!
//! Field names and ranges are consumed by display clients and must stay
//! stable.

use serde::{Deserialize, Serialize};

/// One published tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Smoothed risk, 0..=100
    pub risk: u8,
    /// Combined (max) pressure of the tick
    pub pressure: f64,
    /// Left finger pad (Pressure2), normalized to [0, 1]
    pub pressure_left_norm: f64,
    /// Right finger pad (Pressure1), normalized to [0, 1]
    pub pressure_right_norm: f64,
    pub tilt: f64,
    pub heavy_press_norm: f64,
    pub static_hold_norm: f64,
    pub bursts_norm: f64,
    pub extreme_tilt_norm: f64,
    pub static_hold_streak_sec: u32,
    pub minutes_since_break: f64,
}
