//! Static-hold and microbreak streak detection.
//!
//! Both trackers count consecutive qualifying ticks and reset to zero the
//! first tick the predicate fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::window::clamp01;

/// Consecutive ticks of pressing without moving.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticHoldTracker {
    streak: u32,
}

impl StaticHoldTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one tick and return the current streak.
    pub fn update(&mut self, holding: bool) -> u32 {
        if holding {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.streak = 0;
        }
        self.streak
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// `streak / window_secs`, clamped to [0, 1].
    pub fn norm(&self, window_secs: f64) -> f64 {
        clamp01(f64::from(self.streak) / window_secs)
    }
}

/// Consecutive idle ticks, and the moment the last real break completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicrobreakTracker {
    streak: u32,
    break_ticks: u32,
    last_break_at: DateTime<Utc>,
}

impl MicrobreakTracker {
    /// The "time since break" clock starts at `started_at`.
    pub fn new(break_ticks: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            streak: 0,
            break_ticks,
            last_break_at: started_at,
        }
    }

    /// Advance by one tick.
    ///
    /// Returns `true` on the single tick where the idle streak reaches the
    /// break length; longer idle periods do not fire again.
    pub fn update(&mut self, idle: bool, now: DateTime<Utc>) -> bool {
        if !idle {
            self.streak = 0;
            return false;
        }

        self.streak = self.streak.saturating_add(1);
        if self.streak == self.break_ticks {
            self.last_break_at = now;
            true
        } else {
            false
        }
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn last_break_at(&self) -> DateTime<Utc> {
        self.last_break_at
    }

    pub fn minutes_since_break(&self, now: DateTime<Utc>) -> f64 {
        let elapsed_ms = (now - self.last_break_at).num_milliseconds().max(0);
        elapsed_ms as f64 / 60_000.0
    }

    /// `minutes_since_break / window_minutes`, clamped to [0, 1].
    pub fn norm(&self, now: DateTime<Utc>, window_minutes: f64) -> f64 {
        clamp01(self.minutes_since_break(now) / window_minutes)
    }
}
