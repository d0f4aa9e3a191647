//! Atomic session counters with optional persistence.

use crate::core::ChannelKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current session.
#[derive(Debug)]
pub struct SessionLog {
    /// Raw lines received from the source
    lines_received: AtomicU64,
    /// Lines that did not decode
    lines_dropped: AtomicU64,
    /// Decoded samples, indexed like `ChannelKind::ALL`
    samples: [AtomicU64; 5],
    /// Ticks run
    ticks: AtomicU64,
    /// Snapshots that reached at least one subscriber
    snapshots_delivered: AtomicU64,
    /// Warnings raised across all ticks
    warnings_raised: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            lines_received: AtomicU64::new(0),
            lines_dropped: AtomicU64::new(0),
            samples: Default::default(),
            ticks: AtomicU64::new(0),
            snapshots_delivered: AtomicU64::new(0),
            warnings_raised: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log that is saved to `path`.
    ///
    /// Counters always start at zero; the file holds the latest session only.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);
        log
    }

    /// Record one raw line and whether it decoded.
    pub fn record_line(&self, decoded: Option<ChannelKind>) {
        self.lines_received.fetch_add(1, Ordering::Relaxed);
        match decoded {
            Some(kind) => {
                self.samples[channel_index(kind)].fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.lines_dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record a completed tick.
    pub fn record_tick(&self, warnings: usize, delivered: bool) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.warnings_raised
            .fetch_add(warnings as u64, Ordering::Relaxed);
        if delivered {
            self.snapshots_delivered.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> SessionStats {
        let samples = |kind: ChannelKind| self.samples[channel_index(kind)].load(Ordering::Relaxed);
        SessionStats {
            lines_received: self.lines_received.load(Ordering::Relaxed),
            lines_dropped: self.lines_dropped.load(Ordering::Relaxed),
            x_samples: samples(ChannelKind::AxisX),
            y_samples: samples(ChannelKind::AxisY),
            tilt_samples: samples(ChannelKind::Tilt),
            pressure1_samples: samples(ChannelKind::PressureA),
            pressure2_samples: samples(ChannelKind::PressureB),
            ticks: self.ticks.load(Ordering::Relaxed),
            snapshots_delivered: self.snapshots_delivered.load(Ordering::Relaxed),
            warnings_raised: self.warnings_raised.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Lines received: {}\n\
             - Lines dropped: {} ({:.1}%)\n\
             - Samples: X {} / Y {} / Tilt {} / Pressure1 {} / Pressure2 {}\n\
             - Ticks: {}\n\
             - Snapshots delivered: {}\n\
             - Warnings raised: {}\n\
             - Session duration: {} seconds",
            stats.lines_received,
            stats.lines_dropped,
            stats.drop_rate() * 100.0,
            stats.x_samples,
            stats.y_samples,
            stats.tilt_samples,
            stats.pressure1_samples,
            stats.pressure2_samples,
            stats.ticks,
            stats.snapshots_delivered,
            stats.warnings_raised,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk, if persistence is configured.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let json =
                serde_json::to_string_pretty(&self.stats()).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

fn channel_index(kind: ChannelKind) -> usize {
    match kind {
        ChannelKind::AxisX => 0,
        ChannelKind::AxisY => 1,
        ChannelKind::Tilt => 2,
        ChannelKind::PressureA => 3,
        ChannelKind::PressureB => 4,
    }
}

/// Snapshot of session statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub lines_received: u64,
    pub lines_dropped: u64,
    pub x_samples: u64,
    pub y_samples: u64,
    pub tilt_samples: u64,
    pub pressure1_samples: u64,
    pub pressure2_samples: u64,
    pub ticks: u64,
    pub snapshots_delivered: u64,
    pub warnings_raised: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

impl SessionStats {
    /// Share of received lines that were dropped as noise.
    pub fn drop_rate(&self) -> f64 {
        if self.lines_received == 0 {
            0.0
        } else {
            self.lines_dropped as f64 / self.lines_received as f64
        }
    }
}

/// Thread-safe shared session log.
pub type SharedSessionLog = Arc<SessionLog>;

pub fn create_shared_log() -> SharedSessionLog {
    Arc::new(SessionLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedSessionLog {
    Arc::new(SessionLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_counting() {
        let log = SessionLog::new();

        log.record_line(Some(ChannelKind::PressureA));
        log.record_line(Some(ChannelKind::PressureA));
        log.record_line(Some(ChannelKind::Tilt));
        log.record_line(None);

        let stats = log.stats();
        assert_eq!(stats.lines_received, 4);
        assert_eq!(stats.lines_dropped, 1);
        assert_eq!(stats.pressure1_samples, 2);
        assert_eq!(stats.tilt_samples, 1);
        assert_eq!(stats.x_samples, 0);
        assert!((stats.drop_rate() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_tick_counting() {
        let log = SessionLog::new();
        log.record_tick(2, true);
        log.record_tick(0, false);

        let stats = log.stats();
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.warnings_raised, 2);
        assert_eq!(stats.snapshots_delivered, 1);
    }

    #[test]
    fn test_summary_format() {
        let log = SessionLog::new();
        let summary = log.summary();

        assert!(summary.contains("Lines received"));
        assert!(summary.contains("Lines dropped"));
        assert!(summary.contains("Pressure2"));
        assert_eq!(SessionStats::drop_rate(&log.stats()), 0.0);
    }

    #[test]
    fn test_save_writes_json() {
        let path = std::env::temp_dir()
            .join(format!("strain-sensor-stats-{}", uuid::Uuid::new_v4()))
            .join("session_stats.json");
        let log = SessionLog::with_persistence(path.clone());
        log.record_line(None);
        log.save().unwrap();

        let saved: SessionStats =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.lines_dropped, 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
