//! Strain Sensor Agent - real-time ergonomic strain scoring for wearables.
//!
//! This library turns the line-oriented serial output of a wrist-worn
//! pressure/tilt/motion sensor into a smoothed 0–100 strain risk score,
//! published once per tick to any number of live subscribers.
//!
//! # Signal Handling
//!
//! - **Latest wins**: Only the most recent value per channel drives scoring
//! - **Noise tolerant**: Lines that do not decode are dropped and counted
//! - **Bounded memory**: Rolling windows and sample logs are pruned every tick
//! - **Personal baseline**: A light-press reference is calibrated per session
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Strain Sensor Agent                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │ LineReader  │──▶│   Decoder   │──▶│ SampleStore │       │
//! │  │(serial/file)│   │ (Name:int)  │   │  (latest)   │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                             │ every tick    │
//! │                                             ▼               │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Snapshot   │◀──│ RiskScorer  │◀──│Window/Streak│       │
//! │  │    Hub      │   │   (EMA)     │   │ /Calibration│       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use strain_sensor_agent::{Config, Engine};
//!
//! let mut engine = Engine::new(&Config::default(), Utc::now()).expect("valid config");
//!
//! engine.ingest_line("Pressure1:160", Utc::now());
//! let report = engine.tick(Utc::now());
//! println!("risk {}", report.snapshot.risk);
//! ```

pub mod config;
pub mod core;
pub mod publish;
pub mod runner;
pub mod source;
pub mod stats;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{decode_line, ChannelKind, Engine, RawSample, Snapshot, TickReport, Warning};
pub use publish::{SnapshotHub, SnapshotPublisher, SnapshotSink};
pub use runner::{RunEnd, Runner};
pub use source::{LineReader, LineReaderConfig, LineSource, RawLine, SourceError};
pub use stats::{SessionLog, SessionStats, SharedSessionLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
