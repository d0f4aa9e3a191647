//! Core functionality for the strain sensor agent.
//!
//! This module contains:
//! - Line decoding into typed channel samples
//! - The latest-sample store and its wall-clock pruned logs
//! - The tick-indexed rolling window, streak trackers and baseline calibration
//! - The risk model and the published snapshot
//! - The [`Engine`] tying them together

pub mod calibration;
pub mod decoder;
pub mod engine;
pub mod risk;
pub mod snapshot;
pub mod state;
pub mod streaks;
pub mod streams;
pub mod window;

// Re-export commonly used types
pub use calibration::{Baseline, BaselineCalibrator, CalibrationState};
pub use decoder::{decode_line, ChannelKind, RawSample};
pub use engine::{Engine, TickReport, TiltPosture};
pub use risk::{RiskInputs, RiskScore, RiskScorer, RiskWeights, Warning};
pub use snapshot::Snapshot;
pub use state::{LatestState, SampleStore};
pub use streaks::{MicrobreakTracker, StaticHoldTracker};
pub use streams::{PrunedLog, StreamSummary, StreamsSummary};
pub use window::{clamp01, RollingWindow, TickPredicates, WindowFeatures};
