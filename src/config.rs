//! Configuration for the strain sensor agent.
//!
//! Every threshold, weight and normalization constant the engine uses lives
//! here so a device or a person can be recalibrated without a rebuild.

use crate::core::risk::RiskWeights;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Period of the aggregation/scoring tick
    #[serde(with = "duration_serde::millis")]
    pub tick_interval: Duration,

    /// Rolling window length W, in ticks (one tick per second by default)
    pub window_ticks: usize,

    /// Raw-value thresholds for the per-tick predicates
    pub thresholds: Thresholds,

    /// Risk model parameters
    pub scoring: ScoringConfig,

    /// Divisors used to map raw values and streaks onto [0, 1]
    pub normalization: Normalization,

    /// One-shot baseline calibration
    pub calibration: CalibrationConfig,

    /// Consecutive idle ticks that count as a real microbreak
    pub break_ticks: u32,

    /// Tilt value assumed before the first tilt reading arrives
    pub initial_tilt: f64,

    /// Path for storing session statistics
    pub data_path: PathBuf,

    /// Port for the optional subscriber server
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("strain-sensor-agent");

        Self {
            tick_interval: Duration::from_millis(1000),
            window_ticks: 10,
            thresholds: Thresholds::default(),
            scoring: ScoringConfig::default(),
            normalization: Normalization::default(),
            calibration: CalibrationConfig::default(),
            break_ticks: 20,
            initial_tilt: 700.0,
            data_path: data_dir,
            server_port: 4000,
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the given file.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("strain-sensor-agent")
            .join("config.json")
    }

    /// Path of the persisted session statistics.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("session_stats.json")
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Invalid("tick_interval must be > 0".into()));
        }
        if self.window_ticks == 0 {
            return Err(ConfigError::Invalid("window_ticks must be > 0".into()));
        }
        if u32::try_from(self.window_ticks).is_err() {
            return Err(ConfigError::Invalid(format!(
                "window_ticks must fit in 32 bits, got {}",
                self.window_ticks
            )));
        }
        if self.break_ticks == 0 {
            return Err(ConfigError::Invalid("break_ticks must be > 0".into()));
        }
        let alpha = self.scoring.smoothing_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "smoothing_alpha must be in (0, 1], got {alpha}"
            )));
        }

        let weights = &self.scoring.weights;
        if weights.iter().any(|w| !w.is_finite() || w < 0.0) {
            return Err(ConfigError::Invalid(
                "risk weights must be finite and >= 0".into(),
            ));
        }
        let sum = weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::Invalid(format!(
                "risk weights must sum to 1.0, got {sum:.4}"
            )));
        }

        let n = &self.normalization;
        for (name, divisor) in [
            ("burst_divisor", n.burst_divisor),
            ("static_hold_window_secs", n.static_hold_window_secs),
            ("break_window_minutes", n.break_window_minutes),
            ("right_finger_divisor", n.right_finger_divisor),
            ("left_finger_divisor", n.left_finger_divisor),
        ] {
            if !divisor.is_finite() || divisor <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be finite and > 0, got {divisor}"
                )));
            }
        }
        if !n.bursts_output_scale.is_finite() || n.bursts_output_scale < 0.0 {
            return Err(ConfigError::Invalid(
                "bursts_output_scale must be finite and >= 0".into(),
            ));
        }

        let t = &self.thresholds;
        let w = &self.scoring.warnings;
        for (name, value) in [
            ("pressure_zero", t.pressure_zero),
            ("pressure_light", t.pressure_light),
            ("pressure_heavy", t.pressure_heavy),
            ("tilt_sideways", t.tilt_sideways),
            ("tilt_neutral", t.tilt_neutral),
            ("acc_slight", t.acc_slight),
            ("acc_burst", t.acc_burst),
            ("acc_static", t.acc_static),
            ("initial_tilt", self.initial_tilt),
            ("default_light_press", self.calibration.default_light_press),
            ("heavy_press_pct", w.heavy_press_pct),
            ("extreme_tilt_pct", w.extreme_tilt_pct),
            ("minutes_since_break", w.minutes_since_break),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be finite")));
            }
        }
        if t.pressure_zero > t.pressure_light {
            return Err(ConfigError::Invalid(
                "pressure_zero must not exceed pressure_light".into(),
            ));
        }
        if t.pressure_light > t.pressure_heavy {
            return Err(ConfigError::Invalid(
                "pressure_light must not exceed pressure_heavy".into(),
            ));
        }
        if t.tilt_sideways > t.tilt_neutral {
            return Err(ConfigError::Invalid(
                "tilt_sideways must not exceed tilt_neutral".into(),
            ));
        }

        Ok(())
    }
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Raw-value thresholds.
///
/// Pressure values are in the device's raw units, acceleration thresholds
/// apply to per-axis deltas and their combined magnitude. Lower tilt values
/// mean the hand is rotated further sideways.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Below this combined pressure the hand counts as resting
    pub pressure_zero: f64,
    /// Minimum combined pressure of a light press
    pub pressure_light: f64,
    /// Minimum combined pressure of a heavy press
    pub pressure_heavy: f64,
    /// Tilt strictly below this is sideways-right
    pub tilt_sideways: f64,
    /// Tilt at or above this is neutral
    pub tilt_neutral: f64,
    /// Largest motion magnitude still accepted for calibration samples
    pub acc_slight: f64,
    /// Motion magnitude above which a tick counts as a burst
    pub acc_burst: f64,
    /// Motion magnitude below which the hand counts as still
    pub acc_static: f64,
    /// Exclude heavy presses from the static-hold streak
    pub static_hold_excludes_heavy: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pressure_zero: 5.0,
            pressure_light: 10.0,
            pressure_heavy: 150.0,
            tilt_sideways: 100.0,
            tilt_neutral: 650.0,
            acc_slight: 10.0,
            acc_burst: 14.0,
            acc_static: 5.0,
            static_hold_excludes_heavy: true,
        }
    }
}

/// Risk model parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// EMA smoothing constant
    pub smoothing_alpha: f64,
    pub weights: RiskWeights,
    pub warnings: WarningLimits,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: 0.3,
            weights: RiskWeights::default(),
            warnings: WarningLimits::default(),
        }
    }
}

/// Limits above which advisory warnings are raised.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningLimits {
    pub heavy_press_pct: f64,
    pub extreme_tilt_pct: f64,
    pub static_hold_secs: u32,
    pub minutes_since_break: f64,
}

impl Default for WarningLimits {
    fn default() -> Self {
        Self {
            heavy_press_pct: 0.25,
            extreme_tilt_pct: 0.30,
            static_hold_secs: 45,
            minutes_since_break: 10.0,
        }
    }
}

/// Normalization divisors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Normalization {
    /// Burst count that maps to a burst norm of 1.0
    pub burst_divisor: f64,
    /// Static-hold streak (seconds) that maps to 1.0
    pub static_hold_window_secs: f64,
    /// Minutes without a break that map to 1.0
    pub break_window_minutes: f64,
    /// Full-scale reading of the right finger sensor (Pressure1)
    pub right_finger_divisor: f64,
    /// Full-scale reading of the left finger sensor (Pressure2)
    pub left_finger_divisor: f64,
    /// Extra display gain applied to burstsNorm before clamping
    pub bursts_output_scale: f64,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            burst_divisor: 6.0,
            static_hold_window_secs: 60.0,
            break_window_minutes: 10.0,
            right_finger_divisor: 70.0,
            left_finger_divisor: 18.0,
            bursts_output_scale: 1.0,
        }
    }
}

/// Baseline calibration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Length of the calibration time-box after start
    #[serde(with = "duration_serde::secs")]
    pub duration: Duration,
    /// Calibration resolves to the sample mean only with more samples than this
    pub min_samples: u32,
    /// Light-press reference used when too few samples were seen
    pub default_light_press: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(60),
            min_samples: 5,
            default_light_press: 25.0,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration.
mod duration_serde {
    pub mod secs {
        use serde::{Deserialize, Deserializer, Serialize, Serializer};
        use std::time::Duration;

        pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            duration.as_secs().serialize(serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
        where
            D: Deserializer<'de>,
        {
            let secs = u64::deserialize(deserializer)?;
            Ok(Duration::from_secs(secs))
        }
    }

    pub mod millis {
        use serde::{Deserialize, Deserializer, Serialize, Serializer};
        use std::time::Duration;

        pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            (duration.as_millis() as u64).serialize(serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
        where
            D: Deserializer<'de>,
        {
            let millis = u64::deserialize(deserializer)?;
            Ok(Duration::from_millis(millis))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tick_interval, Duration::from_millis(1000));
        assert_eq!(config.window_ticks, 10);
        assert_eq!(config.break_ticks, 20);
        assert_eq!(config.thresholds.pressure_heavy, 150.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"window_ticks": 30, "thresholds": {"pressure_heavy": 200}}"#)
                .unwrap();
        assert_eq!(config.window_ticks, 30);
        assert_eq!(config.thresholds.pressure_heavy, 200.0);
        assert_eq!(config.thresholds.pressure_light, 10.0);
        assert_eq!(config.calibration.duration, Duration::from_secs(60));
    }

    #[test]
    fn test_durations_serialize_as_numbers() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["tick_interval"], 1000);
        assert_eq!(json["calibration"]["duration"], 60);
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        let mut config = Config::default();
        config.scoring.weights.heavy_press = 0.9;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = Config {
            window_ticks: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_alpha_out_of_range() {
        let mut config = Config::default();
        config.scoring.smoothing_alpha = 0.0;
        assert!(config.validate().is_err());
        config.scoring.smoothing_alpha = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_break_ticks() {
        let config = Config {
            break_ticks: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_nan_weight() {
        let mut config = Config::default();
        config.scoring.weights.burst = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_divisors() {
        let mut config = Config::default();
        config.normalization.left_finger_divisor = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.normalization.burst_divisor = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.normalization.bursts_output_scale = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_thresholds() {
        let mut config = Config::default();
        config.thresholds.acc_burst = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scoring.warnings.minutes_since_break = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_misordered_thresholds() {
        let mut config = Config::default();
        config.thresholds.pressure_zero = 12.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.thresholds.pressure_light = 200.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.thresholds.tilt_sideways = 700.0;
        assert!(config.validate().is_err());

        // Equal bounds are allowed.
        let mut config = Config::default();
        config.thresholds.pressure_zero = config.thresholds.pressure_light;
        config.thresholds.tilt_sideways = config.thresholds.tilt_neutral;
        assert!(config.validate().is_ok());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_validate_rejects_oversized_window() {
        let config = Config {
            window_ticks: u32::MAX as usize + 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = std::env::temp_dir()
            .join(format!("strain-sensor-config-{}", uuid::Uuid::new_v4()))
            .join("config.json");

        let mut config = Config::default();
        config.break_ticks = 33;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.break_ticks, 33);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
