//! The scoring engine: one context object owning all per-session state.
//!
//! Lines are applied as they arrive ([`Engine::ingest_line`]); the derived
//! features, streaks, calibration and risk are advanced once per tick
//! ([`Engine::tick`]). The caller owns the engine and must not interleave the
//! two, which a single owner thread guarantees.

use crate::config::{Config, ConfigError, Normalization, Thresholds, WarningLimits};
use crate::core::calibration::{Baseline, BaselineCalibrator, CalibrationBand, CalibrationState};
use crate::core::decoder::{decode_line, RawSample};
use crate::core::risk::{collect_warnings, RiskInputs, RiskScore, RiskScorer, Warning, WarningInputs};
use crate::core::snapshot::Snapshot;
use crate::core::state::{LatestState, SampleStore};
use crate::core::streaks::{MicrobreakTracker, StaticHoldTracker};
use crate::core::streams::StreamsSummary;
use crate::core::window::{clamp01, RollingWindow, TickPredicates, WindowFeatures};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Coarse reading of the tilt sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TiltPosture {
    SidewaysRight,
    Neutral,
    Unknown,
}

impl TiltPosture {
    pub fn classify(tilt: f64, thresholds: &Thresholds) -> Self {
        if tilt < thresholds.tilt_sideways {
            TiltPosture::SidewaysRight
        } else if tilt >= thresholds.tilt_neutral {
            TiltPosture::Neutral
        } else {
            TiltPosture::Unknown
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TiltPosture::SidewaysRight => "sideways-right",
            TiltPosture::Neutral => "neutral",
            TiltPosture::Unknown => "unknown",
        }
    }
}

/// Everything one tick produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// 1-based tick number
    pub tick: u64,
    pub at: DateTime<Utc>,
    pub snapshot: Snapshot,
    pub features: WindowFeatures,
    pub inputs: RiskInputs,
    pub score: RiskScore,
    pub warnings: Vec<Warning>,
    pub posture: TiltPosture,
    pub motion: f64,
    /// Set on the tick a real microbreak completed
    pub break_completed: bool,
    /// Set on the single tick the baseline resolved
    pub baseline_resolved: Option<Baseline>,
    pub streams: StreamsSummary,
}

/// Per-session scoring state.
#[derive(Debug, Clone)]
pub struct Engine {
    thresholds: Thresholds,
    normalization: Normalization,
    warning_limits: WarningLimits,
    store: SampleStore,
    window: RollingWindow,
    static_hold: StaticHoldTracker,
    microbreak: MicrobreakTracker,
    calibrator: BaselineCalibrator,
    scorer: RiskScorer,
    ticks: u64,
}

impl Engine {
    /// Build an engine from a validated configuration.
    pub fn new(config: &Config, started_at: DateTime<Utc>) -> Result<Self, ConfigError> {
        config.validate()?;

        let window_ticks = u32::try_from(config.window_ticks).map_err(|_| {
            ConfigError::Invalid(format!("window_ticks {} is too large", config.window_ticks))
        })?;
        let window_span = config
            .tick_interval
            .checked_mul(window_ticks)
            .and_then(|span| Duration::from_std(span).ok())
            .ok_or_else(|| ConfigError::Invalid("rolling window span is too long".into()))?;
        let calibration_span = Duration::from_std(config.calibration.duration)
            .map_err(|_| ConfigError::Invalid("calibration duration is too long".into()))?;

        let t = &config.thresholds;
        let band = CalibrationBand {
            pressure_min: t.pressure_light,
            pressure_max: t.pressure_heavy,
            motion_max: t.acc_slight,
        };

        Ok(Self {
            thresholds: t.clone(),
            normalization: config.normalization.clone(),
            warning_limits: config.scoring.warnings.clone(),
            store: SampleStore::new(config.initial_tilt, window_span),
            window: RollingWindow::new(config.window_ticks, config.normalization.burst_divisor),
            static_hold: StaticHoldTracker::new(),
            microbreak: MicrobreakTracker::new(config.break_ticks, started_at),
            calibrator: BaselineCalibrator::new(
                started_at,
                calibration_span,
                config.calibration.min_samples,
                config.calibration.default_light_press,
                band,
            ),
            scorer: RiskScorer::new(config.scoring.weights, config.scoring.smoothing_alpha),
            ticks: 0,
        })
    }

    /// Decode and apply one raw line. Noise is dropped and yields `None`.
    pub fn ingest_line(&mut self, line: &str, at: DateTime<Utc>) -> Option<RawSample> {
        let Some((kind, value)) = decode_line(line) else {
            tracing::trace!(line, "dropped undecodable line");
            return None;
        };

        let sample = RawSample::new(kind, value, at);
        self.ingest(sample);
        Some(sample)
    }

    pub fn ingest(&mut self, sample: RawSample) {
        self.store.apply(sample);
    }

    /// Advance the window, streaks, calibration and risk by one tick.
    ///
    /// Runs whether or not new samples arrived since the previous tick.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        self.ticks += 1;
        self.store.streams_mut().prune(now);

        let latest = *self.store.latest();
        let t = &self.thresholds;
        let n = &self.normalization;
        let pressure = latest.combined_pressure();
        let motion = latest.motion_magnitude;

        let features = self.window.record(TickPredicates {
            heavy_press: pressure >= t.pressure_heavy,
            extreme_tilt: latest.tilt < t.tilt_sideways,
            burst: motion > t.acc_burst,
        });

        let holding = pressure >= t.pressure_light
            && motion < t.acc_static
            && !(t.static_hold_excludes_heavy && pressure >= t.pressure_heavy);
        let static_hold_secs = self.static_hold.update(holding);
        let static_hold_norm = self.static_hold.norm(n.static_hold_window_secs);

        let idle = pressure < t.pressure_zero && motion < t.acc_static;
        let break_completed = self.microbreak.update(idle, now);
        if break_completed {
            tracing::debug!(tick = self.ticks, "microbreak completed");
        }
        let minutes_since_break = self.microbreak.minutes_since_break(now);
        let microbreak_norm = self.microbreak.norm(now, n.break_window_minutes);

        let baseline_resolved = self.calibrator.observe(pressure, motion, now);
        if let Some(baseline) = baseline_resolved {
            tracing::info!(
                light_press = %format!("{:.1}", baseline.light_press),
                samples = baseline.samples,
                used_default = baseline.used_default,
                "baseline set"
            );
        }

        let inputs = RiskInputs {
            heavy_press_pct: features.heavy_press_pct,
            extreme_tilt_pct: features.extreme_tilt_pct,
            static_hold_norm,
            burst_norm: features.burst_norm,
            microbreak_norm,
        };
        let score = self.scorer.update(&inputs);

        let warnings = collect_warnings(
            &WarningInputs {
                heavy_press_pct: features.heavy_press_pct,
                extreme_tilt_pct: features.extreme_tilt_pct,
                pressing: pressure >= t.pressure_light,
                static_hold_secs,
                minutes_since_break,
            },
            &self.warning_limits,
        );

        let snapshot = Snapshot {
            risk: score.score,
            pressure,
            pressure_left_norm: clamp01(latest.pressure_b / n.left_finger_divisor),
            pressure_right_norm: clamp01(latest.pressure_a / n.right_finger_divisor),
            tilt: latest.tilt,
            heavy_press_norm: features.heavy_press_pct,
            static_hold_norm,
            bursts_norm: clamp01(features.burst_norm * n.bursts_output_scale),
            extreme_tilt_norm: features.extreme_tilt_pct,
            static_hold_streak_sec: static_hold_secs,
            minutes_since_break,
        };

        tracing::debug!(
            tick = self.ticks,
            risk = score.score,
            raw = score.raw,
            pressure,
            motion,
            heavy = features.heavy_press_pct,
            sideways = features.extreme_tilt_pct,
            bursts = features.burst_count,
            static_hold_secs,
            warnings = warnings.len(),
            "tick"
        );

        TickReport {
            tick: self.ticks,
            at: now,
            snapshot,
            features,
            inputs,
            score,
            warnings,
            posture: TiltPosture::classify(latest.tilt, t),
            motion,
            break_completed,
            baseline_resolved,
            streams: self.store.streams().summary(),
        }
    }

    pub fn latest(&self) -> &LatestState {
        self.store.latest()
    }

    pub fn window_features(&self) -> WindowFeatures {
        self.window.features()
    }

    pub fn last_break_at(&self) -> DateTime<Utc> {
        self.microbreak.last_break_at()
    }

    /// Calibration progress; resolved once the baseline is set.
    pub fn calibration(&self) -> &CalibrationState {
        self.calibrator.state()
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}
