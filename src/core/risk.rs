//! Risk model: weighted blend of normalized features with EMA smoothing.

use crate::config::WarningLimits;
use crate::core::window::clamp01;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weight of each normalized feature in the blended risk. Expected to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub heavy_press: f64,
    pub extreme_tilt: f64,
    pub static_hold: f64,
    pub burst: f64,
    pub microbreak: f64,
}

impl Default for RiskWeights {
    // 0.55 / 0.20 / 0.15 / 0.20 / 0.15 rescaled to sum to one.
    fn default() -> Self {
        Self {
            heavy_press: 0.44,
            extreme_tilt: 0.16,
            static_hold: 0.12,
            burst: 0.16,
            microbreak: 0.12,
        }
    }
}

impl RiskWeights {
    pub fn iter(&self) -> impl Iterator<Item = f64> {
        [
            self.heavy_press,
            self.extreme_tilt,
            self.static_hold,
            self.burst,
            self.microbreak,
        ]
        .into_iter()
    }

    pub fn sum(&self) -> f64 {
        self.iter().sum()
    }
}

/// The five normalized features, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    pub heavy_press_pct: f64,
    pub extreme_tilt_pct: f64,
    pub static_hold_norm: f64,
    pub burst_norm: f64,
    pub microbreak_norm: f64,
}

impl RiskInputs {
    /// Weighted sum, clamped to [0, 1].
    pub fn blend(&self, weights: &RiskWeights) -> f64 {
        clamp01(
            weights.heavy_press * self.heavy_press_pct
                + weights.extreme_tilt * self.extreme_tilt_pct
                + weights.static_hold * self.static_hold_norm
                + weights.burst * self.burst_norm
                + weights.microbreak * self.microbreak_norm,
        )
    }
}

/// Output of one scoring step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    /// Unsmoothed blend of this tick
    pub raw: f64,
    /// EMA after this tick
    pub smoothed: f64,
    /// `round(smoothed * 100)`
    pub score: u8,
}

#[derive(Debug, Clone)]
pub struct RiskScorer {
    weights: RiskWeights,
    alpha: f64,
    smoothed: f64,
}

impl RiskScorer {
    pub fn new(weights: RiskWeights, alpha: f64) -> Self {
        Self {
            weights,
            alpha,
            smoothed: 0.0,
        }
    }

    pub fn weights(&self) -> &RiskWeights {
        &self.weights
    }

    pub fn smoothed(&self) -> f64 {
        self.smoothed
    }

    /// Blend the inputs and fold them into the moving average.
    ///
    /// While the average is still exactly zero it snaps to the new value
    /// instead of decaying up from zero.
    pub fn update(&mut self, inputs: &RiskInputs) -> RiskScore {
        let raw = inputs.blend(&self.weights);

        self.smoothed = if self.smoothed == 0.0 {
            raw
        } else {
            clamp01(self.alpha * raw + (1.0 - self.alpha) * self.smoothed)
        };

        RiskScore {
            raw,
            smoothed: self.smoothed,
            score: (self.smoothed * 100.0).round() as u8,
        }
    }
}

/// Advisory warning raised alongside a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    HeavyPress,
    ExtremeTilt,
    StaticHold,
    NoRecentBreak,
}

impl Warning {
    pub fn message(self) -> &'static str {
        match self {
            Warning::HeavyPress => "pressing too heavy",
            Warning::ExtremeTilt => "extreme wrist tilt",
            Warning::StaticHold => "high pressure held for long period without movement",
            Warning::NoRecentBreak => "long time since break",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// What the warning rules look at on a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarningInputs {
    pub heavy_press_pct: f64,
    pub extreme_tilt_pct: f64,
    /// Whether combined pressure is at least a light press
    pub pressing: bool,
    pub static_hold_secs: u32,
    pub minutes_since_break: f64,
}

/// Evaluate the warning rules, in a fixed order.
pub fn collect_warnings(inputs: &WarningInputs, limits: &WarningLimits) -> Vec<Warning> {
    let mut warnings = Vec::new();
    if inputs.heavy_press_pct > limits.heavy_press_pct {
        warnings.push(Warning::HeavyPress);
    }
    if inputs.extreme_tilt_pct > limits.extreme_tilt_pct && inputs.pressing {
        warnings.push(Warning::ExtremeTilt);
    }
    if inputs.static_hold_secs >= limits.static_hold_secs {
        warnings.push(Warning::StaticHold);
    }
    if inputs.minutes_since_break >= limits.minutes_since_break {
        warnings.push(Warning::NoRecentBreak);
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const EQUAL: RiskWeights = RiskWeights {
        heavy_press: 0.2,
        extreme_tilt: 0.2,
        static_hold: 0.2,
        burst: 0.2,
        microbreak: 0.2,
    };

    fn inputs(heavy: f64, tilt: f64, hold: f64, burst: f64, brk: f64) -> RiskInputs {
        RiskInputs {
            heavy_press_pct: heavy,
            extreme_tilt_pct: tilt,
            static_hold_norm: hold,
            burst_norm: burst,
            microbreak_norm: brk,
        }
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((RiskWeights::default().sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_blend_is_weighted_sum() {
        let weights = RiskWeights {
            heavy_press: 0.5,
            extreme_tilt: 0.1,
            static_hold: 0.1,
            burst: 0.2,
            microbreak: 0.1,
        };
        let x = inputs(0.3, 1.0, 0.5, 0.25, 0.0);
        let expected = 0.5 * 0.3 + 0.1 * 1.0 + 0.1 * 0.5 + 0.2 * 0.25;
        assert!((x.blend(&weights) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_blend_is_clamped_for_overweighted_sets() {
        let weights = RiskWeights {
            heavy_press: 0.55,
            extreme_tilt: 0.20,
            static_hold: 0.15,
            burst: 0.20,
            microbreak: 0.15,
        };
        assert_eq!(inputs(1.0, 1.0, 1.0, 1.0, 1.0).blend(&weights), 1.0);
    }

    #[test]
    fn test_first_tick_snaps_then_smooths() {
        let mut scorer = RiskScorer::new(EQUAL, 0.3);

        let first = scorer.update(&inputs(0.5, 0.5, 0.5, 0.5, 0.5));
        assert_eq!(first.raw, 0.5);
        assert_eq!(first.smoothed, 0.5);
        assert_eq!(first.score, 50);

        let second = scorer.update(&inputs(1.0, 1.0, 1.0, 1.0, 1.0));
        assert!((second.smoothed - (0.3 * 1.0 + 0.7 * 0.5)).abs() < 1e-12);
        assert_eq!(second.score, 65);
    }

    #[test]
    fn test_score_rounds() {
        let mut scorer = RiskScorer::new(EQUAL, 0.3);
        let score = scorer.update(&inputs(0.0, 0.0, 0.0, 0.0, 0.0249 * 5.0));
        assert_eq!(score.score, 2);
    }

    #[test]
    fn test_zero_average_snaps_again() {
        let mut scorer = RiskScorer::new(EQUAL, 0.3);
        scorer.update(&RiskInputs::default());
        let next = scorer.update(&inputs(1.0, 1.0, 1.0, 1.0, 1.0));
        assert_eq!(next.smoothed, 1.0);
    }

    #[test]
    fn test_warnings() {
        let limits = WarningLimits::default();
        let quiet = WarningInputs {
            heavy_press_pct: 0.25,
            extreme_tilt_pct: 0.5,
            pressing: false,
            static_hold_secs: 44,
            minutes_since_break: 9.9,
        };
        assert!(collect_warnings(&quiet, &limits).is_empty());

        let loud = WarningInputs {
            heavy_press_pct: 0.3,
            pressing: true,
            static_hold_secs: 45,
            minutes_since_break: 10.0,
            ..quiet
        };
        assert_eq!(
            collect_warnings(&loud, &limits),
            vec![
                Warning::HeavyPress,
                Warning::ExtremeTilt,
                Warning::StaticHold,
                Warning::NoRecentBreak
            ]
        );
        assert_eq!(Warning::HeavyPress.to_string(), "pressing too heavy");
    }
}
