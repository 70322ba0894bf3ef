use proflow_core::{ConfidenceConfig, ConfidenceWeightsConfig};
use serde::{Deserialize, Serialize};

/// Five readiness signals, each on a 0–100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceDimensions {
    pub code_location: f64,
    pub requirement_clarity: f64,
    pub side_effect_safety: f64,
    pub test_coverage: f64,
    pub prior_success: f64,
}

impl ConfidenceDimensions {
    pub fn new(
        code_location: f64,
        requirement_clarity: f64,
        side_effect_safety: f64,
        test_coverage: f64,
        prior_success: f64,
    ) -> Self {
        Self {
            code_location,
            requirement_clarity,
            side_effect_safety,
            test_coverage,
            prior_success,
        }
        .clamped()
    }

    /// Bring every dimension into range; NaN counts as no confidence.
    pub fn clamped(self) -> Self {
        Self {
            code_location: clamp_score(self.code_location),
            requirement_clarity: clamp_score(self.requirement_clarity),
            side_effect_safety: clamp_score(self.side_effect_safety),
            test_coverage: clamp_score(self.test_coverage),
            prior_success: clamp_score(self.prior_success),
        }
    }

    fn as_array(&self) -> [f64; 5] {
        [
            self.code_location,
            self.requirement_clarity,
            self.side_effect_safety,
            self.test_coverage,
            self.prior_success,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceWeights {
    pub code_location: f64,
    pub requirement_clarity: f64,
    pub side_effect_safety: f64,
    pub test_coverage: f64,
    pub prior_success: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self::from_config(&ConfidenceWeightsConfig::default())
    }
}

impl ConfidenceWeights {
    pub fn from_config(cfg: &ConfidenceWeightsConfig) -> Self {
        Self {
            code_location: cfg.code_location,
            requirement_clarity: cfg.requirement_clarity,
            side_effect_safety: cfg.side_effect_safety,
            test_coverage: cfg.test_coverage,
            prior_success: cfg.prior_success,
        }
    }

    fn as_array(&self) -> [f64; 5] {
        [
            self.code_location,
            self.requirement_clarity,
            self.side_effect_safety,
            self.test_coverage,
            self.prior_success,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoutConfidenceReport {
    pub dimensions: ConfidenceDimensions,
    pub aggregate: f64,
}

/// Weighted sum of the (clamped) dimensions, clamped to [0, 100].
pub fn score(dimensions: ConfidenceDimensions, weights: &ConfidenceWeights) -> ScoutConfidenceReport {
    let dimensions = dimensions.clamped();
    let aggregate = dimensions
        .as_array()
        .iter()
        .zip(weights.as_array())
        .map(|(value, weight)| value * weight)
        .sum::<f64>();
    ScoutConfidenceReport {
        dimensions,
        aggregate: clamp_score(aggregate),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    Ask,
    ProceedWithCaveat,
    Proceed,
}

impl GateDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::ProceedWithCaveat => "proceed_with_caveat",
            Self::Proceed => "proceed",
        }
    }

    pub fn guidance(&self) -> &'static str {
        match self {
            Self::Ask => "ask clarifying questions before changing code",
            Self::ProceedWithCaveat => "proceed, stating the assumptions being made",
            Self::Proceed => "proceed",
        }
    }
}

pub trait GatingPolicy {
    fn decide(&self, aggregate: f64) -> GateDecision;
}

/// Three bands split by two cutoffs. Both cutoffs belong to the middle band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPolicy {
    pub ask_below: f64,
    pub silent_above: f64,
}

impl BandPolicy {
    pub fn from_config(cfg: &ConfidenceConfig) -> Self {
        Self {
            ask_below: cfg.ask_below,
            silent_above: cfg.silent_above,
        }
    }
}

impl Default for BandPolicy {
    fn default() -> Self {
        Self::from_config(&ConfidenceConfig::default())
    }
}

impl GatingPolicy for BandPolicy {
    fn decide(&self, aggregate: f64) -> GateDecision {
        if aggregate < self.ask_below {
            GateDecision::Ask
        } else if aggregate > self.silent_above {
            GateDecision::Proceed
        } else {
            GateDecision::ProceedWithCaveat
        }
    }
}

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
