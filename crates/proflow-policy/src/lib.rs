//! Pure evaluation logic: content scanning and confidence gating.

mod confidence;
mod content_scanner;

pub use confidence::{
    BandPolicy, ConfidenceDimensions, ConfidenceWeights, GateDecision, GatingPolicy,
    ScoutConfidenceReport, score,
};
pub use content_scanner::{ContentScanner, Finding, FindingFamily, render_findings};
