use anyhow::Result;
use proflow_core::ProflowConfig;
use proflow_policy::{BandPolicy, ConfidenceDimensions, ConfidenceWeights, GatingPolicy, score};
use serde_json::json;
use std::path::Path;

use crate::ScoreArgs;
use crate::output::print_json;

pub(crate) fn run_score(cwd: &Path, args: ScoreArgs, json_mode: bool) -> Result<()> {
    let config = ProflowConfig::load(cwd).config;
    let weights = ConfidenceWeights::from_config(&config.confidence.weights);
    let policy = BandPolicy::from_config(&config.confidence);

    let report = score(
        ConfidenceDimensions::new(
            args.code_location,
            args.requirement_clarity,
            args.side_effect_safety,
            args.test_coverage,
            args.prior_success,
        ),
        &weights,
    );
    let decision = policy.decide(report.aggregate);

    if json_mode {
        print_json(&json!({
            "dimensions": report.dimensions,
            "aggregate": report.aggregate,
            "decision": decision,
            "guidance": decision.guidance(),
        }))?;
    } else {
        println!("confidence: {:.1}", report.aggregate);
        println!("decision: {} ({})", decision.as_str(), decision.guidance());
    }
    Ok(())
}
