use crate::{Advisory, AdvisoryKind};
use proflow_core::EditTrackingConfig;

/// Edit counts at which a quality-gate reminder fires: every explicit step, then
/// every multiple of `repeat_every` past the largest step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditThresholds {
    steps: Vec<u64>,
    repeat_every: u64,
}

impl EditThresholds {
    pub fn new(mut steps: Vec<u64>, repeat_every: u64) -> Self {
        steps.retain(|step| *step > 0);
        steps.sort_unstable();
        steps.dedup();
        Self {
            steps,
            repeat_every,
        }
    }

    pub fn from_config(cfg: &EditTrackingConfig) -> Self {
        Self::new(cfg.warn_steps.clone(), cfg.repeat_every)
    }

    pub fn fires_at(&self, count: u64) -> bool {
        if count == 0 {
            return false;
        }
        if self.steps.contains(&count) {
            return true;
        }
        let last_step = self.steps.last().copied().unwrap_or(0);
        self.repeat_every > 0 && count > last_step && count % self.repeat_every == 0
    }
}

pub fn quality_gate_advisory(count: u64) -> Advisory {
    Advisory::new(
        AdvisoryKind::QualityGate,
        format!(
            "{count} edits this session. Consider a quality-gate pass (lint and tests) before continuing."
        ),
    )
}
