use crate::{Advisory, AdvisoryKind};
use regex::Regex;

/// Word-boundary match against a fixed vocabulary of correction phrases.
pub struct CorrectionDetector {
    markers: Regex,
}

impl CorrectionDetector {
    pub fn new() -> Self {
        Self {
            markers: Regex::new(
                r"\b(wrong|incorrect|mistake|messed up|undo|revert|rollback|go back|wait|stop|hold on|no no|actually|instead|rather|not what i|that's not|that was not|that isn't|fix that|fix this|redo|try again)\b",
            )
            .expect("valid regex"),
        }
    }

    pub fn detect(&self, text: &str) -> bool {
        let normalized = text.to_lowercase().replace('\u{2019}', "'");
        self.markers.is_match(&normalized)
    }
}

impl Default for CorrectionDetector {
    fn default() -> Self {
        Self::new()
    }
}

pub fn correction_advisory(count: u64) -> Advisory {
    Advisory::new(
        AdvisoryKind::Correction,
        format!(
            "Correction detected (#{count} this session). Consider capturing with: [LEARN] Category: Rule"
        ),
    )
}
