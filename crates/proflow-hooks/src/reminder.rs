use crate::{Advisory, AdvisoryKind};

pub fn is_due(response_count: u64, interval: u64) -> bool {
    interval > 0 && response_count > 0 && response_count % interval == 0
}

pub fn wrap_up_advisory(response_count: u64) -> Advisory {
    Advisory::new(
        AdvisoryKind::WrapUp,
        format!(
            "{response_count} responses this session. Consider wrapping up and capturing learnings."
        ),
    )
}

pub fn compaction_advisory(correction_count: u64) -> Advisory {
    Advisory::new(
        AdvisoryKind::CompactionReminder,
        format!(
            "Context is about to be compacted after {correction_count} correction(s). \
             Capture anything worth keeping as [LEARN] Category: Rule first."
        ),
    )
}
