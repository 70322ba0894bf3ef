use anyhow::Result;
use proflow_core::ADVISORY_PREFIX;
use proflow_hooks::HookOutcome;
use serde::Serialize;

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Advisories go to stderr, where the host surfaces them to the user.
/// Only the host protocol payload is written to stdout.
pub(crate) fn emit_outcome(outcome: &HookOutcome, json: bool) -> Result<()> {
    if json {
        return print_json(outcome);
    }
    for advisory in &outcome.advisories {
        for line in advisory.message.lines() {
            eprintln!("{ADVISORY_PREFIX} {line}");
        }
    }
    if let Some(payload) = outcome.host_output() {
        print_json(&payload)?;
    }
    Ok(())
}
