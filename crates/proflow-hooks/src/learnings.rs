//! `[LEARN]` annotation capture and the session-start learnings digest.

use crate::{Advisory, AdvisoryKind};
use proflow_core::{ADVISORY_PREFIX, HookError};
use proflow_store::{LearningScope, NewLearning, StartupSelection};
use regex::Regex;
use serde_json::Value;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// How far past a block its `Mistake:` / `Correction:` lines may appear.
const FOLLOW_UP_WINDOW: usize = 200;

pub struct LearnParser {
    block: Regex,
    mistake: Regex,
    correction: Regex,
}

impl LearnParser {
    pub fn new() -> Self {
        Self {
            block: Regex::new(r"\[LEARN(?::([A-Za-z]+))?\][ \t]*(\w[\w-]*):[ \t]*([^\n]*)")
                .expect("valid regex"),
            mistake: Regex::new(r"Mistake:[ \t]*([^\n]+)").expect("valid regex"),
            correction: Regex::new(r"Correction:[ \t]*([^\n]+)").expect("valid regex"),
        }
    }

    /// Every well-formed block in `text`. Unknown scopes and empty rules are skipped.
    pub fn extract(&self, text: &str, project: &str, session_id: &str) -> Vec<NewLearning> {
        let mut learnings = Vec::new();
        for caps in self.block.captures_iter(text) {
            let scope = match caps.get(1).map(|m| m.as_str().to_ascii_lowercase()) {
                None => LearningScope::Project(project.to_string()),
                Some(scope) if scope == "project" => LearningScope::Project(project.to_string()),
                Some(scope) if scope == "global" => LearningScope::Global,
                Some(_) => continue,
            };
            let rule = caps[3].trim();
            if rule.is_empty() {
                continue;
            }
            let end = caps.get(0).map_or(0, |m| m.end());
            let follow_up = follow_up_window(&text[end..]);
            learnings.push(NewLearning {
                rule: rule.to_string(),
                category: caps[2].to_string(),
                scope,
                mistake: first_capture(&self.mistake, follow_up),
                correction: first_capture(&self.correction, follow_up),
                session_id: Some(session_id.to_string()).filter(|id| !id.is_empty()),
            });
        }
        learnings
    }
}

impl Default for LearnParser {
    fn default() -> Self {
        Self::new()
    }
}

fn follow_up_window(after: &str) -> &str {
    let mut end = after.len().min(FOLLOW_UP_WINDOW);
    while !after.is_char_boundary(end) {
        end -= 1;
    }
    let window = &after[..end];
    match window.find("[LEARN") {
        Some(next_block) => &window[..next_block],
        None => window,
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Assistant text from the tail of a JSON-lines transcript.
///
/// At most `max_bytes` are read from the end of the file and only the last
/// `max_lines` lines are inspected. Lines that are not JSON are ignored.
pub fn read_transcript_tail(
    path: &Path,
    max_lines: usize,
    max_bytes: u64,
) -> Result<String, HookError> {
    let mut file = File::open(path).map_err(|err| HookError::state_unavailable(path, err))?;
    let len = file
        .metadata()
        .map_err(|err| HookError::state_unavailable(path, err))?
        .len();
    let start = len.saturating_sub(max_bytes);
    file.seek(SeekFrom::Start(start))
        .map_err(|err| HookError::state_unavailable(path, err))?;
    let mut raw = Vec::new();
    file.read_to_end(&mut raw)
        .map_err(|err| HookError::state_unavailable(path, err))?;
    let raw = String::from_utf8_lossy(&raw);

    let mut lines: Vec<&str> = raw.lines().collect();
    if start > 0 && !lines.is_empty() {
        // First line is probably cut in half.
        lines.remove(0);
    }
    let tail = &lines[lines.len().saturating_sub(max_lines)..];

    let mut text = String::new();
    for line in tail {
        let Ok(entry) = serde_json::from_str::<Value>(line.trim()) else {
            continue;
        };
        if entry.get("type").and_then(Value::as_str) != Some("assistant") {
            continue;
        }
        match entry.pointer("/message/content") {
            Some(Value::String(content)) => {
                text.push_str(content);
                text.push('\n');
            }
            Some(Value::Array(blocks)) => {
                for block in blocks {
                    if block.get("type").and_then(Value::as_str) == Some("text")
                        && let Some(body) = block.get("text").and_then(Value::as_str)
                    {
                        text.push_str(body);
                        text.push('\n');
                    }
                }
            }
            _ => {}
        }
    }
    Ok(text)
}

pub fn captured_advisory(added: usize) -> Advisory {
    Advisory::new(
        AdvisoryKind::LearningsCaptured,
        format!("Captured {added} new learning(s) from [LEARN] tags."),
    )
}

/// Context block handed to the host at session start.
pub fn startup_context(selection: &StartupSelection) -> Option<String> {
    let entries = &selection.entries;
    if entries.is_empty() {
        return None;
    }
    let mut out = if selection.matched_project {
        format!(
            "{ADVISORY_PREFIX} {} learnings loaded for this project:",
            entries.len()
        )
    } else {
        format!(
            "{ADVISORY_PREFIX} {} learnings loaded from other projects (none recorded for this one yet):",
            entries.len()
        )
    };
    for entry in entries {
        out.push_str(&format!("\n  [{}] {}", entry.category, entry.rule));
        if matches!(entry.scope, LearningScope::Global) {
            out.push_str(" (global)");
        }
    }
    Some(out)
}
