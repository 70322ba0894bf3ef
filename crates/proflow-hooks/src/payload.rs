//! Extraction of touched paths and written text from tool payloads.

use crate::HookInput;
use serde_json::Value;
use std::path::{Path, PathBuf};

const PATH_FIELDS: &[&str] = &["file_path", "notebook_path", "path"];

/// Text a mutating tool call put into a file, as far as the payload reveals it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrittenContent {
    /// The complete new file body.
    Full(String),
    /// Inserted snippets only; line numbers are relative to the joined snippets.
    Fragments(Vec<String>),
    None,
}

/// Absolute paths named by the tool input, resolved against the event's cwd.
pub fn touched_paths(input: &HookInput, workspace: &Path) -> Vec<PathBuf> {
    let Some(tool_input) = input.tool_input.as_ref() else {
        return Vec::new();
    };
    let base = input
        .cwd
        .as_deref()
        .filter(|cwd| cwd.is_absolute())
        .unwrap_or(workspace);
    let mut paths: Vec<PathBuf> = Vec::new();
    for field in PATH_FIELDS {
        let Some(raw) = tool_input.get(*field).and_then(Value::as_str) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let path = Path::new(raw);
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };
        if !paths.contains(&resolved) {
            paths.push(resolved);
        }
    }
    paths
}

pub fn written_content(input: &HookInput) -> WrittenContent {
    let Some(tool_input) = input.tool_input.as_ref() else {
        return WrittenContent::None;
    };
    if let Some(content) = tool_input.get("content").and_then(Value::as_str) {
        return WrittenContent::Full(content.to_string());
    }

    let mut fragments = Vec::new();
    for field in ["new_string", "new_source"] {
        if let Some(text) = tool_input.get(field).and_then(Value::as_str) {
            fragments.push(text.to_string());
        }
    }
    if let Some(edits) = tool_input.get("edits").and_then(Value::as_array) {
        fragments.extend(
            edits
                .iter()
                .filter_map(|edit| edit.get("new_string").and_then(Value::as_str))
                .map(str::to_string),
        );
    }
    if fragments.is_empty() {
        WrittenContent::None
    } else {
        WrittenContent::Fragments(fragments)
    }
}

/// `path` relative to `workspace` when it lies inside it.
pub fn workspace_relative<'a>(path: &'a Path, workspace: &Path) -> &'a Path {
    path.strip_prefix(workspace).unwrap_or(path)
}
