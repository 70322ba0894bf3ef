//! Project digest injected into the host's context at session start.

use chrono::Local;
use proflow_core::ProjectContextConfig;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Timestamp, session source, git branch and the head of each configured
/// project file that exists and is non-empty.
pub fn project_context(workspace: &Path, source: &str, cfg: &ProjectContextConfig) -> String {
    let mut parts = vec![
        format!(
            "Session started at: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ),
        format!("Session source: {source}"),
    ];
    if let Some(branch) = git_branch(workspace) {
        parts.push(format!("Git branch: {branch}"));
    }

    let cap = usize::try_from(cfg.max_chars_per_file).unwrap_or(usize::MAX);
    for relative in &cfg.files {
        let Some(content) = read_head(&workspace.join(relative), cap) else {
            continue;
        };
        parts.push(format!("\n--- Content from {relative} ---"));
        parts.push(content);
    }
    parts.join("\n")
}

/// First `max_chars` characters of a text file, trimmed. `None` when the file is
/// missing, unreadable or blank.
fn read_head(path: &Path, max_chars: usize) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    // UTF-8 is at most four bytes per char.
    let byte_budget = u64::try_from(max_chars.saturating_mul(4)).unwrap_or(u64::MAX);
    let mut raw = Vec::new();
    File::open(path)
        .ok()?
        .take(byte_budget)
        .read_to_end(&mut raw)
        .ok()?;
    let text = String::from_utf8_lossy(&raw);
    let head: String = text.trim().chars().take(max_chars).collect();
    let head = head.trim_end().to_string();
    (!head.is_empty()).then_some(head)
}

/// Current branch read straight from `HEAD`, following a `.git` file for worktrees.
fn git_branch(workspace: &Path) -> Option<String> {
    let dot_git = workspace.join(".git");
    let git_dir = if dot_git.is_dir() {
        dot_git
    } else {
        let pointer = fs::read_to_string(&dot_git).ok()?;
        let target = PathBuf::from(pointer.trim().strip_prefix("gitdir:")?.trim());
        if target.is_absolute() {
            target
        } else {
            workspace.join(target)
        }
    };
    let head = fs::read_to_string(git_dir.join("HEAD")).ok()?;
    let head = head.trim();
    match head.strip_prefix("ref:") {
        Some(reference) => {
            let reference = reference.trim();
            Some(
                reference
                    .strip_prefix("refs/heads/")
                    .unwrap_or(reference)
                    .to_string(),
            )
        }
        None if !head.is_empty() => Some("HEAD (detached)".to_string()),
        None => None,
    }
}
