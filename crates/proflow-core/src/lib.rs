use std::path::{Path, PathBuf};

mod config;
mod error;

pub use config::{
    ConfidenceConfig, ConfidenceWeightsConfig, DriftConfig, EditTrackingConfig, HookFlag,
    HookFlags, LearningsConfig, LoadedConfig, ProflowConfig, ProjectContextConfig, ScannerConfig,
    SessionCheckConfig,
};
pub use error::HookError;

pub type Result<T> = anyhow::Result<T>;

/// Prefix used on every advisory line shown to the user.
pub const ADVISORY_PREFIX: &str = "[proflow]";

/// Overrides the location of ephemeral per-session scratch state.
pub const SCRATCH_DIR_ENV: &str = "PROFLOW_SCRATCH_DIR";

pub fn runtime_dir(workspace: &Path) -> PathBuf {
    workspace.join(".proflow")
}

/// Durable state: session records and the learnings collection.
pub fn data_dir(workspace: &Path) -> PathBuf {
    runtime_dir(workspace).join("data")
}

/// Short-lived state that may disappear between processes (drift fingerprints).
pub fn scratch_dir() -> PathBuf {
    match std::env::var_os(SCRATCH_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::temp_dir().join("proflow"),
    }
}

pub fn home_dir() -> Option<PathBuf> {
    let home = std::env::var("HOME")
        .ok()
        .or_else(|| std::env::var("USERPROFILE").ok())?;
    Some(PathBuf::from(home))
}

/// Map a host-provided session id onto a string that is safe as a single path component.
pub fn sanitize_session_id(session_id: &str) -> String {
    let cleaned: String = session_id
        .trim()
        .chars()
        .take(128)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Project identity used to scope learnings: the workspace directory name.
pub fn project_name(workspace: &Path) -> String {
    let canonical = workspace
        .canonicalize()
        .unwrap_or_else(|_| workspace.to_path_buf());
    canonical
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "workspace".to_string())
}
