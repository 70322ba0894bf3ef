//! JSON document persistence for the hook sidecar.
//!
//! Every document is written through a temp file in the target directory and
//! renamed into place, so readers never observe a half-written record. Reads
//! distinguish "absent" (`Ok(None)`) from "present but unusable"
//! (`HookError::StateUnavailable`); callers decide how to fall back.

use proflow_core::HookError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

mod intent;
mod learnings;
mod session;

pub use intent::{IntentFingerprint, IntentStore};
pub use learnings::{
    AppendOutcome, LearningEntry, LearningScope, LearningsStore, NewLearning, StartupSelection,
    normalize_rule,
};
pub use session::{SessionState, SessionStore};

pub(crate) fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), HookError> {
    let data = serde_json::to_vec_pretty(value).map_err(|err| HookError::write_failed(path, err))?;
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|err| HookError::write_failed(path, err))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| HookError::write_failed(path, err))?;
    tmp.write_all(&data)
        .map_err(|err| HookError::write_failed(path, err))?;
    tmp.persist(path)
        .map_err(|err| HookError::write_failed(path, err.error))?;
    Ok(())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, HookError> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(HookError::state_unavailable(path, err)),
    };
    serde_json::from_slice(&raw)
        .map(Some)
        .map_err(|err| HookError::state_unavailable(path, err))
}
