use crate::{atomic_write_json, read_json};
use chrono::{DateTime, Utc};
use proflow_core::{HookError, data_dir, sanitize_session_id};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Durable per-session counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub edit_count: u64,
    #[serde(default, alias = "corrections_count")]
    pub correction_count: u64,
    #[serde(default)]
    pub response_count: u64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(session_id: &str) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.to_string(),
            edit_count: 0,
            correction_count: 0,
            response_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn record_edit(&mut self) -> u64 {
        self.edit_count = self.edit_count.saturating_add(1);
        self.touch();
        self.edit_count
    }

    pub fn record_correction(&mut self) -> u64 {
        self.correction_count = self.correction_count.saturating_add(1);
        self.touch();
        self.correction_count
    }

    pub fn record_response(&mut self) -> u64 {
        self.response_count = self.response_count.saturating_add(1);
        self.touch();
        self.response_count
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(workspace: &Path) -> Self {
        Self::at(data_dir(workspace).join("sessions"))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", sanitize_session_id(session_id)))
    }

    pub fn exists(&self, session_id: &str) -> bool {
        self.path_for(session_id).exists()
    }

    /// `Ok(None)` when no record exists yet; `StateUnavailable` when the record is unreadable.
    pub fn try_load(&self, session_id: &str) -> Result<Option<SessionState>, HookError> {
        let Some(mut state) = read_json::<SessionState>(&self.path_for(session_id))? else {
            return Ok(None);
        };
        if state.session_id.is_empty() {
            state.session_id = session_id.to_string();
        }
        Ok(Some(state))
    }

    /// Never fails: a missing or corrupt record yields a zero-valued one.
    pub fn load(&self, session_id: &str) -> SessionState {
        self.try_load(session_id)
            .ok()
            .flatten()
            .unwrap_or_else(|| SessionState::new(session_id))
    }

    pub fn save(&self, state: &SessionState) -> Result<(), HookError> {
        atomic_write_json(&self.path_for(&state.session_id), state)
    }
}
