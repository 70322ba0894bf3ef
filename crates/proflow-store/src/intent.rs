use crate::{atomic_write_json, read_json};
use proflow_core::{HookError, sanitize_session_id, scratch_dir};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Keyword fingerprint of the session's first prompt plus the rolling edit window.
///
/// Keywords are set at most once per session. `None` means no prompt has been
/// fingerprinted yet; `Some(empty)` means the prompt carried no usable terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentFingerprint {
    pub session_id: String,
    keywords: Option<BTreeSet<String>>,
    pub edits_since_check: u64,
    pub window_tokens: BTreeSet<String>,
}

impl IntentFingerprint {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            ..Self::default()
        }
    }

    pub fn keywords(&self) -> Option<&BTreeSet<String>> {
        self.keywords.as_ref()
    }

    /// Returns `false` if the session was already fingerprinted.
    pub fn fingerprint(&mut self, keywords: BTreeSet<String>) -> bool {
        if self.keywords.is_some() {
            return false;
        }
        self.keywords = Some(keywords);
        true
    }

    pub fn record_edit(&mut self, tokens: impl IntoIterator<Item = String>) -> u64 {
        self.window_tokens.extend(tokens);
        self.edits_since_check = self.edits_since_check.saturating_add(1);
        self.edits_since_check
    }

    pub fn reset_window(&mut self) {
        self.edits_since_check = 0;
        self.window_tokens.clear();
    }
}

/// Fingerprints live in scratch space; losing one only costs a missed drift check.
pub struct IntentStore {
    dir: PathBuf,
}

impl IntentStore {
    pub fn new() -> Self {
        Self::at(scratch_dir())
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir
            .join(format!("intent-{}.json", sanitize_session_id(session_id)))
    }

    pub fn try_load(&self, session_id: &str) -> Result<Option<IntentFingerprint>, HookError> {
        let Some(mut fp) = read_json::<IntentFingerprint>(&self.path_for(session_id))? else {
            return Ok(None);
        };
        if fp.session_id.is_empty() {
            fp.session_id = session_id.to_string();
        }
        Ok(Some(fp))
    }

    pub fn load(&self, session_id: &str) -> IntentFingerprint {
        self.try_load(session_id)
            .ok()
            .flatten()
            .unwrap_or_else(|| IntentFingerprint::new(session_id))
    }

    pub fn save(&self, fingerprint: &IntentFingerprint) -> Result<(), HookError> {
        atomic_write_json(&self.path_for(&fingerprint.session_id), fingerprint)
    }

    pub fn purge(&self, session_id: &str) -> Result<(), HookError> {
        let path = self.path_for(session_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(HookError::write_failed(path, err)),
        }
    }
}

impl Default for IntentStore {
    fn default() -> Self {
        Self::new()
    }
}
