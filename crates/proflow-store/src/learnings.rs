use crate::{atomic_write_json, read_json};
use chrono::{DateTime, Utc};
use proflow_core::{HookError, data_dir};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningScope {
    Global,
    Project(String),
}

impl LearningScope {
    pub fn label(&self) -> String {
        match self {
            Self::Global => "global".to_string(),
            Self::Project(name) => format!("project:{name}"),
        }
    }

    pub fn applies_to(&self, project: &str) -> bool {
        match self {
            Self::Global => true,
            Self::Project(name) => name.eq_ignore_ascii_case(project),
        }
    }

    /// Identity for duplicate detection; project names compare case-insensitively.
    fn folded(&self) -> Self {
        match self {
            Self::Global => Self::Global,
            Self::Project(name) => Self::Project(name.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningEntry {
    pub id: Uuid,
    pub rule: String,
    pub category: String,
    pub scope: LearningScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mistake: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LearningEntry {
    fn dedup_key(&self) -> (String, LearningScope) {
        (normalize_rule(&self.rule), self.scope.folded())
    }
}

/// A learning as extracted from conversation text, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLearning {
    pub rule: String,
    pub category: String,
    pub scope: LearningScope,
    pub mistake: Option<String>,
    pub correction: Option<String>,
    pub session_id: Option<String>,
}

/// Learnings picked for the session-start digest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartupSelection {
    pub entries: Vec<LearningEntry>,
    /// `false` when nothing applied to the project and the newest learnings
    /// from every project were used instead.
    pub matched_project: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendOutcome {
    pub added: usize,
    pub duplicates: usize,
}

/// Case-folded, whitespace-collapsed form used to detect duplicate rules.
pub fn normalize_rule(rule: &str) -> String {
    rule.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Append-only collection of learnings stored as one JSON array.
pub struct LearningsStore {
    path: PathBuf,
}

impl LearningsStore {
    pub fn new(workspace: &Path) -> Self {
        Self::at(data_dir(workspace).join("learnings.json"))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_all(&self) -> Result<Vec<LearningEntry>, HookError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    /// Stores every candidate whose normalized rule is not already present in the
    /// same scope. An unreadable collection is never overwritten.
    pub fn append_unique(
        &self,
        candidates: Vec<NewLearning>,
    ) -> Result<AppendOutcome, HookError> {
        let mut entries = self.load_all()?;
        let mut seen: HashSet<(String, LearningScope)> =
            entries.iter().map(LearningEntry::dedup_key).collect();
        let mut outcome = AppendOutcome::default();

        for candidate in candidates {
            let rule = candidate.rule.trim();
            if rule.is_empty() {
                continue;
            }
            if !seen.insert((normalize_rule(rule), candidate.scope.folded())) {
                outcome.duplicates += 1;
                continue;
            }
            entries.push(LearningEntry {
                id: Uuid::now_v7(),
                rule: rule.to_string(),
                category: candidate.category,
                scope: candidate.scope,
                mistake: candidate.mistake,
                correction: candidate.correction,
                session_id: candidate.session_id,
                created_at: Utc::now(),
            });
            outcome.added += 1;
        }

        if outcome.added > 0 {
            atomic_write_json(&self.path, &entries)?;
        }
        Ok(outcome)
    }

    /// Most recent first, limited to learnings visible from `project`.
    pub fn recent_for_project(
        &self,
        project: &str,
        limit: usize,
    ) -> Result<Vec<LearningEntry>, HookError> {
        let mut entries: Vec<_> = self
            .load_all()?
            .into_iter()
            .filter(|entry| entry.scope.applies_to(project))
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }

    /// Like [`Self::recent_for_project`], but a project with nothing recorded
    /// yet still sees the newest learnings from every project.
    pub fn for_session_start(
        &self,
        project: &str,
        limit: usize,
    ) -> Result<StartupSelection, HookError> {
        let mut all = self.load_all()?;
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let matched: Vec<_> = all
            .iter()
            .filter(|entry| entry.scope.applies_to(project))
            .take(limit)
            .cloned()
            .collect();
        if !matched.is_empty() || all.is_empty() {
            return Ok(StartupSelection {
                entries: matched,
                matched_project: true,
            });
        }
        all.truncate(limit);
        Ok(StartupSelection {
            entries: all,
            matched_project: false,
        })
    }
}
