use proflow_core::{HookError, HookFlag, ProflowConfig, project_name};
use proflow_observe::Observer;
use proflow_policy::{ContentScanner, Finding, render_findings};
use proflow_store::{IntentFingerprint, IntentStore, LearningsStore, SessionState, SessionStore};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

mod context;
mod corrections;
mod drift;
mod edit_tracker;
mod learnings;
mod payload;
mod reminder;

pub use context::project_context;
pub use corrections::CorrectionDetector;
pub use drift::{DriftMonitor, Tokenizer, relevance};
pub use edit_tracker::EditThresholds;
pub use learnings::{LearnParser, read_transcript_tail, startup_context};
pub use payload::{WrittenContent, touched_paths, written_content};

/// Tool names whose successful completion means a file changed.
pub const MUTATING_TOOLS: &[&str] = &["Edit", "Write", "MultiEdit", "NotebookEdit"];

// ── Hook Events ──────────────────────────────────────────────────────────────

/// Lifecycle events of the host agent that the sidecar reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum HookEvent {
    /// Session begin/resume/clear.
    SessionStart,
    /// User submitted a message.
    UserPromptSubmit,
    /// Before a tool runs. Observed only.
    PreToolUse,
    /// After a tool succeeded.
    PostToolUse,
    /// The agent finished a response.
    Stop,
    /// Before context compaction.
    PreCompact,
    /// A subagent finished. Observed only.
    SubagentStop,
}

impl HookEvent {
    pub const ALL: [HookEvent; 7] = [
        Self::SessionStart,
        Self::UserPromptSubmit,
        Self::PreToolUse,
        Self::PostToolUse,
        Self::Stop,
        Self::PreCompact,
        Self::SubagentStop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStart => "SessionStart",
            Self::UserPromptSubmit => "UserPromptSubmit",
            Self::PreToolUse => "PreToolUse",
            Self::PostToolUse => "PostToolUse",
            Self::Stop => "Stop",
            Self::PreCompact => "PreCompact",
            Self::SubagentStop => "SubagentStop",
        }
    }

    /// Accepts wire names in any case and the generic lifecycle names.
    pub fn parse_event(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sessionstart" | "session-start" => Some(Self::SessionStart),
            "userpromptsubmit" | "user-message-submitted" => Some(Self::UserPromptSubmit),
            "pretooluse" | "tool-invocation-start" => Some(Self::PreToolUse),
            "posttooluse" | "tool-invocation-end" => Some(Self::PostToolUse),
            "stop" | "turn-end" => Some(Self::Stop),
            "precompact" | "context-compaction-start" => Some(Self::PreCompact),
            "subagentstop" | "subagent-complete" => Some(Self::SubagentStop),
            _ => None,
        }
    }
}

// ── Hook Input / Output ──────────────────────────────────────────────────────

/// JSON event payload the host writes to stdin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HookInput {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<Value>,
    #[serde(alias = "tool_result", skip_serializing_if = "Option::is_none")]
    pub tool_response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Session-start subtype: startup, resume, clear or compact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    /// Final response text, when the host supplies it inline.
    #[serde(alias = "last_assistant_message", skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
}

impl HookInput {
    /// Parse one payload. Blank input is an empty payload, not an error.
    pub fn from_json(raw: &str) -> Result<Self, HookError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).map_err(|err| HookError::MalformedInput(err.to_string()))
    }

    pub fn event(&self) -> Option<HookEvent> {
        self.hook_event_name
            .as_deref()
            .and_then(HookEvent::parse_event)
    }

    pub fn session_key(&self) -> &str {
        let id = self.session_id.trim();
        if id.is_empty() { "unknown" } else { id }
    }

    pub fn is_file_mutation(&self) -> bool {
        self.tool_name
            .as_deref()
            .is_some_and(|name| MUTATING_TOOLS.contains(&name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    QualityGate,
    Correction,
    Drift,
    ScanFindings,
    LearningsCaptured,
    WrapUp,
    CompactionReminder,
}

/// A warning or hint for the user. Never a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub message: String,
}

impl Advisory {
    pub fn new(kind: AdvisoryKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFindings {
    pub path: PathBuf,
    pub findings: Vec<Finding>,
}

/// Everything one dispatched event produced.
#[derive(Debug, Clone, Serialize)]
pub struct HookOutcome {
    pub event: HookEvent,
    pub session_id: String,
    pub advisories: Vec<Advisory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<FileFindings>,
    /// Operations that failed and were skipped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<String>,
}

impl HookOutcome {
    fn new(event: HookEvent, session_id: &str) -> Self {
        Self {
            event,
            session_id: session_id.to_string(),
            advisories: Vec::new(),
            additional_context: None,
            findings: Vec::new(),
            degraded: Vec::new(),
        }
    }

    /// Host-facing stdout payload for session start, when there is context to inject.
    pub fn host_output(&self) -> Option<Value> {
        if self.event != HookEvent::SessionStart {
            return None;
        }
        let context = self.additional_context.as_ref()?;
        Some(json!({
            "hookSpecificOutput": {
                "hookEventName": HookEvent::SessionStart.as_str(),
                "additionalContext": context,
            }
        }))
    }
}

// ── Hook Runtime ─────────────────────────────────────────────────────────────

/// Routes events to the enabled handlers. Every failure is logged and
/// swallowed; `fire` always returns an outcome.
pub struct HookRuntime {
    workspace: PathBuf,
    project: String,
    config: ProflowConfig,
    sessions: SessionStore,
    intents: IntentStore,
    learnings: LearningsStore,
    scanner: ContentScanner,
    corrections: CorrectionDetector,
    thresholds: EditThresholds,
    drift: DriftMonitor,
    learn_parser: LearnParser,
    observer: Observer,
}

impl HookRuntime {
    pub fn new(workspace: &Path, config: ProflowConfig) -> Self {
        Self {
            workspace: workspace.to_path_buf(),
            project: project_name(workspace),
            sessions: SessionStore::new(workspace),
            intents: IntentStore::new(),
            learnings: LearningsStore::new(workspace),
            scanner: ContentScanner::new(),
            corrections: CorrectionDetector::new(),
            thresholds: EditThresholds::from_config(&config.edits),
            drift: DriftMonitor::from_config(&config.drift),
            learn_parser: LearnParser::new(),
            observer: Observer::new(workspace).unwrap_or_else(|_| Observer::disabled()),
            config,
        }
    }

    pub fn with_intent_store(mut self, intents: IntentStore) -> Self {
        self.intents = intents;
        self
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ProflowConfig {
        &self.config
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    /// Dispatch one event.
    pub fn fire(&self, event: HookEvent, input: &HookInput) -> HookOutcome {
        let session_id = input.session_key();
        let mut outcome = HookOutcome::new(event, session_id);
        let _ = self.observer.record_event(&json!({
            "event": event.as_str(),
            "session_id": session_id,
            "tool_name": input.tool_name,
            "source": input.source,
            "agent_type": input.agent_type,
        }));

        match event {
            HookEvent::SessionStart => self.on_session_start(input, &mut outcome),
            HookEvent::UserPromptSubmit => self.on_user_prompt(input, &mut outcome),
            HookEvent::PostToolUse => self.on_tool_end(input, &mut outcome),
            HookEvent::Stop => self.on_turn_end(input, &mut outcome),
            HookEvent::PreCompact => self.on_pre_compact(input, &mut outcome),
            HookEvent::PreToolUse | HookEvent::SubagentStop => {}
        }
        outcome
    }

    fn enabled(&self, flag: HookFlag) -> bool {
        self.config.hooks.is_enabled(flag)
    }

    fn degrade(&self, outcome: &mut HookOutcome, err: HookError) {
        self.observer.warn_log(&format!(
            "{} {}: {err}",
            outcome.event.as_str(),
            err.kind()
        ));
        outcome.degraded.push(err.to_string());
    }

    fn on_session_start(&self, input: &HookInput, outcome: &mut HookOutcome) {
        let session_id = input.session_key();
        if !self.sessions.exists(session_id) {
            self.save_session(&SessionState::new(session_id), outcome);
        }

        if self.enabled(HookFlag::DriftDetection) {
            if input.source.as_deref() == Some("clear")
                && let Err(err) = self.intents.purge(session_id)
            {
                self.degrade(outcome, err);
            }
            if let Some(prompt) = input.prompt.as_deref().filter(|p| !p.trim().is_empty()) {
                self.fingerprint_intent(session_id, prompt, outcome);
            }
        }

        let mut context = Vec::new();
        if self.enabled(HookFlag::LoadContext) {
            let source = input.source.as_deref().unwrap_or("unknown");
            context.push(project_context(
                &self.workspace,
                source,
                &self.config.context,
            ));
        }
        if self.enabled(HookFlag::LoadLearningsOnStart) {
            let limit = usize::try_from(self.config.learnings.load_limit).unwrap_or(usize::MAX);
            match self.learnings.for_session_start(&self.project, limit) {
                Ok(selection) => context.extend(startup_context(&selection)),
                Err(err) => self.degrade(outcome, err),
            }
        }
        if !context.is_empty() {
            outcome.additional_context = Some(context.join("\n\n"));
        }
    }

    fn on_user_prompt(&self, input: &HookInput, outcome: &mut HookOutcome) {
        let session_id = input.session_key();
        let prompt = input.prompt.as_deref().unwrap_or_default();

        if self.enabled(HookFlag::CorrectionDetection) && self.corrections.detect(prompt) {
            let mut state = self.load_session(session_id, outcome);
            let count = state.record_correction();
            if self.save_session(&state, outcome) {
                outcome
                    .advisories
                    .push(corrections::correction_advisory(count));
            }
        }

        if self.enabled(HookFlag::DriftDetection) && !prompt.trim().is_empty() {
            self.fingerprint_intent(session_id, prompt, outcome);
        }
    }

    fn on_tool_end(&self, input: &HookInput, outcome: &mut HookOutcome) {
        if !input.is_file_mutation() {
            return;
        }
        let session_id = input.session_key();
        let paths = touched_paths(input, &self.workspace);

        if self.enabled(HookFlag::EditTracking) {
            let mut state = self.load_session(session_id, outcome);
            let count = state.record_edit();
            if self.save_session(&state, outcome) && self.thresholds.fires_at(count) {
                outcome
                    .advisories
                    .push(edit_tracker::quality_gate_advisory(count));
            }
        }

        if self.enabled(HookFlag::DriftDetection) {
            let mut fingerprint = self.load_intent(session_id, outcome);
            let advisory = self
                .drift
                .observe_edit(&mut fingerprint, &paths, &self.workspace);
            match self.intents.save(&fingerprint) {
                Ok(()) => outcome.advisories.extend(advisory),
                Err(err) => self.degrade(outcome, err),
            }
        }

        self.scan_written(input, &paths, outcome);
    }

    fn on_turn_end(&self, input: &HookInput, outcome: &mut HookOutcome) {
        if self.enabled(HookFlag::SessionCheck) {
            let mut state = self.load_session(input.session_key(), outcome);
            let count = state.record_response();
            if self.save_session(&state, outcome)
                && reminder::is_due(count, self.config.session.reminder_interval)
            {
                outcome.advisories.push(reminder::wrap_up_advisory(count));
            }
        }

        if self.enabled(HookFlag::LearningCapture) {
            self.capture_learnings(input, outcome);
        }
    }

    fn on_pre_compact(&self, input: &HookInput, outcome: &mut HookOutcome) {
        if !self.enabled(HookFlag::LearningCapture) {
            return;
        }
        let state = self.load_session(input.session_key(), outcome);
        if state.correction_count > 0 {
            outcome
                .advisories
                .push(reminder::compaction_advisory(state.correction_count));
        }
    }

    fn capture_learnings(&self, input: &HookInput, outcome: &mut HookOutcome) {
        let text = match input
            .response_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
        {
            Some(text) => text.to_string(),
            None => {
                let Some(path) = input.transcript_path.as_deref() else {
                    return;
                };
                let lines =
                    usize::try_from(self.config.learnings.transcript_tail_lines).unwrap_or(usize::MAX);
                match read_transcript_tail(path, lines, self.config.learnings.transcript_max_bytes) {
                    Ok(text) => text,
                    Err(err) => {
                        self.degrade(outcome, err);
                        return;
                    }
                }
            }
        };

        let candidates = self
            .learn_parser
            .extract(&text, &self.project, &input.session_id);
        if candidates.is_empty() {
            return;
        }
        match self.learnings.append_unique(candidates) {
            Ok(appended) if appended.added > 0 => outcome
                .advisories
                .push(learnings::captured_advisory(appended.added)),
            Ok(_) => {}
            Err(err) => self.degrade(outcome, err),
        }
    }

    fn scan_written(&self, input: &HookInput, paths: &[PathBuf], outcome: &mut HookOutcome) {
        let written = written_content(input);
        let max_bytes = self.config.scanner.max_file_bytes;
        let cap = usize::try_from(self.config.scanner.max_reported_findings).unwrap_or(usize::MAX);

        for path in paths {
            if !ContentScanner::should_scan(path) {
                continue;
            }
            let content = match &written {
                WrittenContent::Full(body) if body.len() as u64 <= max_bytes => Some(body.clone()),
                WrittenContent::Full(_) => None,
                WrittenContent::Fragments(fragments) => self
                    .read_bounded(path, max_bytes)
                    .or_else(|| Some(fragments.join("\n"))),
                WrittenContent::None => self.read_bounded(path, max_bytes),
            };
            let Some(content) = content else {
                self.observer
                    .verbose_log(&format!("scan skipped for {}", path.display()));
                continue;
            };

            let findings = self.scanner.scan(&content);
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            let Some(message) = render_findings(&name, &findings, cap) else {
                continue;
            };
            outcome
                .advisories
                .push(Advisory::new(AdvisoryKind::ScanFindings, message));
            outcome.findings.push(FileFindings {
                path: path.clone(),
                findings,
            });
        }
    }

    fn read_bounded(&self, path: &Path, max_bytes: u64) -> Option<String> {
        let meta = fs::metadata(path).ok()?;
        if !meta.is_file() || meta.len() > max_bytes {
            return None;
        }
        let raw = fs::read(path).ok()?;
        Some(String::from_utf8_lossy(&raw).into_owned())
    }

    fn fingerprint_intent(&self, session_id: &str, prompt: &str, outcome: &mut HookOutcome) {
        let mut fingerprint = self.load_intent(session_id, outcome);
        if self.drift.observe_prompt(&mut fingerprint, prompt)
            && let Err(err) = self.intents.save(&fingerprint)
        {
            self.degrade(outcome, err);
        }
    }

    fn load_session(&self, session_id: &str, outcome: &mut HookOutcome) -> SessionState {
        match self.sessions.try_load(session_id) {
            Ok(Some(state)) => state,
            Ok(None) => SessionState::new(session_id),
            Err(err) => {
                self.degrade(outcome, err);
                SessionState::new(session_id)
            }
        }
    }

    /// `false` when the write failed; advisories tied to it must then be dropped.
    fn save_session(&self, state: &SessionState, outcome: &mut HookOutcome) -> bool {
        match self.sessions.save(state) {
            Ok(()) => true,
            Err(err) => {
                self.degrade(outcome, err);
                false
            }
        }
    }

    fn load_intent(&self, session_id: &str, outcome: &mut HookOutcome) -> IntentFingerprint {
        match self.intents.try_load(session_id) {
            Ok(Some(fingerprint)) => fingerprint,
            Ok(None) => IntentFingerprint::new(session_id),
            Err(err) => {
                self.degrade(outcome, err);
                IntentFingerprint::new(session_id)
            }
        }
    }
}
