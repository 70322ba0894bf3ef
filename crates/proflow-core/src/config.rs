use crate::{HookError, Result, home_dir, runtime_dir};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Named on/off switch for one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookFlag {
    EditTracking,
    DriftDetection,
    LearningCapture,
    SessionCheck,
    CorrectionDetection,
    LoadLearningsOnStart,
    LoadContext,
}

impl HookFlag {
    pub const ALL: [HookFlag; 7] = [
        Self::EditTracking,
        Self::DriftDetection,
        Self::LearningCapture,
        Self::SessionCheck,
        Self::CorrectionDetection,
        Self::LoadLearningsOnStart,
        Self::LoadContext,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EditTracking => "edit-tracking",
            Self::DriftDetection => "drift-detection",
            Self::LearningCapture => "learning-capture",
            Self::SessionCheck => "session-check",
            Self::CorrectionDetection => "correction-detection",
            Self::LoadLearningsOnStart => "load-learnings-on-start",
            Self::LoadContext => "load-context",
        }
    }

    /// Accepts kebab or snake case, plus the short forms used by older hook command lines.
    pub fn parse_flag(value: &str) -> Option<Self> {
        let normalized = value.trim().trim_start_matches("--").replace('_', "-");
        match normalized.to_ascii_lowercase().as_str() {
            "edit-tracking" | "track-edits" => Some(Self::EditTracking),
            "drift-detection" | "detect-drift" => Some(Self::DriftDetection),
            "learning-capture" | "learn-capture" => Some(Self::LearningCapture),
            "session-check" => Some(Self::SessionCheck),
            "correction-detection" | "detect-corrections" => Some(Self::CorrectionDetection),
            "load-learnings-on-start" | "load-learnings" => Some(Self::LoadLearningsOnStart),
            "load-context" => Some(Self::LoadContext),
            _ => None,
        }
    }
}

/// Per-handler switches. Everything is off until configured; the scanner has no switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookFlags {
    pub edit_tracking: bool,
    pub drift_detection: bool,
    pub learning_capture: bool,
    pub session_check: bool,
    pub correction_detection: bool,
    pub load_learnings_on_start: bool,
    pub load_context: bool,
}

impl HookFlags {
    pub fn enable(&mut self, flag: HookFlag) {
        *self.slot(flag) = true;
    }

    pub fn is_enabled(&self, flag: HookFlag) -> bool {
        match flag {
            HookFlag::EditTracking => self.edit_tracking,
            HookFlag::DriftDetection => self.drift_detection,
            HookFlag::LearningCapture => self.learning_capture,
            HookFlag::SessionCheck => self.session_check,
            HookFlag::CorrectionDetection => self.correction_detection,
            HookFlag::LoadLearningsOnStart => self.load_learnings_on_start,
            HookFlag::LoadContext => self.load_context,
        }
    }

    fn slot(&mut self, flag: HookFlag) -> &mut bool {
        match flag {
            HookFlag::EditTracking => &mut self.edit_tracking,
            HookFlag::DriftDetection => &mut self.drift_detection,
            HookFlag::LearningCapture => &mut self.learning_capture,
            HookFlag::SessionCheck => &mut self.session_check,
            HookFlag::CorrectionDetection => &mut self.correction_detection,
            HookFlag::LoadLearningsOnStart => &mut self.load_learnings_on_start,
            HookFlag::LoadContext => &mut self.load_context,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditTrackingConfig {
    /// Explicit edit counts that trigger a quality-gate reminder.
    pub warn_steps: Vec<u64>,
    /// After the largest step, fire on every multiple of this value (0 disables).
    pub repeat_every: u64,
}

impl Default for EditTrackingConfig {
    fn default() -> Self {
        Self {
            warn_steps: vec![5, 10],
            repeat_every: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    pub window_size: u64,
    /// Percentage below which a window counts as drifted.
    pub relevance_threshold: f64,
    /// Added to the built-in stopword list for keyword and path tokenization.
    pub extra_stopwords: Vec<String>,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            window_size: 6,
            relevance_threshold: 20.0,
            extra_stopwords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionCheckConfig {
    pub reminder_interval: u64,
}

impl Default for SessionCheckConfig {
    fn default() -> Self {
        Self {
            reminder_interval: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Files larger than this are not read back from disk for scanning.
    pub max_file_bytes: u64,
    pub max_reported_findings: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 512 * 1024,
            max_reported_findings: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningsConfig {
    /// How many learnings are surfaced at session start.
    pub load_limit: u64,
    pub transcript_tail_lines: u64,
    pub transcript_max_bytes: u64,
}

impl Default for LearningsConfig {
    fn default() -> Self {
        Self {
            load_limit: 10,
            transcript_tail_lines: 50,
            transcript_max_bytes: 256 * 1024,
        }
    }
}

/// Project files summarised into the session-start context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectContextConfig {
    /// Workspace-relative paths, read in order; missing files are skipped.
    pub files: Vec<String>,
    pub max_chars_per_file: u64,
}

impl Default for ProjectContextConfig {
    fn default() -> Self {
        Self {
            files: vec![
                ".proflow/CONTEXT.md".to_string(),
                ".claude/CONTEXT.md".to_string(),
                ".claude/TODO.md".to_string(),
                "TODO.md".to_string(),
                ".github/ISSUE_TEMPLATE.md".to_string(),
            ],
            max_chars_per_file: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeightsConfig {
    pub code_location: f64,
    pub requirement_clarity: f64,
    pub side_effect_safety: f64,
    pub test_coverage: f64,
    pub prior_success: f64,
}

impl Default for ConfidenceWeightsConfig {
    fn default() -> Self {
        Self {
            code_location: 0.25,
            requirement_clarity: 0.25,
            side_effect_safety: 0.2,
            test_coverage: 0.15,
            prior_success: 0.15,
        }
    }
}

impl ConfidenceWeightsConfig {
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.code_location,
            self.requirement_clarity,
            self.side_effect_safety,
            self.test_coverage,
            self.prior_success,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub weights: ConfidenceWeightsConfig,
    /// Aggregates strictly below this ask a clarifying question.
    pub ask_below: f64,
    /// Aggregates strictly above this proceed without a caveat.
    pub silent_above: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            weights: ConfidenceWeightsConfig::default(),
            ask_below: 40.0,
            silent_above: 70.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProflowConfig {
    pub hooks: HookFlags,
    pub edits: EditTrackingConfig,
    pub drift: DriftConfig,
    pub session: SessionCheckConfig,
    pub scanner: ScannerConfig,
    pub learnings: LearningsConfig,
    pub context: ProjectContextConfig,
    pub confidence: ConfidenceConfig,
}

/// Effective configuration plus every setting that had to fall back.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: ProflowConfig,
    pub issues: Vec<HookError>,
}

impl ProflowConfig {
    pub fn user_settings_path() -> Option<PathBuf> {
        Some(home_dir()?.join(".proflow/settings.json"))
    }

    pub fn project_settings_path(workspace: &Path) -> PathBuf {
        runtime_dir(workspace).join("settings.json")
    }

    pub fn project_local_settings_path(workspace: &Path) -> PathBuf {
        runtime_dir(workspace).join("settings.local.json")
    }

    pub fn legacy_toml_path(workspace: &Path) -> PathBuf {
        runtime_dir(workspace).join("config.toml")
    }

    /// Layer every settings source over the defaults. Never fails: unreadable
    /// sources are skipped and invalid values fall back one setting at a time.
    pub fn load(workspace: &Path) -> LoadedConfig {
        let mut issues = Vec::new();
        let defaults = match serde_json::to_value(Self::default()) {
            Ok(value) => value,
            Err(err) => {
                issues.push(HookError::config_invalid("<defaults>", err));
                return LoadedConfig {
                    config: Self::default(),
                    issues,
                };
            }
        };
        let mut merged = defaults.clone();

        let legacy = Self::legacy_toml_path(workspace);
        if legacy.exists() {
            match read_toml_source(&legacy) {
                Ok(value) => overlay_source(&mut merged, value),
                Err(err) => issues.push(HookError::config_invalid(
                    legacy.display().to_string(),
                    err,
                )),
            }
        }

        let mut paths = Vec::new();
        if let Some(user) = Self::user_settings_path() {
            paths.push(user);
        }
        paths.push(Self::project_settings_path(workspace));
        paths.push(Self::project_local_settings_path(workspace));

        for path in paths {
            if !path.exists() {
                continue;
            }
            match read_json_source(&path) {
                Ok(value) => overlay_source(&mut merged, value),
                Err(err) => issues.push(HookError::config_invalid(path.display().to_string(), err)),
            }
        }

        let config = Self::from_merged(&defaults, merged, &mut issues);
        LoadedConfig { config, issues }
    }

    fn from_merged(defaults: &Value, mut merged: Value, issues: &mut Vec<HookError>) -> Self {
        drop_unknown_flags(defaults, &mut merged, issues);
        sanitize_against(defaults, &mut merged, "", issues);

        if serde_json::from_value::<Self>(merged.clone()).is_err()
            && let (Value::Object(def_obj), Value::Object(merged_obj)) = (defaults, &mut merged)
        {
            for (section, def_value) in def_obj {
                let Some(candidate) = merged_obj.get(section) else {
                    continue;
                };
                let mut probe = defaults.clone();
                if let Value::Object(probe_obj) = &mut probe {
                    probe_obj.insert(section.clone(), candidate.clone());
                }
                if let Err(err) = serde_json::from_value::<Self>(probe) {
                    issues.push(HookError::config_invalid(section.clone(), err));
                    merged_obj.insert(section.clone(), def_value.clone());
                }
            }
        }

        let mut config = match serde_json::from_value::<Self>(merged) {
            Ok(config) => config,
            Err(err) => {
                issues.push(HookError::config_invalid("<settings>", err));
                Self::default()
            }
        };
        config.validate(issues);
        config
    }

    /// Semantic checks that the type system cannot express. Each failing
    /// setting is reset to its default independently.
    pub fn validate(&mut self, issues: &mut Vec<HookError>) {
        let edit_defaults = EditTrackingConfig::default();
        if self.edits.warn_steps.contains(&0) {
            issues.push(HookError::config_invalid(
                "edits.warn_steps",
                "steps must be positive",
            ));
            self.edits.warn_steps = edit_defaults.warn_steps;
        }
        self.edits.warn_steps.sort_unstable();
        self.edits.warn_steps.dedup();

        let drift_defaults = DriftConfig::default();
        if self.drift.window_size == 0 {
            issues.push(HookError::config_invalid(
                "drift.window_size",
                "must be at least 1",
            ));
            self.drift.window_size = drift_defaults.window_size;
        }
        if !(0.0..=100.0).contains(&self.drift.relevance_threshold) {
            issues.push(HookError::config_invalid(
                "drift.relevance_threshold",
                "must be a percentage between 0 and 100",
            ));
            self.drift.relevance_threshold = drift_defaults.relevance_threshold;
        }

        if self.session.reminder_interval == 0 {
            issues.push(HookError::config_invalid(
                "session.reminder_interval",
                "must be at least 1",
            ));
            self.session.reminder_interval = SessionCheckConfig::default().reminder_interval;
        }

        if self.context.max_chars_per_file == 0 {
            issues.push(HookError::config_invalid(
                "context.max_chars_per_file",
                "must be at least 1",
            ));
            self.context.max_chars_per_file = ProjectContextConfig::default().max_chars_per_file;
        }

        let scanner_defaults = ScannerConfig::default();
        if self.scanner.max_file_bytes == 0 {
            issues.push(HookError::config_invalid(
                "scanner.max_file_bytes",
                "must be at least 1",
            ));
            self.scanner.max_file_bytes = scanner_defaults.max_file_bytes;
        }

        let weights = self.confidence.weights.as_array();
        let sum: f64 = weights.iter().sum();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || (sum - 1.0).abs() > 1e-6 {
            issues.push(HookError::config_invalid(
                "confidence.weights",
                format!("weights must be non-negative and sum to 1.0 (got {sum:.3})"),
            ));
            self.confidence.weights = ConfidenceWeightsConfig::default();
        }
        let confidence_defaults = ConfidenceConfig::default();
        if !(0.0..=100.0).contains(&self.confidence.ask_below) {
            issues.push(HookError::config_invalid(
                "confidence.ask_below",
                "must be between 0 and 100",
            ));
            self.confidence.ask_below = confidence_defaults.ask_below;
        }
        if !(0.0..=100.0).contains(&self.confidence.silent_above) {
            issues.push(HookError::config_invalid(
                "confidence.silent_above",
                "must be between 0 and 100",
            ));
            self.confidence.silent_above = confidence_defaults.silent_above;
        }
        if self.confidence.ask_below > self.confidence.silent_above {
            issues.push(HookError::config_invalid(
                "confidence.ask_below",
                "must not exceed confidence.silent_above",
            ));
            self.confidence.ask_below = confidence_defaults.ask_below;
            self.confidence.silent_above = confidence_defaults.silent_above;
        }
    }

    pub fn save(&self, workspace: &Path) -> Result<PathBuf> {
        let path = Self::project_settings_path(workspace);
        fs::create_dir_all(
            path.parent()
                .ok_or_else(|| anyhow::anyhow!("invalid config path"))?,
        )?;
        fs::write(&path, serde_json::to_vec_pretty(self)?)?;
        Ok(path)
    }
}

fn read_json_source(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn read_toml_source(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)?;
    let table: toml::Table = toml::from_str(&raw)?;
    Ok(serde_json::to_value(table)?)
}

fn merge_json_value(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_obj), Value::Object(overlay_obj)) => {
            for (key, overlay_value) in overlay_obj {
                if let Some(base_value) = base_obj.get_mut(key) {
                    merge_json_value(base_value, overlay_value);
                } else {
                    base_obj.insert(key.clone(), overlay_value.clone());
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

/// Merge one settings source after rewriting its handler flag names to field names,
/// so `edit-tracking` and `track-edits` both land on `edit_tracking`.
fn overlay_source(merged: &mut Value, mut source: Value) {
    if let Some(Value::Object(hooks)) = source.get_mut("hooks") {
        let renamed = std::mem::take(hooks)
            .into_iter()
            .map(|(key, value)| match HookFlag::parse_flag(&key) {
                Some(flag) => (flag.as_str().replace('-', "_"), value),
                None => (key, value),
            })
            .collect();
        *hooks = renamed;
    }
    merge_json_value(merged, &source);
}

/// Keys under `hooks` that name no handler are reported and removed.
fn drop_unknown_flags(defaults: &Value, merged: &mut Value, issues: &mut Vec<HookError>) {
    let (Some(Value::Object(known)), Some(Value::Object(hooks))) =
        (defaults.get("hooks"), merged.get_mut("hooks"))
    else {
        return;
    };
    hooks.retain(|key, _| {
        if known.contains_key(key) {
            return true;
        }
        issues.push(HookError::config_invalid(
            format!("hooks.{key}"),
            "unknown handler flag",
        ));
        false
    });
}

/// Element shape for list settings whose default is empty.
fn list_element(path: &str) -> Option<Value> {
    match path {
        "drift.extra_stopwords" | "context.files" => Some(Value::String(String::new())),
        _ => None,
    }
}

/// Replace every leaf whose JSON shape disagrees with the default's shape.
fn sanitize_against(default: &Value, candidate: &mut Value, path: &str, issues: &mut Vec<HookError>) {
    if let (Value::Object(def_obj), Value::Object(cand_obj)) = (default, &mut *candidate) {
        for (key, def_value) in def_obj {
            if let Some(cand_value) = cand_obj.get_mut(key) {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                sanitize_against(def_value, cand_value, &child, issues);
            }
        }
        return;
    }
    let fits = match (default, &*candidate, list_element(path)) {
        (Value::Array(items), Value::Array(cand_items), Some(element)) if items.is_empty() => {
            cand_items.iter().all(|item| same_shape(&element, item))
        }
        _ => same_shape(default, candidate),
    };
    if !fits {
        issues.push(HookError::config_invalid(
            path,
            format!("expected {}, found {}", describe(default), describe(candidate)),
        ));
        *candidate = default.clone();
    }
}

fn same_shape(default: &Value, candidate: &Value) -> bool {
    match default {
        Value::Null => candidate.is_null(),
        Value::Bool(_) => candidate.is_boolean(),
        Value::Number(n) if n.is_u64() => candidate.is_u64(),
        Value::Number(_) => candidate.is_number(),
        Value::String(_) => candidate.is_string(),
        Value::Array(items) => match (candidate, items.first()) {
            (Value::Array(cand_items), Some(sample)) => {
                cand_items.iter().all(|item| same_shape(sample, item))
            }
            (Value::Array(_), None) => true,
            _ => false,
        },
        Value::Object(_) => candidate.is_object(),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_u64() => "non-negative integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn load_from(settings: Value) -> LoadedConfig {
        let defaults = serde_json::to_value(ProflowConfig::default()).expect("defaults");
        let mut merged = defaults.clone();
        overlay_source(&mut merged, settings);
        let mut issues = Vec::new();
        let config = ProflowConfig::from_merged(&defaults, merged, &mut issues);
        LoadedConfig { config, issues }
    }

    #[test]
    fn defaults_keep_every_handler_off() {
        let cfg = ProflowConfig::default();
        for flag in HookFlag::ALL {
            assert!(!cfg.hooks.is_enabled(flag), "{} should default off", flag.as_str());
        }
        assert_eq!(cfg.edits.warn_steps, vec![5, 10]);
        assert_eq!(cfg.drift.window_size, 6);
        assert_eq!(cfg.session.reminder_interval, 20);
    }

    #[test]
    fn flag_parsing_accepts_legacy_names() {
        assert_eq!(HookFlag::parse_flag("--detect-drift"), Some(HookFlag::DriftDetection));
        assert_eq!(HookFlag::parse_flag("learn_capture"), Some(HookFlag::LearningCapture));
        assert_eq!(
            HookFlag::parse_flag("Load-Learnings-On-Start"),
            Some(HookFlag::LoadLearningsOnStart)
        );
        assert_eq!(HookFlag::parse_flag("telepathy"), None);
        for flag in HookFlag::ALL {
            assert_eq!(HookFlag::parse_flag(flag.as_str()), Some(flag));
        }
    }

    #[test]
    fn wrong_type_falls_back_for_that_setting_only() {
        let loaded = load_from(json!({
            "drift": { "window_size": "six", "relevance_threshold": 35 },
            "hooks": { "drift_detection": true }
        }));
        assert_eq!(loaded.config.drift.window_size, 6);
        assert_eq!(loaded.config.drift.relevance_threshold, 35.0);
        assert!(loaded.config.hooks.drift_detection);
        assert_eq!(loaded.issues.len(), 1);
        assert!(loaded.issues[0].to_string().contains("drift.window_size"));
    }

    #[test]
    fn zero_interval_and_bad_weights_reset_independently() {
        let loaded = load_from(json!({
            "session": { "reminder_interval": 0 },
            "confidence": { "weights": { "code_location": 0.9 } },
            "edits": { "repeat_every": 25 }
        }));
        assert_eq!(loaded.config.session.reminder_interval, 20);
        assert_eq!(
            loaded.config.confidence.weights,
            ConfidenceWeightsConfig::default()
        );
        assert_eq!(loaded.config.edits.repeat_every, 25);
        assert_eq!(loaded.issues.len(), 2);
    }

    #[test]
    fn warn_steps_are_sorted_and_deduplicated() {
        let loaded = load_from(json!({ "edits": { "warn_steps": [15, 3, 15] } }));
        assert_eq!(loaded.config.edits.warn_steps, vec![3, 15]);
        assert!(loaded.issues.is_empty());

        let loaded = load_from(json!({ "edits": { "warn_steps": [3, 0] } }));
        assert_eq!(loaded.config.edits.warn_steps, vec![5, 10]);
        assert_eq!(loaded.issues.len(), 1);
    }

    #[test]
    fn non_string_stopwords_reset_only_that_list() {
        let loaded = load_from(json!({
            "drift": { "extra_stopwords": [1], "window_size": 3, "relevance_threshold": 35.0 }
        }));
        assert!(loaded.config.drift.extra_stopwords.is_empty());
        assert_eq!(loaded.config.drift.window_size, 3);
        assert_eq!(loaded.config.drift.relevance_threshold, 35.0);
        assert_eq!(loaded.issues.len(), 1);
        assert!(loaded.issues[0].to_string().contains("drift.extra_stopwords"));

        let loaded = load_from(json!({ "drift": { "extra_stopwords": ["widget"] } }));
        assert_eq!(loaded.config.drift.extra_stopwords, vec!["widget".to_string()]);
        assert!(loaded.issues.is_empty());
    }

    #[test]
    fn kebab_and_legacy_flag_keys_enable_handlers() {
        let loaded = load_from(json!({
            "hooks": { "edit-tracking": true, "track-edits": true, "load-learnings": true, "load_context": true }
        }));
        assert!(loaded.config.hooks.edit_tracking);
        assert!(loaded.config.hooks.load_learnings_on_start);
        assert!(loaded.config.hooks.load_context);
        assert!(loaded.issues.is_empty());
    }

    #[test]
    fn unknown_flag_keys_are_reported() {
        let loaded = load_from(json!({ "hooks": { "telepathy": true, "session-check": true } }));
        assert!(loaded.config.hooks.session_check);
        assert_eq!(loaded.issues.len(), 1);
        assert!(loaded.issues[0].to_string().contains("hooks.telepathy"));
    }

    #[test]
    fn mistyped_kebab_flag_resets_only_that_flag() {
        let loaded = load_from(json!({
            "hooks": { "edit-tracking": "yes", "drift-detection": true }
        }));
        assert!(!loaded.config.hooks.edit_tracking);
        assert!(loaded.config.hooks.drift_detection);
        assert_eq!(loaded.issues.len(), 1);
        assert!(loaded.issues[0].to_string().contains("hooks.edit_tracking"));
    }

    #[test]
    fn inverted_cutoffs_restore_both_defaults() {
        let loaded = load_from(json!({ "confidence": { "ask_below": 80.0, "silent_above": 50.0 } }));
        assert_eq!(loaded.config.confidence.ask_below, 40.0);
        assert_eq!(loaded.config.confidence.silent_above, 70.0);
        assert_eq!(loaded.issues.len(), 1);
    }

    #[test]
    fn load_layers_project_files_and_skips_unreadable_ones() {
        let workspace = tempfile::tempdir().expect("workspace");
        let dir = runtime_dir(workspace.path());
        fs::create_dir_all(&dir).expect("runtime dir");
        fs::write(
            dir.join("config.toml"),
            "[hooks]\nedit_tracking = true\n[session]\nreminder_interval = 5\n",
        )
        .expect("legacy");
        fs::write(
            dir.join("settings.json"),
            r#"{"session":{"reminder_interval":8}}"#,
        )
        .expect("project");
        fs::write(dir.join("settings.local.json"), "{not json").expect("local");

        let loaded = ProflowConfig::load(workspace.path());
        assert!(loaded.config.hooks.edit_tracking);
        assert_eq!(loaded.config.session.reminder_interval, 8);
        assert!(
            loaded
                .issues
                .iter()
                .any(|issue| issue.to_string().contains("settings.local.json"))
        );
    }

    #[test]
    fn save_then_load_round_trips_flags() {
        let workspace = tempfile::tempdir().expect("workspace");
        let mut cfg = ProflowConfig::default();
        cfg.hooks.enable(HookFlag::SessionCheck);
        cfg.save(workspace.path()).expect("save");
        let loaded = ProflowConfig::load(workspace.path());
        assert!(loaded.config.hooks.session_check);
    }

    proptest! {
        #[test]
        fn merge_json_value_is_idempotent_for_flat_objects(
            base in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..12),
            overlay in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..12),
        ) {
            let mut base_value = json!(base);
            let overlay_value = json!(overlay);
            merge_json_value(&mut base_value, &overlay_value);
            let once = base_value.clone();
            merge_json_value(&mut base_value, &overlay_value);
            prop_assert_eq!(base_value, once);
        }

        #[test]
        fn any_window_size_value_yields_a_usable_config(raw in any::<i64>()) {
            let loaded = load_from(json!({ "drift": { "window_size": raw } }));
            prop_assert!(loaded.config.drift.window_size >= 1);
        }
    }
}
