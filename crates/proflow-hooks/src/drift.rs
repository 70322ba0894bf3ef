//! Intent drift: compare the vocabulary of recently touched files with the
//! keywords of the session's opening request.

use crate::payload::workspace_relative;
use crate::{Advisory, AdvisoryKind};
use proflow_core::DriftConfig;
use proflow_store::IntentFingerprint;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

const MIN_TOKEN_LEN: usize = 3;
const SHOWN_KEYWORDS: usize = 8;

const PROSE_STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "can", "shall", "to",
    "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "through", "during",
    "before", "after", "above", "below", "between", "and", "but", "or", "nor", "not", "so", "yet",
    "both", "either", "neither", "each", "every", "all", "any", "few", "more", "most", "other",
    "some", "such", "no", "only", "own", "same", "than", "too", "very", "just", "because", "if",
    "when", "where", "how", "what", "which", "who", "whom", "this", "that", "these", "those", "i",
    "me", "my", "we", "us", "our", "you", "your", "he", "him", "his", "she", "her", "it", "its",
    "they", "them", "their", "please", "thanks", "thank",
];

/// Directory and file names that say nothing about what a change is about.
const PATH_STOPWORDS: &[&str] = &[
    "src", "lib", "app", "apps", "index", "mod", "main", "test", "tests", "spec", "components",
    "component", "utils", "util", "pkg", "internal", "public", "assets", "resources", "views",
    "view", "packages", "crates", "cmd", "dist", "build", "module", "modules", "file", "files",
];

pub struct Tokenizer {
    stopwords: HashSet<String>,
}

impl Tokenizer {
    pub fn new(extra_stopwords: &[String]) -> Self {
        let stopwords = PROSE_STOPWORDS
            .iter()
            .chain(PATH_STOPWORDS)
            .map(|word| word.to_string())
            .chain(extra_stopwords.iter().map(|word| word.trim().to_lowercase()))
            .filter(|word| !word.is_empty())
            .collect();
        Self { stopwords }
    }

    pub fn keywords(&self, text: &str) -> BTreeSet<String> {
        split_words(text)
            .into_iter()
            .filter_map(|word| self.normalize(&word))
            .collect()
    }

    /// Tokens of every directory component plus the file stem.
    pub fn path_tokens(&self, path: &Path) -> BTreeSet<String> {
        let mut tokens = BTreeSet::new();
        let components: Vec<_> = path.components().collect();
        for (idx, component) in components.iter().enumerate() {
            let std::path::Component::Normal(part) = component else {
                continue;
            };
            let part = part.to_string_lossy();
            let text = if idx + 1 == components.len() {
                Path::new(part.as_ref())
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
                    .unwrap_or_default()
            } else {
                part.to_string()
            };
            tokens.extend(self.keywords(&text));
        }
        tokens
    }

    fn normalize(&self, word: &str) -> Option<String> {
        if !word.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let word = word.to_ascii_lowercase();
        if self.stopwords.contains(&word) {
            return None;
        }
        let word = singular(&word);
        (word.len() >= MIN_TOKEN_LEN && !self.stopwords.contains(&word)).then_some(word)
    }
}

/// Split on non-alphanumerics, camelCase humps and letter/digit changes.
fn split_words(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (idx, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(&prev) = idx.checked_sub(1).and_then(|p| chars.get(p))
            && prev.is_alphanumeric()
        {
            let next = chars.get(idx + 1).copied();
            let hump = prev.is_lowercase() && c.is_uppercase();
            let acronym_end =
                prev.is_uppercase() && c.is_uppercase() && next.is_some_and(char::is_lowercase);
            let digit_change = prev.is_ascii_digit() != c.is_ascii_digit();
            if (hump || acronym_end || digit_change) && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn singular(word: &str) -> String {
    let keeps_s = word.ends_with("ss") || word.ends_with("us") || word.ends_with("is");
    if word.len() >= 4 && word.ends_with('s') && !keeps_s {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Share of `window` tokens that also appear in `keywords`, as a percentage.
/// `None` when either side is empty: there is nothing to compare.
pub fn relevance(window: &BTreeSet<String>, keywords: &BTreeSet<String>) -> Option<f64> {
    if window.is_empty() || keywords.is_empty() {
        return None;
    }
    let shared = window.intersection(keywords).count();
    Some(shared as f64 / window.len() as f64 * 100.0)
}

pub struct DriftMonitor {
    tokenizer: Tokenizer,
    window_size: u64,
    threshold: f64,
}

impl DriftMonitor {
    pub fn from_config(cfg: &DriftConfig) -> Self {
        Self {
            tokenizer: Tokenizer::new(&cfg.extra_stopwords),
            window_size: cfg.window_size.max(1),
            threshold: cfg.relevance_threshold,
        }
    }

    /// Fingerprint the session's intent unless that already happened.
    pub fn observe_prompt(&self, fingerprint: &mut IntentFingerprint, text: &str) -> bool {
        if fingerprint.keywords().is_some() {
            return false;
        }
        fingerprint.fingerprint(self.tokenizer.keywords(text))
    }

    /// Count one mutating tool call. Returns a warning when a full window scored
    /// below the threshold; the window is reset whenever it is full.
    pub fn observe_edit(
        &self,
        fingerprint: &mut IntentFingerprint,
        paths: &[PathBuf],
        workspace: &Path,
    ) -> Option<Advisory> {
        let tokens: Vec<String> = paths
            .iter()
            .flat_map(|path| {
                self.tokenizer
                    .path_tokens(workspace_relative(path, workspace))
            })
            .collect();
        if fingerprint.record_edit(tokens) < self.window_size {
            return None;
        }

        let advisory = fingerprint.keywords().and_then(|keywords| {
            let score = relevance(&fingerprint.window_tokens, keywords)?;
            (score < self.threshold).then(|| drift_advisory(score, self.window_size, keywords))
        });
        fingerprint.reset_window();
        advisory
    }
}

fn drift_advisory(score: f64, window: u64, keywords: &BTreeSet<String>) -> Advisory {
    let shown: Vec<&str> = keywords
        .iter()
        .take(SHOWN_KEYWORDS)
        .map(String::as_str)
        .collect();
    Advisory::new(
        AdvisoryKind::Drift,
        format!(
            "Drift detected: the last {window} edits have {score:.0}% relevance to the original intent. \
             Original keywords: {}. Consider refocusing or starting a new session.",
            shown.join(", ")
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(&[])
    }

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn monitor() -> DriftMonitor {
        DriftMonitor::from_config(&DriftConfig::default())
    }

    #[test]
    fn prompt_keywords_drop_stopwords_and_short_words() {
        assert_eq!(
            tokenizer().keywords("Fix the login redirect bug, please!"),
            set(&["bug", "fix", "login", "redirect"])
        );
    }

    #[test]
    fn camel_case_digits_and_plurals_are_split_and_folded() {
        assert_eq!(
            tokenizer().keywords("parseHTTPHeaders v2Invoices status"),
            set(&["header", "http", "invoice", "parse", "status"])
        );
    }

    #[test]
    fn path_tokens_skip_generic_segments_and_extensions() {
        assert_eq!(
            tokenizer().path_tokens(Path::new("src/billing/InvoiceTotals.tsx")),
            set(&["billing", "invoice", "total"])
        );
        assert_eq!(
            tokenizer().path_tokens(Path::new("lib/mod.rs")),
            BTreeSet::new()
        );
    }

    #[test]
    fn extra_stopwords_are_honoured() {
        let tokenizer = Tokenizer::new(&["Billing".to_string()]);
        assert_eq!(
            tokenizer.path_tokens(Path::new("billing/invoice.rs")),
            set(&["invoice"])
        );
    }

    #[test]
    fn relevance_is_share_of_touched_tokens() {
        let keywords = set(&["login", "redirect"]);
        assert_eq!(relevance(&set(&["login", "session"]), &keywords), Some(50.0));
        assert_eq!(relevance(&set(&["billing"]), &keywords), Some(0.0));
        assert_eq!(relevance(&BTreeSet::new(), &keywords), None);
        assert_eq!(relevance(&set(&["login"]), &BTreeSet::new()), None);
    }

    #[test]
    fn off_topic_window_warns_once_and_resets() {
        let monitor = monitor();
        let workspace = Path::new("/work/app");
        let mut fp = IntentFingerprint::new("s");
        assert!(monitor.observe_prompt(&mut fp, "fix the login redirect bug"));

        let files = ["invoice", "ledger", "payment", "refund", "tax", "receipt"];
        let mut warnings = Vec::new();
        for name in files {
            let path = workspace.join(format!("billing/{name}.rs"));
            if let Some(advisory) = monitor.observe_edit(&mut fp, &[path], workspace) {
                warnings.push(advisory);
            }
        }
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, AdvisoryKind::Drift);
        assert!(warnings[0].message.contains("0% relevance"));
        assert!(warnings[0].message.contains("login"));
        assert_eq!(fp.edits_since_check, 0);
        assert!(fp.window_tokens.is_empty());
    }

    #[test]
    fn on_topic_window_stays_quiet() {
        let monitor = monitor();
        let workspace = Path::new("/work/app");
        let mut fp = IntentFingerprint::new("s");
        monitor.observe_prompt(&mut fp, "fix the login redirect bug");
        for _ in 0..6 {
            let path = workspace.join("auth/login_redirect.rs");
            assert!(monitor.observe_edit(&mut fp, &[path], workspace).is_none());
        }
        assert_eq!(fp.edits_since_check, 0);
    }

    #[test]
    fn empty_keywords_never_warn() {
        let monitor = monitor();
        let workspace = Path::new("/w");
        let mut fp = IntentFingerprint::new("s");
        assert!(monitor.observe_prompt(&mut fp, "please do it"));
        assert_eq!(fp.keywords().map(BTreeSet::len), Some(0));
        for i in 0..24 {
            let path = workspace.join(format!("billing/file{i}.rs"));
            assert!(monitor.observe_edit(&mut fp, &[path], workspace).is_none());
        }
    }

    #[test]
    fn first_prompt_wins() {
        let monitor = monitor();
        let mut fp = IntentFingerprint::new("s");
        monitor.observe_prompt(&mut fp, "login redirect");
        assert!(!monitor.observe_prompt(&mut fp, "billing invoices"));
        assert_eq!(fp.keywords(), Some(&set(&["login", "redirect"])));
    }

    #[test]
    fn window_without_fingerprint_resets_silently() {
        let monitor = monitor();
        let workspace = Path::new("/w");
        let mut fp = IntentFingerprint::new("s");
        for _ in 0..6 {
            let path = workspace.join("billing/invoice.rs");
            assert!(monitor.observe_edit(&mut fp, &[path], workspace).is_none());
        }
        assert_eq!(fp.edits_since_check, 0);
    }

    proptest! {
        #[test]
        fn relevance_is_a_bounded_pure_function(
            window in proptest::collection::btree_set("[a-e]{3}", 0..8),
            keywords in proptest::collection::btree_set("[a-e]{3}", 0..8),
        ) {
            let first = relevance(&window, &keywords);
            prop_assert_eq!(first, relevance(&window, &keywords));
            if let Some(score) = first {
                prop_assert!((0.0..=100.0).contains(&score));
            }
        }
    }
}
