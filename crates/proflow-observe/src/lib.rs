use anyhow::Result;
use chrono::Utc;
use proflow_core::{ADVISORY_PREFIX, runtime_dir};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only line log under the workspace runtime directory.
///
/// Logging is best effort: callers ignore its errors, and an observer that
/// could not be created degrades to [`Observer::disabled`].
pub struct Observer {
    log_path: Option<PathBuf>,
    verbose: bool,
}

impl Observer {
    pub fn new(workspace: &Path) -> Result<Self> {
        let dir = runtime_dir(workspace);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            log_path: Some(dir.join("observe.log")),
            verbose: false,
        })
    }

    /// An observer that writes nowhere except, in verbose mode, stderr.
    pub fn disabled() -> Self {
        Self {
            log_path: None,
            verbose: false,
        }
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    pub fn record_event<T: Serialize>(&self, event: &T) -> Result<()> {
        let line = format!(
            "{} EVENT {}",
            Utc::now().to_rfc3339(),
            serde_json::to_string(event)?
        );
        self.verbose_log(&line);
        self.append_log_line(&line)
    }

    /// Enable or disable mirroring of log lines to stderr.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn verbose_log(&self, msg: &str) {
        if self.verbose {
            eprintln!("{ADVISORY_PREFIX} {msg}");
        }
    }

    /// Record a degraded operation. Always goes to the log file; stderr only in verbose mode.
    pub fn warn_log(&self, msg: &str) {
        self.verbose_log(&format!("WARN {msg}"));
        let _ = self.append_log_line(&format!("{} WARN {msg}", Utc::now().to_rfc3339()));
    }

    fn append_log_line(&self, line: &str) -> Result<()> {
        let Some(path) = &self.log_path else {
            return Ok(());
        };
        let mut f = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_log(observer: &Observer) -> String {
        fs::read_to_string(observer.log_path().expect("log path")).expect("read log")
    }

    #[test]
    fn events_and_warnings_are_appended() {
        let workspace = tempfile::tempdir().expect("tempdir");
        let observer = Observer::new(workspace.path()).expect("observer");
        observer
            .record_event(&json!({"event": "Stop", "session_id": "s-1"}))
            .expect("record");
        observer.warn_log("write_failed: disk full");

        let log = read_log(&observer);
        let lines: Vec<_> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(" EVENT {"));
        assert!(lines[0].contains("\"session_id\":\"s-1\""));
        assert!(lines[1].ends_with("WARN write_failed: disk full"));
        assert!(
            observer.log_path().expect("path").starts_with(workspace.path().join(".proflow"))
        );
    }

    #[test]
    fn timestamps_are_rfc3339() {
        let workspace = tempfile::tempdir().expect("tempdir");
        let observer = Observer::new(workspace.path()).expect("observer");
        observer.warn_log("x");
        let log = read_log(&observer);
        let stamp = log.split_whitespace().next().expect("stamp");
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn disabled_observer_swallows_everything() {
        let mut observer = Observer::disabled();
        assert!(observer.log_path().is_none());
        observer.record_event(&json!({"event": "Stop"})).expect("record");
        observer.warn_log("ignored");
        observer.set_verbose(true);
        assert!(observer.is_verbose());
    }
}
