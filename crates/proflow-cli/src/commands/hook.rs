use anyhow::Result;
use proflow_core::{HookError, HookFlag, ProflowConfig};
use proflow_hooks::{HookEvent, HookInput, HookRuntime};
use proflow_observe::Observer;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::HookArgs;
use crate::output::emit_outcome;

/// Never returns an error: the host's turn must not depend on this process.
pub(crate) fn run_hook(cwd: &Path, args: HookArgs, json_mode: bool, verbose: bool) -> Result<()> {
    let mut raw = String::new();
    let read = std::io::stdin().read_to_string(&mut raw);

    let input = match read {
        Ok(_) => HookInput::from_json(&raw),
        Err(err) => Err(HookError::MalformedInput(err.to_string())),
    };
    let input = match input {
        Ok(input) => input,
        Err(err) => {
            observer_for(cwd, verbose).warn_log(&format!("hook {}: {err}", err.kind()));
            return Ok(());
        }
    };

    let workspace = resolve_workspace(cwd, &input);
    let observer = observer_for(&workspace, verbose);

    let event = match args.event.as_deref() {
        Some(name) => HookEvent::parse_event(name),
        None => input.event(),
    };
    let Some(event) = event else {
        let name = args
            .event
            .as_deref()
            .or(input.hook_event_name.as_deref())
            .unwrap_or("<none>");
        observer.warn_log(&format!("hook ignored unknown event {name}"));
        return Ok(());
    };

    let loaded = ProflowConfig::load(&workspace);
    for issue in &loaded.issues {
        observer.warn_log(&format!("config {}: {issue}", issue.kind()));
    }
    let mut config = loaded.config;
    for flag in &args.enable {
        match HookFlag::parse_flag(flag) {
            Some(flag) => config.hooks.enable(flag),
            None => observer.warn_log(&format!("hook ignored unknown flag {flag}")),
        }
    }

    let runtime = HookRuntime::new(&workspace, config).with_observer(observer);
    let outcome = runtime.fire(event, &input);
    if let Err(err) = emit_outcome(&outcome, json_mode) {
        runtime
            .observer()
            .warn_log(&format!("hook output failed: {err}"));
    }
    Ok(())
}

/// The payload's `cwd` when it names an existing directory, else the process cwd.
fn resolve_workspace(cwd: &Path, input: &HookInput) -> PathBuf {
    match &input.cwd {
        Some(dir) if dir.is_dir() => dir.clone(),
        _ => cwd.to_path_buf(),
    }
}

fn observer_for(workspace: &Path, verbose: bool) -> Observer {
    let mut observer = Observer::new(workspace).unwrap_or_else(|_| Observer::disabled());
    observer.set_verbose(verbose);
    observer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_cwd_wins_only_when_it_exists() {
        let tmp = tempfile::tempdir().expect("tmp");
        let fallback = Path::new("/fallback");

        let input = HookInput {
            cwd: Some(tmp.path().to_path_buf()),
            ..HookInput::default()
        };
        assert_eq!(resolve_workspace(fallback, &input), tmp.path());

        let input = HookInput {
            cwd: Some(tmp.path().join("missing")),
            ..HookInput::default()
        };
        assert_eq!(resolve_workspace(fallback, &input), fallback);
        assert_eq!(resolve_workspace(fallback, &HookInput::default()), fallback);
    }
}
