use anyhow::Result;
use clap::Subcommand;
use proflow_core::ProflowConfig;
use serde_json::json;
use std::path::Path;

use crate::output::print_json;

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Print the effective settings and any values that fell back to defaults
    Show,
    /// Write the default settings to .proflow/settings.json
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

pub(crate) fn run_config(cwd: &Path, cmd: ConfigCmd, json_mode: bool) -> Result<()> {
    match cmd {
        ConfigCmd::Show => {
            let loaded = ProflowConfig::load(cwd);
            let issues: Vec<_> = loaded
                .issues
                .iter()
                .map(|issue| json!({"kind": issue.kind(), "message": issue.to_string()}))
                .collect();
            if json_mode {
                print_json(&json!({"config": loaded.config, "issues": issues}))?;
            } else {
                println!("{}", serde_json::to_string_pretty(&loaded.config)?);
                for issue in &loaded.issues {
                    eprintln!("warning: {issue}");
                }
            }
        }
        ConfigCmd::Init { force } => {
            let path = ProflowConfig::project_settings_path(cwd);
            let written = if path.exists() && !force {
                false
            } else {
                ProflowConfig::default().save(cwd)?;
                true
            };
            if json_mode {
                print_json(&json!({"path": path, "written": written}))?;
            } else if written {
                println!("Wrote {}", path.display());
            } else {
                println!("{} already exists (use --force to overwrite)", path.display());
            }
        }
    }
    Ok(())
}
