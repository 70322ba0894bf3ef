use anyhow::Result;
use clap::Subcommand;
use proflow_core::project_name;
use proflow_store::LearningsStore;
use std::path::Path;

use crate::output::print_json;

#[derive(Subcommand)]
pub enum LearningsCmd {
    /// List learnings visible from a project, most recent first
    List {
        /// Project name (defaults to the current directory name)
        #[arg(long)]
        project: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

pub(crate) fn run_learnings(workspace: &Path, command: LearningsCmd, json_mode: bool) -> Result<()> {
    let store = LearningsStore::new(workspace);

    match command {
        LearningsCmd::List { project, limit } => {
            let project = project.unwrap_or_else(|| project_name(workspace));
            let entries = store.recent_for_project(&project, limit)?;
            if json_mode {
                return print_json(&entries);
            }
            if entries.is_empty() {
                println!("No learnings recorded for {project}.");
                return Ok(());
            }
            for entry in entries {
                println!(
                    "{}  [{}] {} ({})",
                    entry.created_at.format("%Y-%m-%d"),
                    entry.category,
                    entry.rule,
                    entry.scope.label()
                );
                if let Some(mistake) = &entry.mistake {
                    println!("    mistake: {mistake}");
                }
                if let Some(correction) = &entry.correction {
                    println!("    correction: {correction}");
                }
            }
        }
    }
    Ok(())
}
