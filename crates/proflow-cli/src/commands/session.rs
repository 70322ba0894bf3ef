use anyhow::Result;
use clap::Subcommand;
use proflow_store::SessionStore;
use std::path::Path;

use crate::output::print_json;

#[derive(Subcommand)]
pub enum SessionCmd {
    /// Show the counters recorded for a session
    Show {
        /// Session ID as sent by the host
        id: String,
    },
}

pub(crate) fn run_session_cmd(workspace: &Path, command: SessionCmd, json_mode: bool) -> Result<()> {
    let store = SessionStore::new(workspace);

    match command {
        SessionCmd::Show { id } => {
            let session = store.try_load(&id)?;
            if json_mode {
                return print_json(&session);
            }
            match session {
                Some(s) => {
                    println!("Session ID: {}", s.session_id);
                    println!("Edits: {}", s.edit_count);
                    println!("Corrections: {}", s.correction_count);
                    println!("Responses: {}", s.response_count);
                    println!("Created: {}", s.created_at.to_rfc3339());
                    println!("Updated: {}", s.updated_at.to_rfc3339());
                }
                None => println!("Session not found."),
            }
        }
    }
    Ok(())
}
