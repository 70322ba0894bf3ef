use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;
mod output;

use commands::config::{ConfigCmd, run_config};
use commands::hook::run_hook;
use commands::learnings::{LearningsCmd, run_learnings};
use commands::score::run_score;
use commands::session::{SessionCmd, run_session_cmd};

#[derive(Parser)]
#[command(name = "proflow")]
#[command(about = "Session telemetry sidecar for AI coding agents", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    json: bool,

    /// Mirror log lines and degraded operations to stderr.
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one lifecycle event read from stdin. Always exits 0.
    Hook(HookArgs),
    /// Score task readiness and print the gating decision.
    Score(ScoreArgs),
    /// Inspect captured learnings.
    Learnings {
        #[command(subcommand)]
        command: LearningsCmd,
    },
    /// Inspect per-session counters.
    Session {
        #[command(subcommand)]
        command: SessionCmd,
    },
    /// Show or initialize settings.
    Config {
        #[command(subcommand)]
        command: ConfigCmd,
    },
}

#[derive(Args)]
struct HookArgs {
    /// Event name. Overrides `hook_event_name` from the payload.
    event: Option<String>,

    /// Enable a handler for this invocation only (repeatable).
    #[arg(long = "enable", value_name = "FLAG")]
    enable: Vec<String>,
}

#[derive(Args)]
struct ScoreArgs {
    #[arg(long)]
    code_location: f64,
    #[arg(long)]
    requirement_clarity: f64,
    #[arg(long)]
    side_effect_safety: f64,
    #[arg(long)]
    test_coverage: f64,
    #[arg(long)]
    prior_success: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Hook(args) => run_hook(&cwd, args, cli.json, cli.verbose),
        Commands::Score(args) => run_score(&cwd, args, cli.json),
        Commands::Learnings { command } => run_learnings(&cwd, command, cli.json),
        Commands::Session { command } => run_session_cmd(&cwd, command, cli.json),
        Commands::Config { command } => run_config(&cwd, command, cli.json),
    }
}
