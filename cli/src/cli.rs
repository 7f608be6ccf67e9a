//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::AppContext;
use crate::commands;

/// Repair NotReady Kubernetes worker nodes by reconciling the local agent
#[derive(Parser)]
#[command(
    name = "nodemend",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (the NO_COLOR environment variable also works)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Skip interactive prompts
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reconcile the agent service and join token, then restart the agent
    Repair(commands::repair::RepairArgs),

    /// Diagnose the node agent setup without changing anything
    Check(commands::check::CheckArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error when the command fails; the caller maps it to a
    /// non-zero exit code.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            command,
        } = self;
        let ctx = AppContext::new(no_color, quiet, json, yes);
        match command {
            Command::Repair(args) => commands::repair::run(&ctx, args).await,
            Command::Check(args) => commands::check::run(&ctx, args).await,
        }
    }
}
