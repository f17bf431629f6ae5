use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// driftwatch: monitor external data sources for freshness, volume, and
/// schema drift, and alert on anomalies.
#[derive(Parser, Debug)]
#[command(name = "driftwatch", version, about)]
pub struct Cli {
    /// Path to the driftwatch configuration file (YAML or TOML).
    #[arg(long, short = 'c', env = "DRIFTWATCH_CONFIG", default_value = "driftwatch.yaml", global = true)]
    pub config: PathBuf,

    /// Emit verbose (debug-level) logging.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a one-shot check across configured sources.
    Check(CheckArgs),
    /// Run the agent as a daemon, checking sources on their schedules.
    Run(RunArgs),
    /// Show the last-known status of every configured source.
    Status(StatusArgs),
    /// Show recent snapshots for a source.
    History(HistoryArgs),
    /// Show the most recent decision and its reasons for a source.
    Explain(ExplainArgs),
    /// Apply retention, deleting snapshots and deliveries past their window.
    Purge(PurgeArgs),
    /// Run the state store's schema migration (idempotent).
    Migrate,
    /// Validate the configuration file without running any checks.
    Validate,
    /// Write a commented example configuration file.
    Init(InitArgs),
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Only check the named source.
    #[arg(long)]
    pub source: Option<String>,

    /// Check every enabled source regardless of its schedule.
    #[arg(long)]
    pub force: bool,

    /// Compute decisions and log what would be sent, without delivering webhooks.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit results as JSON instead of a human-readable summary.
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Compute decisions and log what would be sent, without delivering webhooks.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Emit results as JSON instead of a human-readable summary.
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// Source to show history for.
    pub source: String,

    /// Maximum number of snapshots to show.
    #[arg(long, default_value_t = 20)]
    pub limit: i64,
}

#[derive(clap::Args, Debug)]
pub struct ExplainArgs {
    /// Source to explain the last decision for.
    pub source: String,
}

#[derive(clap::Args, Debug)]
pub struct PurgeArgs {
    /// Report what would be purged without deleting anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Where to write the example configuration.
    #[arg(long, default_value = "driftwatch.yaml")]
    pub output: PathBuf,
}
