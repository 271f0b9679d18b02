//! CLI argument parsing for the launcher.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "mlaunch",
    version,
    about = "Staged bootstrap launcher for a media service",
    after_help = "Commands:\n  init [--config <path>]   Write a default launcher config\n  run [--config <path>]    Check, condition, configure, then start the service\n\nExamples:\n  mlaunch init\n  mlaunch run\n  mlaunch run --text --auto-start --report /tmp/mlaunch-report.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Run(RunArgs),
}

/// Init command inputs.
#[derive(Parser, Debug)]
#[command(about = "Write a default launcher config")]
pub struct InitArgs {
    /// Config file to write (defaults to $MLAUNCH_CONFIG or the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

/// Run command inputs.
#[derive(Parser, Debug)]
#[command(about = "Run the bootstrap sequence and start the media service")]
pub struct RunArgs {
    /// Config file to read (defaults to $MLAUNCH_CONFIG or the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the configured data directory
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Override the configured delay before the first stage, in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Request the service start as soon as it becomes available
    #[arg(long)]
    pub auto_start: bool,

    /// Use line-oriented output even on a terminal
    #[arg(long)]
    pub text: bool,

    /// Write a JSON run report when the run ends
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Write logs to this file instead of the default destination
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
