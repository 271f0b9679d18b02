use anyhow::Result;
use clap::Parser;

mod bootstrap;
mod cli;
mod config;
mod engine;
mod launch;
mod report;
mod ui;

fn main() -> Result<()> {
    let args = cli::RootArgs::parse();
    match args.command {
        cli::Command::Init(args) => launch::run_init(&args),
        cli::Command::Run(args) => launch::run_launch(&args),
    }
}
