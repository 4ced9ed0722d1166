//! # routecfg CLI
//!
//! This is the binary entry point for the `routecfg` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Setting up logging and loading engine settings.
//! - Executing the appropriate command based on the parsed arguments.
//!
//! The configuration engine lives in the `routecfg` library crate; the binary
//! is a thin wrapper that loads command files and prints what the engine
//! reports.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
