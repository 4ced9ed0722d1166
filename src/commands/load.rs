//! # Load Command Implementation
//!
//! This module implements the `load` subcommand: a command file is applied to
//! a fresh session on an empty running configuration, pending changes are
//! optionally shown, the session is committed and the resulting running
//! configuration can be saved as a new command file.
//!
//! The CLI registers no configuration modules, so a commit here selects and
//! reports the owned paths that changed and then promotes the session.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use routecfg::output::{Palette, Status};
use routecfg::phases::CommitState;
use routecfg::settings::Settings;

use super::{open_store, SchemaArgs};

/// Load a command file into a session and commit it
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Command file to load.
    ///
    /// Defaults to `config_file` from the settings file.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Print the pending changes before committing.
    #[arg(long)]
    pub show: bool,

    /// Stop after loading; do not commit.
    #[arg(long)]
    pub dry_run: bool,

    /// Write the running configuration to this file after committing.
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,
}

/// Execute the `load` command.
pub fn execute(args: LoadArgs, settings: &Settings, color_flag: &str) -> Result<()> {
    let out = Palette::from_flag(color_flag);
    let Some(file) = args.file.as_ref().or(settings.config_file.as_ref()) else {
        bail!("No command file given and no `config_file` in the settings file");
    };

    let store = open_store(&args.schema, settings)?;
    let mut session = store.open_session("cli")?;

    println!(
        "{} Loading configuration: {}",
        out.status(Status::Info),
        file.display()
    );
    let summary = session.load_config(file)?;
    println!("   Applied {} line(s)", summary.applied);
    for (line, reason) in &summary.skipped {
        println!(
            "{} Skipped line {}: {}",
            out.status(Status::Warn),
            line,
            reason
        );
    }
    if summary.commits.contains(&false) {
        bail!("A commit in {} failed", file.display());
    }

    if args.show {
        print!("{}", out.paint_diff(&session.show("")?));
    }

    if args.dry_run {
        println!("{} Dry run, nothing committed", out.status(Status::Info));
        return Ok(());
    }

    if session.changed("")? {
        let report = session.commit_report(false)?;
        for dropped in &report.dropped {
            println!("{} {}", out.status(Status::Warn), dropped);
        }
        if let CommitState::Aborted(phase) = report.state {
            for failure in &report.failures {
                println!("{} {}", out.status(Status::Error), failure);
            }
            bail!("Commit aborted during {}", phase);
        }
        println!(
            "{} Committed {} task(s)",
            out.status(Status::Ok),
            report.tasks.len()
        );
        for task in &report.tasks {
            println!("   {}", task);
        }
    } else {
        println!("{} No changes to commit", out.status(Status::Ok));
    }

    if let Some(path) = &args.save {
        session.save_config(path)?;
        println!(
            "{} Saved running configuration to {}",
            out.status(Status::Info),
            path.display()
        );
    }

    Ok(())
}
