//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks a command
//! file against the schema without committing anything.
//!
//! ## Functionality
//!
//! - **Schema Compilation**: the schema definition is compiled first, so a
//!   malformed schema is reported before the command file is read.
//! - **Line Checks**: every `set` and `delete` line is applied to a scratch
//!   session; lines the schema rejects are listed with their line numbers.
//! - **Ownership Summary**: changed paths are matched against their owning
//!   modules and listed in commit order.
//!
//! `commit` lines are ignored. The command fails when any line is rejected.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use routecfg::load::load_str;
use routecfg::output::{Palette, Status};
use routecfg::path::join;
use routecfg::settings::Settings;

use super::{open_store, read_staged, SchemaArgs};

/// Check a command file against the schema
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Command file to validate.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub schema: SchemaArgs,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, settings: &Settings, color_flag: &str) -> Result<()> {
    let out = Palette::from_flag(color_flag);
    println!(
        "{} Validating configuration: {}",
        out.status(Status::Info),
        args.file.display()
    );

    let store = match open_store(&args.schema, settings) {
        Ok(store) => store,
        Err(e) => {
            println!("{} {:#}", out.status(Status::Error), e);
            return Err(e);
        }
    };
    let mut session = store.open_session("validate")?;
    let summary = load_str(&mut session, &read_staged(&args.file)?)?;

    println!("   Lines applied: {}", summary.applied);
    for (line, reason) in &summary.skipped {
        println!(
            "{} Line {}: {}",
            out.status(Status::Error),
            line,
            reason
        );
    }

    let mut owners = Vec::new();
    for owned in session.schema().owned_paths() {
        if session.changed(&owned.path)? {
            let priority = owned
                .priority
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            owners.push(format!(
                "{} ({}, priority {})",
                join(&owned.path),
                owned.owner,
                priority
            ));
        }
    }
    if !owners.is_empty() {
        println!("\n{} Commit order:", out.status(Status::Info));
        for owner in owners {
            println!("   {}", owner);
        }
    }

    if !summary.skipped.is_empty() {
        bail!(
            "{} line(s) rejected by the schema",
            summary.skipped.len()
        );
    }

    println!("\n{} Configuration is valid", out.status(Status::Ok));
    Ok(())
}
