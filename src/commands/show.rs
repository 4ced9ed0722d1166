//! # Show Command Implementation
//!
//! This module implements the `show` subcommand, which loads a command file,
//! promotes the result without running modules and prints the configuration
//! at a path in one of three formats: braced text, JSON or `set` commands.
//!
//! This command is read-only with respect to the file it loads.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use routecfg::settings::Settings;

use super::{open_store, SchemaArgs};

/// Show the configuration a command file produces
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Command file to load.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Configuration path to show, e.g. `interfaces dummy`.
    #[arg(value_name = "PATH", trailing_var_arg = true)]
    pub path: Vec<String>,

    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Print the subtree as JSON.
    #[arg(long, conflicts_with = "commands")]
    pub json: bool,

    /// Print the subtree as `set` commands.
    #[arg(long)]
    pub commands: bool,
}

/// Execute the `show` command.
pub fn execute(args: ShowArgs, settings: &Settings, _color_flag: &str) -> Result<()> {
    let store = open_store(&args.schema, settings)?;
    let mut session = store.open_session("cli")?;
    session.load_config(&args.file)?;
    session.commit(true)?;

    if !args.path.is_empty() && !session.exists_effective(&args.path)? {
        bail!("Configuration under '{}' is empty", args.path.join(" "));
    }

    let text = if args.json {
        let mut json = session.show_config(&args.path, true)?;
        json.push('\n');
        json
    } else if args.commands {
        session.commands(&args.path)?
    } else {
        session.show(&args.path)?
    };
    print!("{}", text);
    Ok(())
}
