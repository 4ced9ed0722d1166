//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `routecfg` command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `routecfg` library.
//!
//! Commands that need a schema share [`SchemaArgs`] and [`open_store`].

pub mod diff;
pub mod load;
pub mod show;
pub mod tree;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use routecfg::schema::SchemaRepository;
use routecfg::settings::Settings;
use routecfg::store::ConfigStore;

/// Schema selection shared by every command that edits configuration
#[derive(Args, Debug, Clone, Default)]
pub struct SchemaArgs {
    /// Schema definition file (YAML).
    ///
    /// Falls back to `schema` in the settings file.
    /// Can also be set with the `ROUTECFG_SCHEMA` environment variable.
    #[arg(long, value_name = "FILE", env = "ROUTECFG_SCHEMA")]
    pub schema: Option<PathBuf>,
}

impl SchemaArgs {
    /// Compile the schema named on the command line or in `settings`.
    pub fn load(&self, settings: &Settings) -> Result<SchemaRepository> {
        let Some(path) = self.schema.as_ref().or(settings.schema.as_ref()) else {
            bail!("No schema given: pass --schema, set ROUTECFG_SCHEMA or add `schema` to the settings file");
        };
        SchemaRepository::from_file(path)
            .with_context(|| format!("Failed to load schema from {}", path.display()))
    }
}

/// Build a store for the schema selected by `args`.
pub fn open_store(args: &SchemaArgs, settings: &Settings) -> Result<ConfigStore> {
    let schema = args.load(settings)?;
    Ok(ConfigStore::from_settings(schema, settings)?)
}

/// Read a command file, dropping its `commit` lines.
///
/// Used where a file should only be staged in a session.
pub fn read_staged(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content
        .lines()
        .filter(|line| line.split_whitespace().next() != Some("commit"))
        .collect::<Vec<_>>()
        .join("\n"))
}
