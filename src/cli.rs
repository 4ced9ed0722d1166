//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};

use routecfg::defaults::default_settings_path;
use routecfg::settings::Settings;

use crate::commands;

/// routecfg - Edit, compare and commit router configuration
#[derive(Parser, Debug)]
#[command(name = "routecfg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Engine settings file.
    ///
    /// Defaults to `routecfg/settings.toml` in the platform configuration
    /// directory; a missing default file means built-in settings.
    #[arg(long, global = true, value_name = "FILE", env = "ROUTECFG_SETTINGS")]
    settings: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a command file into a session and commit it
    Load(commands::load::LoadArgs),

    /// Show the configuration a command file produces
    Show(commands::show::ShowArgs),

    /// Compare the configuration of two command files
    Diff(commands::diff::DiffArgs),

    /// Check a command file against the schema without committing
    Validate(commands::validate::ValidateArgs),

    /// Display the schema as a tree with owners and priorities
    Tree(commands::tree::TreeArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // A second initialisation (tests, embedding) is not an error.
        let _ = Builder::from_env(Env::default().default_filter_or(&self.log_level))
            .format_timestamp(None)
            .try_init();

        let settings = self.load_settings()?;
        let color = self.color.as_str();

        match self.command {
            Commands::Load(args) => commands::load::execute(args, &settings, color),
            Commands::Show(args) => commands::show::execute(args, &settings, color),
            Commands::Diff(args) => commands::diff::execute(args, &settings, color),
            Commands::Validate(args) => commands::validate::execute(args, &settings, color),
            Commands::Tree(args) => commands::tree::execute(args, &settings),
        }
    }

    fn load_settings(&self) -> Result<Settings> {
        match &self.settings {
            Some(path) => Settings::from_file(path)
                .with_context(|| format!("Failed to read settings from {}", path.display())),
            None => Ok(Settings::from_file_or_default(&default_settings_path())?),
        }
    }
}
