//! Engine settings
//!
//! Settings are read from a small TOML document:
//!
//! ```toml
//! max_workers = 8           # 0 = one worker per CPU
//! phase_timeout_secs = 300  # watchdog for generate/apply
//! schema = "/usr/share/routecfg/schema.yaml"
//! config_file = "/config/config.boot"
//! backup = true
//! ```
//!
//! Every key is optional. Command-line flags override what is read here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default watchdog for the parallel commit phases, in seconds
pub const DEFAULT_PHASE_TIMEOUT_SECS: u64 = 300;

fn default_phase_timeout_secs() -> u64 {
    DEFAULT_PHASE_TIMEOUT_SECS
}

fn default_backup() -> bool {
    true
}

/// Settings for the commit engine and the command line front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Commit worker threads; 0 picks one per CPU
    #[serde(default)]
    pub max_workers: usize,

    /// Generating/Applying watchdog
    #[serde(default = "default_phase_timeout_secs")]
    pub phase_timeout_secs: u64,

    /// Schema definition document
    #[serde(default)]
    pub schema: Option<PathBuf>,

    /// Boot configuration file
    #[serde(default)]
    pub config_file: Option<PathBuf>,

    /// Keep the previous file as `<file>.backup` when saving
    #[serde(default = "default_backup")]
    pub backup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_workers: 0,
            phase_timeout_secs: DEFAULT_PHASE_TIMEOUT_SECS,
            schema: None,
            config_file: None,
            backup: true,
        }
    }
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Read settings from `path` when it exists, defaults otherwise.
    pub fn from_file_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            log::debug!("no settings at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn phase_timeout(&self) -> Duration {
        Duration::from_secs(self.phase_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.phase_timeout_secs == 0 {
            return Err(Error::Settings {
                message: "phase_timeout_secs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
