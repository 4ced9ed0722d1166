//! Default locations for routecfg files.

use std::path::PathBuf;

/// Returns the default settings file.
///
/// Uses the platform configuration directory:
/// - Linux: `~/.config/routecfg/settings.toml`
/// - macOS: `~/Library/Application Support/routecfg/settings.toml`
///
/// Falls back to `.routecfg/settings.toml` in the current directory when the
/// platform directory cannot be determined. Overridden by `--settings` or
/// `ROUTECFG_SETTINGS`.
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".routecfg"))
        .join("routecfg")
        .join("settings.toml")
}

/// Returns the default boot configuration file.
pub fn default_config_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from(".routecfg"))
        .join("routecfg")
        .join("config.boot")
}
