//! Command file loading and saving
//!
//! Configuration is persisted as a line-oriented command file:
//!
//! ```text
//! # routecfg-config-version: 0
//! set interfaces dummy dum0 address 10.0.0.1/24
//! set interfaces dummy dum0 description 'uplink to core'
//! set system options reboot-on-panic
//! commit
//! ```
//!
//! Blank lines and `#` comments are ignored. `set` and `delete` lines edit
//! the session, `commit` runs a full commit. A `set` or `delete` the schema
//! rejects is reported and skipped so one stale line does not stop a boot;
//! any other verb stops the load.

use log::{debug, info, warn};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path::{quote, tokenize};
use crate::session::Session;
use crate::tree::ConfigTree;

/// First line of every saved command file
pub const CONFIG_HEADER: &str = "# routecfg-config-version: 0";

/// What a load did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// `set`/`delete` lines applied
    pub applied: usize,
    /// Lines the schema rejected: (1-based line number, reason)
    pub skipped: Vec<(usize, String)>,
    /// Outcome of every `commit` line, in order
    pub commits: Vec<bool>,
}

/// Apply command text to `session`.
pub fn load_str(session: &mut Session, content: &str) -> Result<LoadSummary> {
    let mut summary = LoadSummary::default();

    for (index, raw) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let words = tokenize(line);
        let (verb, args) = match words.split_first() {
            Some((verb, args)) => (verb.as_str(), args),
            None => continue,
        };

        let outcome = match verb {
            "set" => session.set_words(args),
            "delete" => session.delete_words(args),
            "commit" => {
                let committed = session.commit(false)?;
                if committed {
                    info!("line {}: commit succeeded", line_number);
                } else {
                    warn!("line {}: commit failed", line_number);
                }
                summary.commits.push(committed);
                continue;
            }
            _ => {
                return Err(Error::Load {
                    line: line_number,
                    message: format!("invalid line \"{}\"", raw.trim_end()),
                })
            }
        };

        match outcome {
            Ok(()) => {
                debug!("loaded: {}", line);
                summary.applied += 1;
            }
            Err(e @ Error::Schema { .. }) => {
                warn!("line {}: skipping \"{}\": {}", line_number, line, e);
                summary.skipped.push((line_number, e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

/// Apply a command file to `session`.
pub fn load_file(session: &mut Session, path: &Path) -> Result<LoadSummary> {
    let content = fs::read_to_string(path)?;
    info!("loading configuration from {}", path.display());
    let summary = load_str(session, &content)?;
    info!(
        "loaded {} line(s) from {}, {} skipped",
        summary.applied,
        path.display(),
        summary.skipped.len()
    );
    Ok(summary)
}

/// Render `tree` as `set` commands, each prefixed with `prefix`.
pub fn render_commands(tree: Option<&ConfigTree>, prefix: &[String]) -> String {
    let Some(tree) = tree else {
        return String::new();
    };
    tree.flatten(prefix)
        .iter()
        .map(|words| {
            let words: Vec<String> = words.iter().map(|w| quote(w)).collect();
            format!("set {}\n", words.join(" "))
        })
        .collect()
}

/// Where the previous version of `path` is kept
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".backup");
    PathBuf::from(name)
}

/// Write the whole running configuration to `path`.
///
/// With `backup`, an existing file is first renamed to `<path>.backup`.
pub fn save_file(session: &Session, path: &Path, backup: bool) -> Result<()> {
    let running = session.running_tree()?;

    if backup && path.exists() {
        let backup = backup_path(path);
        fs::rename(path, &backup)?;
        debug!("kept previous configuration as {}", backup.display());
    }

    let mut content = String::from(CONFIG_HEADER);
    content.push('\n');
    content.push_str(&render_commands(Some(&running), &[]));
    fs::write(path, content)?;

    info!("saved configuration to {}", path.display());
    Ok(())
}
