//! # Diff Command Implementation
//!
//! This module implements the `diff` subcommand. The BASE command file
//! becomes the running configuration; TARGET is staged in a session on top
//! of an emptied tree, so the session holds exactly what TARGET describes.
//! The difference is printed annotated with `+`/`-`, or, with `--summary`,
//! as the merge/delete/add/stable classification of the child keys at the
//! requested path.
//!
//! `commit` lines in TARGET are ignored.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use routecfg::diff::{ConfigDiff, DiffClass};
use routecfg::load::load_str;
use routecfg::output::Palette;
use routecfg::settings::Settings;

use super::{open_store, read_staged, SchemaArgs};

/// Compare the configuration of two command files
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Command file describing the current configuration.
    #[arg(value_name = "BASE")]
    pub base: PathBuf,

    /// Command file describing the proposed configuration.
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Configuration path to compare, e.g. `interfaces dummy`.
    #[arg(value_name = "PATH", trailing_var_arg = true)]
    pub path: Vec<String>,

    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Print the key classification instead of the annotated configuration.
    #[arg(long)]
    pub summary: bool,

    /// With --summary, leave schema defaults out of the comparison.
    #[arg(long, requires = "summary")]
    pub no_defaults: bool,
}

/// Execute the `diff` command.
pub fn execute(args: DiffArgs, settings: &Settings, color_flag: &str) -> Result<()> {
    let out = Palette::from_flag(color_flag);
    let store = open_store(&args.schema, settings)?;

    let mut base = store.open_session("base")?;
    base.load_config(&args.base)?;
    base.commit(true)?;

    let mut target = store.open_session("target")?;
    for top in target.children("") {
        target.delete(top.as_str(), None)?;
    }
    load_str(&mut target, &read_staged(&args.target)?)?;

    if args.summary {
        let diff = ConfigDiff::new(&target)?;
        let result = diff.child_nodes_diff(&args.path, &DiffClass::ALL, args.no_defaults)?;
        for class in DiffClass::ALL {
            println!("{}: {}", class, result.get(class).keys().join(" "));
        }
    } else {
        print!("{}", out.paint_diff(&target.show(&args.path)?));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::schema_file;
    use std::fs;
    use tempfile::TempDir;

    fn args(dir: &TempDir, base: &str, target: &str) -> DiffArgs {
        let base_file = dir.path().join("base.boot");
        let target_file = dir.path().join("target.boot");
        fs::write(&base_file, base).unwrap();
        fs::write(&target_file, target).unwrap();
        DiffArgs {
            base: base_file,
            target: target_file,
            path: Vec::new(),
            schema: SchemaArgs {
                schema: Some(schema_file(dir)),
            },
            summary: false,
            no_defaults: false,
        }
    }

    #[test]
    fn test_diff_annotated() {
        let dir = TempDir::new().unwrap();
        let args = args(
            &dir,
            "set system host-name r1\n",
            "set system host-name r2\ncommit\n",
        );
        assert!(execute(args, &Settings::default(), "never").is_ok());
    }

    #[test]
    fn test_diff_summary_on_leaf_fails() {
        let dir = TempDir::new().unwrap();
        let mut args = args(&dir, "", "set system host-name r2\n");
        args.summary = true;
        args.path = vec!["system".to_string(), "host-name".to_string()];
        let err = execute(args, &Settings::default(), "never").unwrap_err();
        assert!(err.to_string().contains("Diff error"));
    }
}
