//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays the compiled
//! schema hierarchically. Tag nodes are shown as `name <tag>`, multi leaves
//! as `name [multi]`, and owned nodes carry their module and priority.
//!
//! This command is read-only.

use anyhow::{anyhow, Result};
use clap::Args;
use ptree::{print_tree, TreeItem};
use std::borrow::Cow;

use routecfg::schema::{NodeKind, SchemaNode};
use routecfg::settings::Settings;

use super::SchemaArgs;

/// Display the schema as a tree
#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Maximum depth to display in the tree.
    ///
    /// Use 0 to show only the top-level nodes.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,

    /// Include nodes marked hidden in the schema.
    #[arg(long)]
    pub hidden: bool,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs, settings: &Settings) -> Result<()> {
    let schema = args.schema.load(settings)?;
    let options = Options {
        max_depth: args.depth.unwrap_or(usize::MAX),
        hidden: args.hidden,
    };

    let root = TreeNode {
        label: "schema".to_string(),
        children: build_children(schema.root(), &options, 0),
    };
    print_tree(&root).map_err(|e| anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

struct Options {
    max_depth: usize,
    hidden: bool,
}

fn build_children(node: &SchemaNode, options: &Options, depth: usize) -> Vec<TreeNode> {
    node.child_names()
        .filter_map(|name| node.child(name).map(|child| (name, child)))
        .filter(|(_, child)| options.hidden || !child.hidden)
        .map(|(name, child)| {
            let children = if depth >= options.max_depth {
                Vec::new()
            } else {
                build_children(child, options, depth + 1)
            };
            TreeNode {
                label: label(name, child),
                children,
            }
        })
        .collect()
}

fn label(name: &str, node: &SchemaNode) -> String {
    let mut label = name.to_string();
    match node.kind {
        NodeKind::TagNode => label.push_str(" <tag>"),
        NodeKind::LeafNode if node.multi => label.push_str(" [multi]"),
        NodeKind::LeafNode if node.valueless => label.push_str(" [valueless]"),
        _ => {}
    }
    match (&node.owner, node.priority) {
        (Some(owner), Some(priority)) => {
            label.push_str(&format!(" ({}, priority {})", owner, priority))
        }
        (Some(owner), None) => label.push_str(&format!(" ({})", owner)),
        (None, Some(priority)) => label.push_str(&format!(" (priority {})", priority)),
        (None, None) => {}
    }
    label
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}
