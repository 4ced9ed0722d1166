//! Diff-annotated configuration rendering
//!
//! Renders the session configuration below a path in the familiar braced
//! layout, marking pending changes against the running tree:
//!
//! ```text
//! interfaces {
//! -  dummy dum0 {
//! -     address 10.0.0.1/24
//! -  }
//! +  dummy dum1 {
//! +     address 10.0.0.2/24
//! +  }
//! }
//! ```
//!
//! Keys are sorted, each level is indented by three spaces and a `+` or `-`
//! marker takes the place of the first indentation character. Tag instances
//! are printed as `<tag> <instance>` at the tag's depth.

use std::collections::BTreeSet;

use crate::path::quote;
use crate::schema::SchemaRepository;
use crate::tree::ConfigTree;

const INDENT: &str = "   ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Same,
    Added,
    Removed,
}

impl Mark {
    fn of(edit: bool, live: bool) -> Self {
        match (edit, live) {
            (true, false) => Mark::Added,
            (false, true) => Mark::Removed,
            _ => Mark::Same,
        }
    }
}

/// Render `edit` (session) against `live` (running), both found at `path`.
pub fn render(
    schema: &SchemaRepository,
    path: &[String],
    edit: Option<&ConfigTree>,
    live: Option<&ConfigTree>,
) -> String {
    let mut renderer = Renderer {
        schema,
        lines: Vec::new(),
    };
    let empty = ConfigTree::new();
    match (edit, live) {
        _ if schema.is_tag(path) => {
            let tag = path.last().map(String::as_str).unwrap_or_default();
            renderer.instances(
                0,
                &mut path.to_vec(),
                tag,
                edit.unwrap_or(&empty),
                live.unwrap_or(&empty),
            );
        }
        (Some(ConfigTree::Subtree(_)), _) | (_, Some(ConfigTree::Subtree(_))) | (None, None) => {
            renderer.node(
                0,
                &mut path.to_vec(),
                edit.unwrap_or(&empty),
                live.unwrap_or(&empty),
            );
        }
        _ => {
            let name = path.last().map(String::as_str).unwrap_or_default();
            renderer.leaf(0, name, edit, live);
        }
    }

    let mut out = renderer.lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

struct Renderer<'a> {
    schema: &'a SchemaRepository,
    lines: Vec<String>,
}

impl Renderer<'_> {
    fn line(&mut self, depth: usize, mark: Mark, text: &str) {
        let indent = INDENT.repeat(depth);
        let line = match mark {
            Mark::Same => format!("{}{}", indent, text),
            Mark::Added => format!("+{}{}", indent.get(1..).unwrap_or_default(), text),
            Mark::Removed => format!("-{}{}", indent.get(1..).unwrap_or_default(), text),
        };
        self.lines.push(line);
    }

    fn node(&mut self, depth: usize, inside: &mut Vec<String>, edit: &ConfigTree, live: &ConfigTree) {
        if edit.is_empty() && live.is_empty() {
            return;
        }
        let empty = ConfigTree::new();
        let keys: BTreeSet<String> = edit.keys().into_iter().chain(live.keys()).collect();

        for key in keys {
            let e = edit.get(std::slice::from_ref(&key));
            let l = live.get(std::slice::from_ref(&key));
            inside.push(key.clone());

            if self.schema.is_leaf(inside) {
                self.leaf(depth, &key, e, l);
            } else if self.schema.is_tag(inside) {
                self.instances(depth, inside, &key, e.unwrap_or(&empty), l.unwrap_or(&empty));
            } else {
                self.block(depth, inside, &key, e, l);
            }

            inside.pop();
        }
    }

    /// Instances of the tag node at `inside`, printed as `<tag> <instance>`.
    fn instances(
        &mut self,
        depth: usize,
        inside: &mut Vec<String>,
        tag: &str,
        edit: &ConfigTree,
        live: &ConfigTree,
    ) {
        let instances: BTreeSet<String> = edit.keys().into_iter().chain(live.keys()).collect();
        for instance in instances {
            let e = edit.get(std::slice::from_ref(&instance));
            let l = live.get(std::slice::from_ref(&instance));
            inside.push(instance.clone());
            self.block(depth, inside, &format!("{} {}", tag, instance), e, l);
            inside.pop();
        }
    }

    fn block(
        &mut self,
        depth: usize,
        inside: &mut Vec<String>,
        label: &str,
        edit: Option<&ConfigTree>,
        live: Option<&ConfigTree>,
    ) {
        let mark = Mark::of(edit.is_some(), live.is_some());
        let has_content = match mark {
            Mark::Added => edit.is_some_and(|e| !e.is_empty()),
            Mark::Removed => live.is_some_and(|l| !l.is_empty()),
            Mark::Same => {
                edit.is_some_and(|e| !e.is_empty()) || live.is_some_and(|l| !l.is_empty())
            }
        };

        if !has_content {
            self.line(depth, mark, label);
            return;
        }

        let empty = ConfigTree::new();
        self.line(depth, mark, &format!("{} {{", label));
        self.node(
            depth + 1,
            inside,
            edit.unwrap_or(&empty),
            live.unwrap_or(&empty),
        );
        self.line(depth, mark, "}");
    }

    fn leaf(&mut self, depth: usize, name: &str, edit: Option<&ConfigTree>, live: Option<&ConfigTree>) {
        let edit_values = edit.map(leaf_values).unwrap_or_default();
        let live_values = live.map(leaf_values).unwrap_or_default();

        for value in live_values.iter().filter(|v| !edit_values.contains(v)) {
            self.line(depth, Mark::Removed, &leaf_text(name, value));
        }
        for value in &edit_values {
            let mark = Mark::of(true, live_values.contains(value));
            self.line(depth, mark, &leaf_text(name, value));
        }
    }
}

fn leaf_values(tree: &ConfigTree) -> Vec<String> {
    match tree {
        ConfigTree::Scalar(value) => vec![value.clone()],
        other => other.keys(),
    }
}

fn leaf_text(name: &str, value: &str) -> String {
    if value.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", name, quote(value))
    }
}
