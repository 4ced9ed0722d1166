//! Configuration tree data structure
//!
//! A [`ConfigTree`] is an ownership-exclusive tree of configuration values.
//! Every position holds exactly one of three shapes, decided by the schema
//! when the value is written:
//!
//! - `Scalar` for a plain leaf (an empty string marks a valueless leaf),
//! - `List` for a multi-value leaf, in insertion order,
//! - `Subtree` for internal nodes, tag nodes and tag instances.
//!
//! The tree itself knows nothing about the schema; the session layer decides
//! which shape to create. The primitives here are pure and never fail.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Map of child segment to child tree
pub type Children = BTreeMap<String, ConfigTree>;

/// A node of the configuration tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigTree {
    /// Single leaf value
    Scalar(String),
    /// Ordered values of a multi-value leaf
    List(Vec<String>),
    /// Named children
    Subtree(Children),
}

impl Default for ConfigTree {
    fn default() -> Self {
        ConfigTree::Subtree(Children::new())
    }
}

impl ConfigTree {
    /// Create an empty subtree
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the node carries no configuration.
    ///
    /// A scalar is never empty: a valueless leaf is present as `Scalar("")`.
    pub fn is_empty(&self) -> bool {
        match self {
            ConfigTree::Scalar(_) => false,
            ConfigTree::List(values) => values.is_empty(),
            ConfigTree::Subtree(children) => children.is_empty(),
        }
    }

    /// Children of a subtree, if this is one
    pub fn as_subtree(&self) -> Option<&Children> {
        match self {
            ConfigTree::Subtree(children) => Some(children),
            _ => None,
        }
    }

    /// Follow `path` from this node.
    pub fn get(&self, path: &[String]) -> Option<&ConfigTree> {
        let mut current = self;
        for segment in path {
            current = current.as_subtree()?.get(segment)?;
        }
        Some(current)
    }

    /// Mutable variant of [`ConfigTree::get`].
    pub fn get_mut(&mut self, path: &[String]) -> Option<&mut ConfigTree> {
        let mut current = self;
        for segment in path {
            current = match current {
                ConfigTree::Subtree(children) => children.get_mut(segment)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Return the children map at `path`, creating empty subtrees on the way.
    ///
    /// Returns `None` when a scalar or list sits on the path.
    pub fn subtree_mut(&mut self, path: &[String]) -> Option<&mut Children> {
        let mut current = self;
        for segment in path {
            current = match current {
                ConfigTree::Subtree(children) => children.entry(segment.clone()).or_default(),
                _ => return None,
            };
        }
        match current {
            ConfigTree::Subtree(children) => Some(children),
            _ => None,
        }
    }

    /// Immediate child names: subtree keys or list entries.
    pub fn keys(&self) -> Vec<String> {
        match self {
            ConfigTree::Scalar(_) => Vec::new(),
            ConfigTree::List(values) => values.clone(),
            ConfigTree::Subtree(children) => children.keys().cloned().collect(),
        }
    }

    /// Remove the node at `path`, returning it.
    pub fn remove(&mut self, path: &[String]) -> Option<ConfigTree> {
        let (last, parent) = path.split_last()?;
        match self.get_mut(parent)? {
            ConfigTree::Subtree(children) => children.remove(last),
            _ => None,
        }
    }

    /// Remove empty nodes along `path`, deepest first.
    ///
    /// Stops at the first non-empty node; the root itself is never removed.
    pub fn prune(&mut self, path: &[String]) {
        for depth in (1..=path.len()).rev() {
            let empty = match self.get(&path[..depth]) {
                Some(node) => node.is_empty(),
                None => continue,
            };
            if !empty {
                return;
            }
            self.remove(&path[..depth]);
        }
    }

    /// Fill unset positions from `defaults`; existing values win.
    pub fn overlay_defaults(&mut self, defaults: &ConfigTree) {
        let (ConfigTree::Subtree(target), ConfigTree::Subtree(source)) = (self, defaults) else {
            return;
        };
        for (key, value) in source {
            match target.get_mut(key) {
                None => {
                    target.insert(key.clone(), value.clone());
                }
                Some(existing) => existing.overlay_defaults(value),
            }
        }
    }

    /// Rewrite every subtree key, recursively.
    pub fn map_keys<F>(self, f: &F) -> ConfigTree
    where
        F: Fn(&str) -> String,
    {
        match self {
            ConfigTree::Subtree(children) => ConfigTree::Subtree(
                children
                    .into_iter()
                    .map(|(key, value)| (f(&key), value.map_keys(f)))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Flatten into one word list per configured position.
    ///
    /// Empty subtrees and valueless leaves yield their own path; scalars yield
    /// path + value; lists yield one entry per value.
    pub fn flatten(&self, prefix: &[String]) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        self.flatten_into(prefix.to_vec(), &mut out);
        out
    }

    fn flatten_into(&self, inside: Vec<String>, out: &mut Vec<Vec<String>>) {
        match self {
            ConfigTree::Scalar(value) if value.is_empty() => out.push(inside),
            ConfigTree::Scalar(value) => {
                let mut line = inside;
                line.push(value.clone());
                out.push(line);
            }
            ConfigTree::List(values) => {
                for value in values {
                    let mut line = inside.clone();
                    line.push(value.clone());
                    out.push(line);
                }
            }
            ConfigTree::Subtree(children) if children.is_empty() => {
                if !inside.is_empty() {
                    out.push(inside);
                }
            }
            ConfigTree::Subtree(children) => {
                for (key, child) in children {
                    let mut next = inside.clone();
                    next.push(key.clone());
                    child.flatten_into(next, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(path: &str) -> Vec<String> {
        crate::path::split(path)
    }

    fn sample() -> ConfigTree {
        let mut tree = ConfigTree::new();
        let dum0 = tree.subtree_mut(&p("interfaces dummy dum0")).unwrap();
        dum0.insert(
            "address".to_string(),
            ConfigTree::List(vec!["10.0.0.1/24".to_string()]),
        );
        dum0.insert("disable".to_string(), ConfigTree::Scalar(String::new()));
        tree
    }

    #[test]
    fn test_get_follows_path() {
        let tree = sample();
        assert_eq!(
            tree.get(&p("interfaces dummy dum0 address")),
            Some(&ConfigTree::List(vec!["10.0.0.1/24".to_string()]))
        );
        assert!(tree.get(&p("interfaces bridge")).is_none());
        assert!(tree.get(&p("interfaces dummy dum0 address x")).is_none());
        assert_eq!(tree.get(&[]), Some(&tree));
    }

    #[test]
    fn test_subtree_mut_refuses_to_descend_through_leaf() {
        let mut tree = sample();
        assert!(tree.subtree_mut(&p("interfaces dummy dum0 address")).is_none());
    }

    #[test]
    fn test_is_empty() {
        assert!(ConfigTree::new().is_empty());
        assert!(ConfigTree::List(vec![]).is_empty());
        assert!(!ConfigTree::Scalar(String::new()).is_empty());
    }

    #[test]
    fn test_keys() {
        let tree = sample();
        assert_eq!(
            tree.get(&p("interfaces dummy dum0")).unwrap().keys(),
            vec!["address", "disable"]
        );
        assert_eq!(
            tree.get(&p("interfaces dummy dum0 address")).unwrap().keys(),
            vec!["10.0.0.1/24"]
        );
    }

    #[test]
    fn test_prune_removes_empty_ancestors_but_not_root() {
        let mut tree = sample();
        tree.remove(&p("interfaces dummy dum0 address"));
        tree.remove(&p("interfaces dummy dum0 disable"));
        tree.prune(&p("interfaces dummy dum0"));
        assert_eq!(tree, ConfigTree::new());
    }

    #[test]
    fn test_prune_stops_at_non_empty_node() {
        let mut tree = sample();
        tree.subtree_mut(&p("interfaces dummy dum1")).unwrap();
        tree.prune(&p("interfaces dummy dum1"));
        assert!(tree.get(&p("interfaces dummy dum1")).is_none());
        assert!(tree.get(&p("interfaces dummy dum0")).is_some());
    }

    #[test]
    fn test_overlay_defaults_keeps_existing_values() {
        let mut tree = ConfigTree::new();
        tree.subtree_mut(&[])
            .unwrap()
            .insert("mtu".to_string(), ConfigTree::Scalar("9000".to_string()));

        let mut defaults = ConfigTree::new();
        let d = defaults.subtree_mut(&[]).unwrap();
        d.insert("mtu".to_string(), ConfigTree::Scalar("1500".to_string()));
        d.insert("duplex".to_string(), ConfigTree::Scalar("auto".to_string()));

        tree.overlay_defaults(&defaults);
        assert_eq!(
            tree.get(&p("mtu")),
            Some(&ConfigTree::Scalar("9000".to_string()))
        );
        assert_eq!(
            tree.get(&p("duplex")),
            Some(&ConfigTree::Scalar("auto".to_string()))
        );
    }

    #[test]
    fn test_map_keys_is_recursive() {
        let mut tree = ConfigTree::new();
        tree.subtree_mut(&p("foo-bar baz-quux")).unwrap();
        let mangled = tree.map_keys(&|k: &str| k.replace('-', "_"));
        assert!(mangled.get(&p("foo_bar baz_quux")).is_some());
    }

    #[test]
    fn test_flatten() {
        let tree = sample();
        let lines: Vec<String> = tree.flatten(&[]).iter().map(|l| l.join(" ")).collect();
        assert_eq!(
            lines,
            vec![
                "interfaces dummy dum0 address 10.0.0.1/24",
                "interfaces dummy dum0 disable"
            ]
        );
    }

    #[test]
    fn test_json_shape() {
        let tree = sample();
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "interfaces": {"dummy": {"dum0": {
                    "address": ["10.0.0.1/24"],
                    "disable": ""
                }}}
            })
        );
    }
}
