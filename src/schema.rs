//! # Schema Repository
//!
//! The schema is the read-only description of every configuration path: its
//! kind, whether it holds a list, which module owns it and at which priority
//! that module commits. Every other component consults it before touching a
//! tree; nothing mutates it after compilation.
//!
//! ## Definition Format
//!
//! Schemas are compiled from a YAML document of nested nodes:
//!
//! ```yaml
//! interfaces:
//!   children:
//!     dummy:
//!       type: tag
//!       owner: interfaces-dummy
//!       priority: 300
//!       children:
//!         address:
//!           type: leaf
//!           multi: true
//!         disable:
//!           type: leaf
//!           valueless: true
//! ```
//!
//! Compilation checks the shapes that would otherwise only surface while
//! walking a tree: leaves cannot have children, leaf-only attributes stay on
//! leaves, and owners cannot sit below a tag node.
//!
//! ## Path Resolution
//!
//! A tag node consumes one extra segment, the instance name, before its
//! children can be addressed: `interfaces dummy dum0 address` walks
//! `interfaces` → `dummy` → instance `dum0` → `address`.

use log::debug;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::tree::ConfigTree;

/// Kind of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum NodeKind {
    /// Internal node with fixed, schema-declared children
    #[default]
    #[serde(rename = "node")]
    Node,
    /// Node holding a value (or a list of values when `multi`)
    #[serde(rename = "leaf")]
    LeafNode,
    /// Node whose children are user-named instances
    #[serde(rename = "tag")]
    TagNode,
}

/// Raw node as written in the definition document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeDefinition {
    #[serde(rename = "type", default)]
    kind: NodeKind,
    #[serde(default)]
    multi: bool,
    #[serde(default)]
    valueless: bool,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    priority: Option<i32>,
    #[serde(default)]
    default: Option<serde_yaml::Value>,
    #[serde(default)]
    constraint: Option<String>,
    #[serde(default)]
    help: Option<String>,
    #[serde(default)]
    children: BTreeMap<String, NodeDefinition>,
}

/// Compiled metadata for one schema path
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub kind: NodeKind,
    /// Value is an ordered list rather than a scalar
    pub multi: bool,
    /// Leaf carries no value; its presence is the configuration
    pub valueless: bool,
    pub hidden: bool,
    /// Module responsible for committing this subtree
    pub owner: Option<String>,
    /// Commit ordering, ascending = earlier
    pub priority: Option<i32>,
    /// Default value for a leaf
    pub default: Option<ConfigTree>,
    /// Anchored pattern every value must match
    pub constraint: Option<Regex>,
    pub help: Option<String>,
    children: BTreeMap<String, SchemaNode>,
}

impl SchemaNode {
    fn root(children: BTreeMap<String, SchemaNode>) -> Self {
        Self {
            kind: NodeKind::Node,
            multi: false,
            valueless: false,
            hidden: false,
            owner: None,
            priority: None,
            default: None,
            constraint: None,
            help: None,
            children,
        }
    }

    /// Declared child node
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        self.children.get(name)
    }

    /// Declared child names, sorted
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::LeafNode
    }

    pub fn is_tag(&self) -> bool {
        self.kind == NodeKind::TagNode
    }
}

/// Where a path lands in the schema
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    /// The path names a declared node
    Node(&'a SchemaNode),
    /// The path names one instance of a tag node
    Instance(&'a SchemaNode),
}

impl<'a> Resolved<'a> {
    /// The schema node declaring this position (the tag node for instances)
    pub fn node(&self) -> &'a SchemaNode {
        match self {
            Resolved::Node(node) | Resolved::Instance(node) => node,
        }
    }

    /// Kind of the position; an instance behaves as an internal node
    pub fn kind(&self) -> NodeKind {
        match self {
            Resolved::Node(node) => node.kind,
            Resolved::Instance(_) => NodeKind::Node,
        }
    }
}

/// A schema path with an owner, as considered by commit selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedPath {
    pub path: Vec<String>,
    pub owner: String,
    pub priority: Option<i32>,
    pub is_tag: bool,
}

/// Compiled, read-only schema
#[derive(Debug, Clone)]
pub struct SchemaRepository {
    root: SchemaNode,
    owned: Vec<OwnedPath>,
    unowned_priorities: Vec<(i32, Vec<String>)>,
}

impl Default for SchemaRepository {
    fn default() -> Self {
        Self {
            root: SchemaNode::root(BTreeMap::new()),
            owned: Vec::new(),
            unowned_priorities: Vec::new(),
        }
    }
}

impl SchemaRepository {
    /// Compile a schema from its YAML definition.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let definitions: BTreeMap<String, NodeDefinition> = serde_yaml::from_str(content)?;

        let mut children = BTreeMap::new();
        for (name, definition) in definitions {
            let node = compile(&[name.clone()], definition, false)?;
            children.insert(name, node);
        }

        let mut schema = Self {
            root: SchemaNode::root(children),
            ..Self::default()
        };
        schema.index_owners();
        debug!(
            "compiled schema with {} owned path(s)",
            schema.owned.len()
        );
        Ok(schema)
    }

    /// Read and compile a schema definition file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Unnamed node holding the top-level declarations
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    fn index_owners(&mut self) {
        let mut owned = Vec::new();
        let mut unowned = Vec::new();
        collect_owners(&self.root, &mut Vec::new(), &mut owned, &mut unowned);

        // Stable sort keeps path order within one priority; unprioritised last.
        owned.sort_by_key(|o: &OwnedPath| (o.priority.is_none(), o.priority));
        unowned.sort_by_key(|(priority, _)| *priority);

        self.owned = owned;
        self.unowned_priorities = unowned;
    }

    /// Resolve a path to its schema position.
    ///
    /// Fails with `Error::Schema` when any segment is undeclared or the path
    /// continues past a leaf.
    pub fn resolve(&self, path: &[String]) -> Result<Resolved<'_>> {
        let mut node = &self.root;
        let mut instance = false;

        for (depth, segment) in path.iter().enumerate() {
            if node.is_tag() && !instance {
                instance = true;
                continue;
            }
            if node.is_leaf() {
                return Err(Error::schema(
                    &path[..=depth],
                    "path continues past a leaf node",
                ));
            }
            node = node
                .children
                .get(segment)
                .ok_or_else(|| Error::schema(&path[..=depth], "path is not declared"))?;
            instance = false;
        }

        Ok(if instance {
            Resolved::Instance(node)
        } else {
            Resolved::Node(node)
        })
    }

    /// Whether the path is declared
    pub fn exists(&self, path: &[String]) -> bool {
        self.resolve(path).is_ok()
    }

    /// Kind of the position at `path`
    pub fn kind(&self, path: &[String]) -> Result<NodeKind> {
        Ok(self.resolve(path)?.kind())
    }

    /// True when `path` names a tag node itself (not one of its instances)
    pub fn is_tag(&self, path: &[String]) -> bool {
        matches!(self.resolve(path), Ok(Resolved::Node(node)) if node.is_tag())
    }

    /// True when `path` names a leaf
    pub fn is_leaf(&self, path: &[String]) -> bool {
        matches!(self.resolve(path), Ok(Resolved::Node(node)) if node.is_leaf())
    }

    /// True when `path` names a multi-value leaf
    pub fn is_multi(&self, path: &[String]) -> bool {
        matches!(self.resolve(path), Ok(Resolved::Node(node)) if node.is_leaf() && node.multi)
    }

    /// True when `path` names a valueless leaf
    pub fn is_valueless(&self, path: &[String]) -> bool {
        matches!(self.resolve(path), Ok(Resolved::Node(node)) if node.is_leaf() && node.valueless)
    }

    /// Default values for the children of `path`, shaped like a config tree.
    ///
    /// Descends through internal nodes but not into tag nodes, whose
    /// instances are not known here. Undeclared paths have no defaults.
    pub fn defaults(&self, path: &[String]) -> ConfigTree {
        let mut tree = ConfigTree::new();
        let node = match self.resolve(path) {
            Ok(Resolved::Node(node)) if node.is_tag() || node.is_leaf() => return tree,
            Ok(resolved) => resolved.node(),
            Err(_) => return tree,
        };
        if let ConfigTree::Subtree(children) = &mut tree {
            collect_defaults(node, children);
        }
        tree
    }

    /// Check a value against the leaf at `path`.
    pub fn validate_value(&self, path: &[String], value: &str) -> Result<()> {
        let node = match self.resolve(path)? {
            Resolved::Node(node) if node.is_leaf() => node,
            _ => return Ok(()),
        };
        if node.valueless && !value.is_empty() {
            return Err(Error::schema(path, "node does not take a value"));
        }
        if !node.valueless && value.is_empty() {
            return Err(Error::schema(path, "node requires a value"));
        }
        if let Some(constraint) = &node.constraint {
            if !constraint.is_match(value) {
                return Err(Error::schema(
                    path,
                    format!("value '{}' does not match {}", value, constraint.as_str()),
                ));
            }
        }
        Ok(())
    }

    /// Owned paths in commit order: ascending priority, path order within a
    /// priority, unprioritised owners last.
    pub fn owned_paths(&self) -> &[OwnedPath] {
        &self.owned
    }

    /// Paths that declare a priority but no owner
    pub fn unowned_priorities(&self) -> &[(i32, Vec<String>)] {
        &self.unowned_priorities
    }
}

fn compile(path: &[String], definition: NodeDefinition, below_tag: bool) -> Result<SchemaNode> {
    let here = path.join(" ");
    let is_leaf = definition.kind == NodeKind::LeafNode;

    if is_leaf && !definition.children.is_empty() {
        return Err(definition_error(&here, "leaf nodes cannot have children"));
    }
    if !is_leaf
        && (definition.multi
            || definition.valueless
            || definition.default.is_some()
            || definition.constraint.is_some())
    {
        return Err(definition_error(
            &here,
            "multi, valueless, default and constraint apply to leaf nodes only",
        ));
    }
    if definition.valueless && (definition.multi || definition.default.is_some()) {
        return Err(definition_error(
            &here,
            "valueless leaves cannot be multi or carry a default",
        ));
    }
    if below_tag && definition.owner.is_some() {
        return Err(definition_error(
            &here,
            "owners cannot be declared below a tag node",
        ));
    }

    let default = definition
        .default
        .map(|value| default_value(&here, value, definition.multi))
        .transpose()?;

    let constraint = definition
        .constraint
        .map(|pattern| Regex::new(&format!("^(?:{})$", pattern)))
        .transpose()?;

    let child_below_tag = below_tag || definition.kind == NodeKind::TagNode;
    let mut children = BTreeMap::new();
    for (name, child) in definition.children {
        let mut child_path = path.to_vec();
        child_path.push(name.clone());
        children.insert(name, compile(&child_path, child, child_below_tag)?);
    }

    Ok(SchemaNode {
        kind: definition.kind,
        multi: definition.multi,
        valueless: definition.valueless,
        hidden: definition.hidden,
        owner: definition.owner,
        priority: definition.priority,
        default,
        constraint,
        help: definition.help,
        children,
    })
}

fn definition_error(path: &str, message: &str) -> Error {
    Error::SchemaDefinition {
        message: format!("{}: {}", path, message),
    }
}

fn scalar_text(path: &str, value: &serde_yaml::Value) -> Result<String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        _ => Err(definition_error(path, "default must be a scalar or list")),
    }
}

fn default_value(path: &str, value: serde_yaml::Value, multi: bool) -> Result<ConfigTree> {
    match (&value, multi) {
        (serde_yaml::Value::Sequence(items), true) => Ok(ConfigTree::List(
            items
                .iter()
                .map(|item| scalar_text(path, item))
                .collect::<Result<_>>()?,
        )),
        (_, true) => Ok(ConfigTree::List(vec![scalar_text(path, &value)?])),
        (serde_yaml::Value::Sequence(_), false) => Err(definition_error(
            path,
            "only multi leaves can default to a list",
        )),
        (_, false) => Ok(ConfigTree::Scalar(scalar_text(path, &value)?)),
    }
}

fn collect_defaults(node: &SchemaNode, out: &mut BTreeMap<String, ConfigTree>) {
    for (name, child) in &node.children {
        match child.kind {
            NodeKind::LeafNode => {
                if let Some(default) = &child.default {
                    out.insert(name.clone(), default.clone());
                }
            }
            NodeKind::Node => {
                let mut nested = BTreeMap::new();
                collect_defaults(child, &mut nested);
                if !nested.is_empty() {
                    out.insert(name.clone(), ConfigTree::Subtree(nested));
                }
            }
            NodeKind::TagNode => {}
        }
    }
}

fn collect_owners(
    node: &SchemaNode,
    path: &mut Vec<String>,
    owned: &mut Vec<OwnedPath>,
    unowned: &mut Vec<(i32, Vec<String>)>,
) {
    for (name, child) in &node.children {
        path.push(name.clone());
        match (&child.owner, child.priority) {
            (Some(owner), priority) => owned.push(OwnedPath {
                path: path.clone(),
                owner: owner.clone(),
                priority,
                is_tag: child.is_tag(),
            }),
            (None, Some(priority)) => unowned.push((priority, path.clone())),
            (None, None) => {}
        }
        collect_owners(child, path, owned, unowned);
        path.pop();
    }
}
