//! # Diff Engine
//!
//! Compares the session tree with the running tree below one path and
//! classifies every child key:
//!
//! | Class | Keys |
//! |---|---|
//! | `merge` | every key in the session |
//! | `delete` | keys only in running |
//! | `add` | keys only in the session |
//! | `stable` | keys in both |
//!
//! Any class can be *expanded* from a key list into the full `{key: value}`
//! map. Values come from the session tree, except for `delete` whose values
//! only exist in running. An expanded `merge` is overlaid with the schema
//! defaults for the path (session values win) unless `no_defaults` is set.
//! An optional mangler post-processes every expanded map, after defaults.
//!
//! ```rust,ignore
//! let diff = ConfigDiff::new(&session)?;
//! let result = diff.child_nodes_diff("interfaces dummy", &[DiffClass::Delete], false)?;
//! for removed in result.delete.keys() {
//!     // tear down interface `removed`
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::path::IntoSegments;
use crate::schema::SchemaRepository;
use crate::session::Session;
use crate::tree::{Children, ConfigTree};

/// Classification of a child key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffClass {
    Merge,
    Delete,
    Add,
    Stable,
}

impl DiffClass {
    pub const ALL: [DiffClass; 4] = [
        DiffClass::Merge,
        DiffClass::Delete,
        DiffClass::Add,
        DiffClass::Stable,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            DiffClass::Merge => "merge",
            DiffClass::Delete => "delete",
            DiffClass::Add => "add",
            DiffClass::Stable => "stable",
        }
    }

    /// Expanded values are read from the running tree
    fn reads_running(&self) -> bool {
        *self == DiffClass::Delete
    }

    /// Expanded values are overlaid with schema defaults
    fn takes_defaults(&self) -> bool {
        *self == DiffClass::Merge
    }
}

impl fmt::Display for DiffClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One class of a diff: bare keys, or keys with their values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSet {
    Keys(Vec<String>),
    Expanded(Children),
}

impl DiffSet {
    pub fn keys(&self) -> Vec<String> {
        match self {
            DiffSet::Keys(keys) => keys.clone(),
            DiffSet::Expanded(children) => children.keys().cloned().collect(),
        }
    }

    pub fn expanded(&self) -> Option<&Children> {
        match self {
            DiffSet::Expanded(children) => Some(children),
            DiffSet::Keys(_) => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        match self {
            DiffSet::Keys(keys) => keys.iter().any(|k| k == key),
            DiffSet::Expanded(children) => children.contains_key(key),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DiffSet::Keys(keys) => keys.is_empty(),
            DiffSet::Expanded(children) => children.is_empty(),
        }
    }
}

/// The four classified key sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    pub merge: DiffSet,
    pub delete: DiffSet,
    pub add: DiffSet,
    pub stable: DiffSet,
}

impl DiffResult {
    pub fn get(&self, class: DiffClass) -> &DiffSet {
        match class {
            DiffClass::Merge => &self.merge,
            DiffClass::Delete => &self.delete,
            DiffClass::Add => &self.add,
            DiffClass::Stable => &self.stable,
        }
    }

    fn get_mut(&mut self, class: DiffClass) -> &mut DiffSet {
        match class {
            DiffClass::Merge => &mut self.merge,
            DiffClass::Delete => &mut self.delete,
            DiffClass::Add => &mut self.add,
            DiffClass::Stable => &mut self.stable,
        }
    }
}

/// Classify the immediate keys of two trees.
///
/// Keys of a subtree are its child names, keys of a list its values; a
/// scalar or missing side has none. Sets keep the session's key order.
pub fn key_sets(session: &ConfigTree, running: &ConfigTree) -> DiffResult {
    let session_keys = session.keys();
    let running_keys = running.keys();

    let stable: Vec<String> = session_keys
        .iter()
        .filter(|k| running_keys.contains(k))
        .cloned()
        .collect();
    let delete = running_keys
        .iter()
        .filter(|k| !stable.contains(k))
        .cloned()
        .collect();
    let add = session_keys
        .iter()
        .filter(|k| !stable.contains(k))
        .cloned()
        .collect();

    DiffResult {
        merge: DiffSet::Keys(session_keys),
        delete: DiffSet::Keys(delete),
        add: DiffSet::Keys(add),
        stable: DiffSet::Keys(stable),
    }
}

fn expand(keys: &[String], tree: &ConfigTree) -> Children {
    let Some(children) = tree.as_subtree() else {
        return Children::new();
    };
    keys.iter()
        .filter_map(|k| children.get(k).map(|v| (k.clone(), v.clone())))
        .collect()
}

/// Post-processing applied to every expanded map
pub type Mangler = Arc<dyn Fn(Children) -> Children + Send + Sync>;

/// Turn `-` into `_` in every key, recursively.
pub fn default_mangler(children: Children) -> Children {
    let underscore = |key: &str| key.replace('-', "_");
    children
        .into_iter()
        .map(|(key, value)| (underscore(&key), value.map_keys(&underscore)))
        .collect()
}

/// Diff view over one session tree and one running tree
pub struct ConfigDiff<'a> {
    schema: &'a SchemaRepository,
    level: Vec<String>,
    session: &'a ConfigTree,
    running: Arc<ConfigTree>,
    mangler: Option<Mangler>,
}

impl<'a> ConfigDiff<'a> {
    /// Diff a session against the current running tree, at its level.
    pub fn new(session: &'a Session) -> Result<Self> {
        Ok(Self {
            schema: session.schema(),
            level: session.get_level().to_vec(),
            session: session.edit_tree(),
            running: session.running_tree()?,
            mangler: None,
        })
    }

    /// Diff two arbitrary trees.
    pub fn from_trees(
        schema: &'a SchemaRepository,
        session: &'a ConfigTree,
        running: Arc<ConfigTree>,
    ) -> Self {
        Self {
            schema,
            level: Vec::new(),
            session,
            running,
            mangler: None,
        }
    }

    pub fn with_mangler(mut self, mangler: Mangler) -> Self {
        self.mangler = Some(mangler);
        self
    }

    pub fn set_level<P: IntoSegments>(&mut self, path: P) -> Result<()> {
        let path = path.into_segments();
        self.schema.resolve(&path)?;
        self.level = path;
        Ok(())
    }

    pub fn get_level(&self) -> &[String] {
        &self.level
    }

    fn full_path<P: IntoSegments>(&self, path: P) -> Vec<String> {
        let mut full = self.level.clone();
        full.extend(path.into_segments());
        full
    }

    /// Classify the children of `path`, expanding the requested classes.
    pub fn child_nodes_diff<P: IntoSegments>(
        &self,
        path: P,
        expand_classes: &[DiffClass],
        no_defaults: bool,
    ) -> Result<DiffResult> {
        let full = self.full_path(path);
        self.schema.resolve(&full)?;
        if self.schema.is_leaf(&full) {
            return Err(Error::diff(&full, "leaf nodes have no children to diff"));
        }

        let empty = ConfigTree::new();
        let session = self.session.get(&full).unwrap_or(&empty);
        let running = self.running.get(&full).unwrap_or(&empty);
        let defaults = || self.schema.defaults(&full);

        Ok(self.classify(session, running, expand_classes, no_defaults, defaults))
    }

    /// Classify the node at `path` itself, as the only key of its parent.
    ///
    /// Defaults for an expanded `merge` are placed under the node's key.
    pub fn node_diff<P: IntoSegments>(
        &self,
        path: P,
        expand_classes: &[DiffClass],
        no_defaults: bool,
    ) -> Result<DiffResult> {
        let full = self.full_path(path);
        self.schema.resolve(&full)?;
        let Some(name) = full.last() else {
            return Err(Error::diff(&full, "node diff needs a non-empty path"));
        };

        let wrap = |node: Option<&ConfigTree>| {
            let mut children = Children::new();
            if let Some(node) = node {
                children.insert(name.clone(), node.clone());
            }
            ConfigTree::Subtree(children)
        };
        let session = wrap(self.session.get(&full));
        let running = wrap(self.running.get(&full));
        let defaults = || {
            let defaults = self.schema.defaults(&full);
            if defaults.is_empty() {
                defaults
            } else {
                wrap(Some(&defaults))
            }
        };

        Ok(self.classify(&session, &running, expand_classes, no_defaults, defaults))
    }

    fn classify(
        &self,
        session: &ConfigTree,
        running: &ConfigTree,
        expand_classes: &[DiffClass],
        no_defaults: bool,
        defaults: impl Fn() -> ConfigTree,
    ) -> DiffResult {
        let mut result = key_sets(session, running);

        for class in DiffClass::ALL {
            if !expand_classes.contains(&class) {
                continue;
            }
            let source = if class.reads_running() {
                running
            } else {
                session
            };
            let mut expanded = expand(&result.get(class).keys(), source);

            if class.takes_defaults() && !no_defaults {
                let mut merged = ConfigTree::Subtree(expanded);
                merged.overlay_defaults(&defaults());
                expanded = match merged {
                    ConfigTree::Subtree(children) => children,
                    _ => Children::new(),
                };
            }
            if let Some(mangler) = &self.mangler {
                expanded = mangler(expanded);
            }
            *result.get_mut(class) = DiffSet::Expanded(expanded);
        }

        result
    }

    /// `(session value, running value)` of a leaf.
    ///
    /// Fails when either side holds a subtree.
    pub fn value_diff<P: IntoSegments>(
        &self,
        path: P,
    ) -> Result<(Option<ConfigTree>, Option<ConfigTree>)> {
        let full = self.full_path(path);
        let new = self.session.get(&full).cloned();
        let old = self.running.get(&full).cloned();

        for side in [&new, &old] {
            if let Some(ConfigTree::Subtree(_)) = side {
                return Err(Error::diff(&full, "value diff requested on a non-leaf node"));
            }
        }
        Ok((new, old))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::router_schema;
    use crate::store::ConfigStore;

    fn scalar(value: &str) -> ConfigTree {
        ConfigTree::Scalar(value.to_string())
    }

    fn store_with_running(lines: &[&str]) -> ConfigStore {
        let store = ConfigStore::new(router_schema()).unwrap();
        let mut boot = store.open_session("boot").unwrap();
        for line in lines {
            boot.set_words(&crate::path::tokenize(line)).unwrap();
        }
        boot.commit(true).unwrap();
        store
    }

    #[test]
    fn test_key_sets_classify_children() {
        let store = store_with_running(&[
            "interfaces dummy dum0 mtu 1400",
            "interfaces dummy dum1 mtu 1400",
        ]);
        let mut session = store.open_session("s").unwrap();
        session.delete("interfaces dummy dum0", None).unwrap();
        session.set("interfaces dummy dum2 mtu", "9000").unwrap();

        let diff = ConfigDiff::new(&session).unwrap();
        let result = diff.child_nodes_diff("interfaces dummy", &[], false).unwrap();
        assert_eq!(result.merge.keys(), vec!["dum1", "dum2"]);
        assert_eq!(result.delete.keys(), vec!["dum0"]);
        assert_eq!(result.add.keys(), vec!["dum2"]);
        assert_eq!(result.stable.keys(), vec!["dum1"]);
    }

    #[test]
    fn test_delete_expansion_reads_running_values() {
        let store = store_with_running(&["interfaces dummy dum0 description old"]);
        let mut session = store.open_session("s").unwrap();
        session.delete("interfaces dummy dum0", None).unwrap();

        let diff = ConfigDiff::new(&session).unwrap();
        let result = diff
            .child_nodes_diff("interfaces dummy", &[DiffClass::Delete], false)
            .unwrap();
        let removed = result.delete.expanded().unwrap();
        assert_eq!(
            removed["dum0"].get(&crate::path::split("description")),
            Some(&scalar("old"))
        );
        // Classes not requested stay as keys
        assert!(result.merge.expanded().is_none());
    }

    #[test]
    fn test_merge_expansion_overlays_defaults() {
        let store = store_with_running(&[]);
        let mut session = store.open_session("s").unwrap();
        session.set("interfaces dummy dum0 mtu", "9000").unwrap();
        session.set("interfaces dummy dum0 description", "lab").unwrap();

        let diff = ConfigDiff::new(&session).unwrap();
        let result = diff
            .child_nodes_diff("system", &[DiffClass::Merge], false)
            .unwrap();
        let merged = result.merge.expanded().unwrap();
        assert_eq!(
            merged["options"].get(&crate::path::split("ctrl-alt-del-action")),
            Some(&scalar("ignore"))
        );

        let result = diff
            .child_nodes_diff("interfaces dummy dum0", &[DiffClass::Merge], false)
            .unwrap();
        let merged = result.merge.expanded().unwrap();
        assert_eq!(merged["mtu"], scalar("9000"));
        assert_eq!(merged["description"], scalar("lab"));

        let result = diff
            .child_nodes_diff("interfaces dummy dum0", &[DiffClass::Merge], true)
            .unwrap();
        assert_eq!(result.merge.keys(), vec!["description", "mtu"]);
    }

    #[test]
    fn test_defaults_fill_unset_siblings() {
        let store = store_with_running(&[]);
        let mut session = store.open_session("s").unwrap();
        session.set("interfaces dummy dum0 description", "lab").unwrap();

        let diff = ConfigDiff::new(&session).unwrap();
        let result = diff
            .child_nodes_diff("interfaces dummy dum0", &[DiffClass::Merge], false)
            .unwrap();
        assert_eq!(result.merge.keys(), vec!["description", "mtu"]);
        assert_eq!(result.merge.expanded().unwrap()["mtu"], scalar("1500"));
    }

    #[test]
    fn test_mangler_runs_after_defaults() {
        let store = store_with_running(&[]);
        let mut session = store.open_session("s").unwrap();
        session.set("system options", "reboot-on-panic").unwrap();

        let diff = ConfigDiff::new(&session)
            .unwrap()
            .with_mangler(Arc::new(default_mangler));
        let result = diff
            .child_nodes_diff("system options", &[DiffClass::Merge], false)
            .unwrap();
        assert_eq!(
            result.merge.keys(),
            vec!["ctrl_alt_del_action", "reboot_on_panic"]
        );
    }

    #[test]
    fn test_child_diff_on_leaf_is_an_error() {
        let store = store_with_running(&[]);
        let session = store.open_session("s").unwrap();
        let diff = ConfigDiff::new(&session).unwrap();
        assert!(matches!(
            diff.child_nodes_diff("system host-name", &[], false),
            Err(Error::Diff { .. })
        ));
    }

    #[test]
    fn test_node_diff_wraps_node_under_its_key() {
        let store = store_with_running(&["system options beep-if-fully-booted"]);
        let mut session = store.open_session("s").unwrap();
        session.delete("system options", None).unwrap();

        let diff = ConfigDiff::new(&session).unwrap();
        let result = diff
            .node_diff("system options", &[DiffClass::Delete], false)
            .unwrap();
        assert!(result.merge.is_empty());
        assert!(result.delete.contains("options"));

        session.set("system options", "reboot-on-panic").unwrap();
        let diff = ConfigDiff::new(&session).unwrap();
        let result = diff
            .node_diff("system options", &[DiffClass::Merge], false)
            .unwrap();
        let options = &result.merge.expanded().unwrap()["options"];
        assert_eq!(
            options.keys(),
            vec!["ctrl-alt-del-action", "reboot-on-panic"]
        );
        assert_eq!(result.stable.keys(), vec!["options"]);

        assert!(diff.node_diff(Vec::<String>::new(), &[], false).is_err());
    }

    #[test]
    fn test_value_diff() {
        let store = store_with_running(&["system host-name r1"]);
        let mut session = store.open_session("s").unwrap();
        session.set("system host-name", "r2").unwrap();

        let diff = ConfigDiff::new(&session).unwrap();
        assert_eq!(
            diff.value_diff("system host-name").unwrap(),
            (Some(scalar("r2")), Some(scalar("r1")))
        );
        assert_eq!(
            diff.value_diff("interfaces dummy dum0 mtu").unwrap(),
            (None, None)
        );
        assert!(matches!(
            diff.value_diff("system"),
            Err(Error::Diff { .. })
        ));
    }

    #[test]
    fn test_level_prefixes_paths() {
        let store = store_with_running(&[]);
        let mut session = store.open_session("s").unwrap();
        session.set("interfaces dummy dum0 mtu", "9000").unwrap();
        session.set_level("interfaces").unwrap();

        let mut diff = ConfigDiff::new(&session).unwrap();
        assert_eq!(diff.get_level(), ["interfaces"]);
        let result = diff.child_nodes_diff("dummy", &[], false).unwrap();
        assert_eq!(result.add.keys(), vec!["dum0"]);

        diff.set_level("interfaces dummy dum0").unwrap();
        let (new, old) = diff.value_diff("mtu").unwrap();
        assert_eq!(new, Some(scalar("9000")));
        assert!(old.is_none());
    }

    #[test]
    fn test_default_mangler_is_recursive() {
        let mut tree = ConfigTree::new();
        tree.subtree_mut(&crate::path::split("member-of ctrl-alt")).unwrap();
        let ConfigTree::Subtree(children) = tree else {
            unreachable!()
        };
        let mangled = default_mangler(children);
        assert!(ConfigTree::Subtree(mangled)
            .get(&crate::path::split("member_of ctrl_alt"))
            .is_some());
    }
}
