//! # Editing Sessions
//!
//! A [`Session`] is one operator's isolated working copy of the
//! configuration. It starts as a deep copy of the running tree, is changed
//! with [`Session::set`] and [`Session::delete`], and becomes the new running
//! tree when [`Session::commit`] succeeds.
//!
//! ## Paths and the Cursor
//!
//! Every operation takes a path relative to the session's current level,
//! either as typed text (`"interfaces dummy dum0"`) or as segments. The
//! level is changed with [`Session::set_level`] and never alters the tree.
//!
//! ## Shapes
//!
//! The schema decides what a write creates:
//!
//! | Target | `set(path, value)` stores |
//! |---|---|
//! | multi leaf | `value` appended to the list |
//! | valueless leaf | an empty scalar (presence only) |
//! | plain leaf | `value`, replacing the previous one |
//! | tag node | an empty instance named `value` |
//! | internal node / instance | the declared child named `value` |
//!
//! Surrounding single quotes are stripped from values before storage.
//!
//! ## Effective Reads
//!
//! The `*_effective` variants read the running tree instead of the session,
//! answering "what is live right now" from inside a session.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::error::{Error, Result};
use crate::load::{self, LoadSummary};
use crate::path::{join, unquote, IntoSegments};
use crate::phases::orchestrator;
use crate::phases::CommitReport;
use crate::schema::{NodeKind, Resolved, SchemaNode, SchemaRepository};
use crate::show;
use crate::store::ConfigStore;
use crate::tree::{Children, ConfigTree};

/// One operator's working copy of the configuration
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    level: Vec<String>,
    edit: ConfigTree,
    store: ConfigStore,
}

impl Session {
    pub(crate) fn new(id: String, edit: ConfigTree, store: ConfigStore) -> Self {
        Self {
            id,
            level: Vec::new(),
            edit,
            store,
        }
    }

    /// Session identity, e.g. `user@host`
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn schema(&self) -> &SchemaRepository {
        self.store.schema()
    }

    /// The whole session tree, ignoring the cursor
    pub fn edit_tree(&self) -> &ConfigTree {
        &self.edit
    }

    /// Current version of the running tree
    pub fn running_tree(&self) -> Result<Arc<ConfigTree>> {
        self.store.running().snapshot()
    }

    fn full_path<P: IntoSegments>(&self, path: P) -> Vec<String> {
        let mut full = self.level.clone();
        full.extend(path.into_segments());
        full
    }

    // ------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------

    /// Move the cursor to an absolute, declared path.
    pub fn set_level<P: IntoSegments>(&mut self, path: P) -> Result<()> {
        let path = path.into_segments();
        self.schema().resolve(&path)?;
        self.level = path;
        Ok(())
    }

    /// Move the cursor back to the root.
    pub fn reset_level(&mut self) {
        self.level.clear();
    }

    pub fn get_level(&self) -> &[String] {
        &self.level
    }

    /// Put back a level saved earlier with `get_level`.
    pub(crate) fn restore_level(&mut self, level: Vec<String>) {
        self.level = level;
    }

    // ------------------------------------------------------------------
    // Schema queries
    // ------------------------------------------------------------------

    pub fn resolve<P: IntoSegments>(&self, path: P) -> Result<NodeKind> {
        self.schema().kind(&self.full_path(path))
    }

    pub fn is_tag<P: IntoSegments>(&self, path: P) -> bool {
        self.schema().is_tag(&self.full_path(path))
    }

    pub fn is_leaf<P: IntoSegments>(&self, path: P) -> bool {
        self.schema().is_leaf(&self.full_path(path))
    }

    pub fn is_multi<P: IntoSegments>(&self, path: P) -> bool {
        self.schema().is_multi(&self.full_path(path))
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Store `value` at `path`; see the module docs for what gets created.
    pub fn set<P: IntoSegments>(&mut self, path: P, value: &str) -> Result<()> {
        let full = self.full_path(path);
        let value = unquote(value);
        if value.contains('\'') && value.contains('"') {
            return Err(Error::schema(
                &full,
                "a value cannot hold both quote characters",
            ));
        }
        let schema = Arc::clone(self.store.schema());

        match schema.resolve(&full)? {
            Resolved::Node(node) if node.is_leaf() => self.set_leaf(&schema, &full, node, value),
            Resolved::Node(node) if node.is_tag() => {
                if value.is_empty() {
                    return Err(Error::schema(&full, "tag instance name cannot be empty"));
                }
                let mut instance = full;
                instance.push(value.to_string());
                self.subtree_at(&instance).map(|_| ())
            }
            resolved => {
                let mut child_path = full;
                child_path.push(value.to_string());
                let child = resolved
                    .node()
                    .child(value)
                    .ok_or_else(|| Error::schema(&child_path, "path is not declared"))?;

                if !child.is_leaf() {
                    return self.subtree_at(&child_path).map(|_| ());
                }
                if !child.valueless {
                    return Err(Error::schema(&child_path, "node requires a value"));
                }
                self.store_leaf(&child_path, ConfigTree::Scalar(String::new()))
            }
        }
    }

    /// Apply a `set` command given as words: the last word is the value.
    pub fn set_words(&mut self, words: &[String]) -> Result<()> {
        let (value, path) = words
            .split_last()
            .ok_or_else(|| Error::schema(&self.level, "nothing to set"))?;
        self.set(path, value)
    }

    fn set_leaf(
        &mut self,
        schema: &SchemaRepository,
        full: &[String],
        node: &SchemaNode,
        value: &str,
    ) -> Result<()> {
        schema.validate_value(full, value)?;

        if !node.multi {
            let stored = if node.valueless { "" } else { value };
            return self.store_leaf(full, ConfigTree::Scalar(stored.to_string()));
        }

        let Some((name, parent)) = full.split_last() else {
            return Err(Error::schema(full, "the root cannot hold a value"));
        };
        let entry = self
            .subtree_at(parent)?
            .entry(name.clone())
            .or_insert_with(|| ConfigTree::List(Vec::new()));
        match entry {
            ConfigTree::List(values) => {
                values.push(value.to_string());
                Ok(())
            }
            _ => Err(Error::schema(full, "stored value is not a list")),
        }
    }

    fn store_leaf(&mut self, full: &[String], value: ConfigTree) -> Result<()> {
        let Some((name, parent)) = full.split_last() else {
            return Err(Error::schema(full, "the root cannot hold a value"));
        };
        self.subtree_at(parent)?.insert(name.clone(), value);
        Ok(())
    }

    fn subtree_at(&mut self, path: &[String]) -> Result<&mut Children> {
        self.edit
            .subtree_mut(path)
            .ok_or_else(|| Error::schema(path, "a value is stored where a node is expected"))
    }

    /// Delete the node at `path`, or one value below it.
    ///
    /// With a value: removes that entry from a multi leaf, the instance of
    /// that name from a tag node, the child of that name from a node, or the
    /// leaf itself when its value matches. Ancestors left empty are removed,
    /// up to but not including the root. Deleting something that is not
    /// there does nothing.
    pub fn delete<P: IntoSegments>(&mut self, path: P, value: Option<&str>) -> Result<()> {
        let full = self.full_path(path);
        let schema = Arc::clone(self.store.schema());
        let resolved = schema.resolve(&full)?;

        let removed = match value.map(unquote) {
            None if full.is_empty() => false,
            None => self.edit.remove(&full).is_some(),
            Some(value) => match resolved {
                Resolved::Node(node) if node.is_leaf() => self.remove_leaf_value(&full, value),
                _ => {
                    let mut child = full.clone();
                    child.push(value.to_string());
                    self.edit.remove(&child).is_some()
                }
            },
        };

        if removed {
            self.edit.prune(&full);
        } else {
            debug!(
                "session {}: nothing to delete at '{}'{}",
                self.id,
                join(&full),
                value.map(|v| format!(" ({})", v)).unwrap_or_default()
            );
        }
        Ok(())
    }

    /// Apply a `delete` command given as words.
    ///
    /// When the words minus the last one name a leaf, the last word is the
    /// value to remove; otherwise the words name the node to remove.
    pub fn delete_words(&mut self, words: &[String]) -> Result<()> {
        if let Some((last, prefix)) = words.split_last() {
            if !prefix.is_empty() && self.is_leaf(prefix) {
                return self.delete(prefix, Some(last));
            }
        }
        self.delete(words, None)
    }

    fn remove_leaf_value(&mut self, full: &[String], value: &str) -> bool {
        let scalar_matches = matches!(
            self.edit.get(full),
            Some(ConfigTree::Scalar(current)) if current == value
        );
        if scalar_matches {
            return self.edit.remove(full).is_some();
        }

        if let Some(ConfigTree::List(values)) = self.edit.get_mut(full) {
            if let Some(index) = values.iter().position(|v| v == value) {
                values.remove(index);
                return true;
            }
        }
        false
    }

    /// Reset the session to the running tree and the cursor to the root.
    pub fn discard(&mut self) -> Result<()> {
        self.edit = self.running_tree()?.as_ref().clone();
        self.level.clear();
        debug!("session {}: discarded changes", self.id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// True when something non-empty is configured at `path`.
    pub fn exists<P: IntoSegments>(&self, path: P) -> bool {
        present(&self.edit, &self.full_path(path))
    }

    pub fn exists_effective<P: IntoSegments>(&self, path: P) -> Result<bool> {
        let running = self.running_tree()?;
        Ok(present(&running, &self.full_path(path)))
    }

    /// Immediate child names: instance names, node children or list values.
    pub fn children<P: IntoSegments>(&self, path: P) -> Vec<String> {
        child_names(&self.edit, &self.full_path(path))
    }

    pub fn effective_children<P: IntoSegments>(&self, path: P) -> Result<Vec<String>> {
        let running = self.running_tree()?;
        Ok(child_names(&running, &self.full_path(path)))
    }

    /// Value of a plain leaf
    pub fn return_value<P: IntoSegments>(&self, path: P) -> Option<String> {
        scalar(&self.edit, &self.full_path(path))
    }

    pub fn return_effective_value<P: IntoSegments>(&self, path: P) -> Result<Option<String>> {
        let running = self.running_tree()?;
        Ok(scalar(&running, &self.full_path(path)))
    }

    /// Values of a multi leaf, or instance names of a tag node
    pub fn return_values<P: IntoSegments>(&self, path: P) -> Vec<String> {
        values(&self.edit, &self.full_path(path))
    }

    pub fn return_effective_values<P: IntoSegments>(&self, path: P) -> Result<Vec<String>> {
        let running = self.running_tree()?;
        Ok(values(&running, &self.full_path(path)))
    }

    /// True when the subtree at `path` differs between session and running.
    ///
    /// A missing subtree compares equal to an empty one.
    pub fn changed<P: IntoSegments>(&self, path: P) -> Result<bool> {
        let full = self.full_path(path);
        let running = self.running_tree()?;
        let empty = ConfigTree::new();
        let edit = self.edit.get(&full).unwrap_or(&empty);
        let live = running.get(&full).unwrap_or(&empty);
        Ok(edit != live)
    }

    /// Deep copy of the subtree at `path`, from running when `effective`.
    pub fn get_config_dict<P: IntoSegments>(&self, path: P, effective: bool) -> Result<ConfigTree> {
        let full = self.full_path(path);
        if effective {
            let running = self.running_tree()?;
            Ok(running.get(&full).cloned().unwrap_or_default())
        } else {
            Ok(self.edit.get(&full).cloned().unwrap_or_default())
        }
    }

    /// JSON rendering of the subtree at `path`.
    pub fn show_config<P: IntoSegments>(&self, path: P, effective: bool) -> Result<String> {
        let tree = self.get_config_dict(path, effective)?;
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"   ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        tree.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Configuration at `path` annotated with pending changes.
    pub fn show<P: IntoSegments>(&self, path: P) -> Result<String> {
        let full = self.full_path(path);
        let running = self.running_tree()?;
        Ok(show::render(
            self.schema(),
            &full,
            self.edit.get(&full),
            running.get(&full),
        ))
    }

    /// Running configuration at `path` as `set` commands.
    pub fn commands<P: IntoSegments>(&self, path: P) -> Result<String> {
        let full = self.full_path(path);
        let running = self.running_tree()?;
        Ok(load::render_commands(running.get(&full), &full))
    }

    // ------------------------------------------------------------------
    // Commit and persistence
    // ------------------------------------------------------------------

    /// Commit the session; `false` means the running tree is unchanged.
    ///
    /// `memory_only` skips every module and promotes unconditionally.
    pub fn commit(&mut self, memory_only: bool) -> Result<bool> {
        Ok(self.commit_report(memory_only)?.succeeded())
    }

    /// Commit the session and return the full report.
    pub fn commit_report(&mut self, memory_only: bool) -> Result<CommitReport> {
        orchestrator::execute(self, memory_only)
    }

    /// Replace the running tree with a copy of the session tree.
    pub(crate) fn promote(&self) -> Result<()> {
        self.store.running().promote(self.edit.clone())
    }

    /// Apply a command file to this session.
    pub fn load_config(&mut self, path: &Path) -> Result<LoadSummary> {
        load::load_file(self, path)
    }

    /// Write the running configuration to `path` as a command file.
    pub fn save_config(&self, path: &Path) -> Result<()> {
        load::save_file(self, path, self.store.backup())
    }
}

fn present(tree: &ConfigTree, path: &[String]) -> bool {
    tree.get(path).is_some_and(|node| !node.is_empty())
}

fn child_names(tree: &ConfigTree, path: &[String]) -> Vec<String> {
    tree.get(path).map(ConfigTree::keys).unwrap_or_default()
}

fn scalar(tree: &ConfigTree, path: &[String]) -> Option<String> {
    match tree.get(path) {
        Some(ConfigTree::Scalar(value)) => Some(value.clone()),
        _ => None,
    }
}

fn values(tree: &ConfigTree, path: &[String]) -> Vec<String> {
    match tree.get(path) {
        Some(ConfigTree::Scalar(value)) => vec![value.clone()],
        Some(node) => node.keys(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::executor::SequentialExecutor;
    use crate::schema::tests::router_schema;

    fn session() -> Session {
        ConfigStore::new(router_schema())
            .unwrap()
            .with_executor(SequentialExecutor)
            .open_session("test")
            .unwrap()
    }

    #[test]
    fn test_set_plain_leaf_strips_quotes_and_overwrites() {
        let mut s = session();
        s.set("system host-name", "'router1'").unwrap();
        assert!(s.exists("system host-name"));
        assert_eq!(s.return_value("system host-name").as_deref(), Some("router1"));

        s.set("system host-name", "router2").unwrap();
        assert_eq!(s.return_value("system host-name").as_deref(), Some("router2"));

        s.delete("system host-name", None).unwrap();
        assert!(!s.exists("system host-name"));
        assert!(!s.exists("system"));
    }

    #[test]
    fn test_multi_leaf_keeps_insertion_order() {
        let mut s = session();
        s.set("interfaces dummy dum0 address", "10.0.0.2/24").unwrap();
        s.set("interfaces dummy dum0 address", "10.0.0.1/24").unwrap();
        s.set("interfaces dummy dum0 address", "10.0.0.2/24").unwrap();
        assert_eq!(
            s.return_values("interfaces dummy dum0 address"),
            vec!["10.0.0.2/24", "10.0.0.1/24", "10.0.0.2/24"]
        );

        s.delete("interfaces dummy dum0 address", Some("10.0.0.2/24"))
            .unwrap();
        assert_eq!(
            s.return_values("interfaces dummy dum0 address"),
            vec!["10.0.0.1/24", "10.0.0.2/24"]
        );
    }

    #[test]
    fn test_deleting_last_value_cleans_up_ancestors() {
        let mut s = session();
        s.set("interfaces dummy dum0 address", "10.0.0.1/24").unwrap();
        s.delete("interfaces dummy dum0 address", Some("10.0.0.1/24"))
            .unwrap();
        assert!(!s.exists("interfaces dummy dum0"));
        assert!(!s.exists("interfaces"));
        assert_eq!(s.edit_tree(), &ConfigTree::new());
    }

    #[test]
    fn test_cleanup_stops_at_non_empty_ancestor() {
        let mut s = session();
        s.set("interfaces dummy dum0 address", "10.0.0.1/24").unwrap();
        s.set("interfaces dummy dum1 description", "spare").unwrap();
        s.delete("interfaces dummy dum0 address", None).unwrap();
        assert_eq!(s.children("interfaces dummy"), vec!["dum1"]);
    }

    #[test]
    fn test_set_tag_node_creates_instance() {
        let mut s = session();
        s.set("interfaces dummy", "dum0").unwrap();
        s.set("interfaces dummy", "dum1").unwrap();
        assert_eq!(s.children("interfaces dummy"), vec!["dum0", "dum1"]);
        assert_eq!(s.return_values("interfaces dummy"), vec!["dum0", "dum1"]);
        // Empty instances are present but carry nothing yet
        assert!(!s.exists("interfaces dummy dum0"));

        s.delete("interfaces dummy", Some("dum0")).unwrap();
        assert_eq!(s.children("interfaces dummy"), vec!["dum1"]);

        assert!(s.set("interfaces dummy", "''").is_err());
    }

    #[test]
    fn test_valueless_leaf() {
        let mut s = session();
        s.set("system options", "reboot-on-panic").unwrap();
        assert!(s.exists("system options reboot-on-panic"));
        assert_eq!(
            s.return_value("system options reboot-on-panic").as_deref(),
            Some("")
        );

        s.set("interfaces dummy dum0 disable", "").unwrap();
        assert!(s.exists("interfaces dummy dum0 disable"));

        let err = s
            .set("system options reboot-on-panic", "yes")
            .unwrap_err();
        assert!(err.to_string().contains("does not take a value"));
    }

    #[test]
    fn test_node_child_requiring_value_is_rejected() {
        let mut s = session();
        let err = s.set("system", "host-name").unwrap_err();
        assert!(err.to_string().contains("requires a value"));
    }

    #[test]
    fn test_set_rejects_undeclared_paths_and_bad_values() {
        let mut s = session();
        assert!(matches!(
            s.set("interfaces bridge br0", "x"),
            Err(Error::Schema { .. })
        ));
        assert!(matches!(
            s.set("system", "bogus"),
            Err(Error::Schema { .. })
        ));
        assert!(s
            .set("interfaces dummy dum0 address", "not-an-address")
            .is_err());
        assert!(s.set("interfaces dummy dum0 description", "''").is_err());
        assert!(s
            .set("interfaces dummy dum0 description", "it's \"quoted\"")
            .is_err());
        assert_eq!(s.edit_tree(), &ConfigTree::new());
    }

    #[test]
    fn test_level_prefixes_every_path() {
        let mut s = session();
        s.set_level("interfaces dummy dum0").unwrap();
        assert_eq!(s.get_level(), ["interfaces", "dummy", "dum0"]);
        s.set("address", "10.0.0.1/24").unwrap();
        assert!(s.exists("address"));

        s.reset_level();
        assert!(s.exists("interfaces dummy dum0 address"));
        assert!(s.set_level("nowhere").is_err());
        assert!(s.get_level().is_empty());
    }

    #[test]
    fn test_delete_absent_entries_is_a_no_op() {
        let mut s = session();
        s.set("interfaces dummy dum0 address", "10.0.0.1/24").unwrap();
        let before = s.edit_tree().clone();

        s.delete("interfaces dummy dum0 address", Some("192.0.2.1/24"))
            .unwrap();
        s.delete("interfaces dummy", Some("dum9")).unwrap();
        s.delete("system host-name", None).unwrap();
        s.delete("system host-name", Some("r1")).unwrap();
        assert_eq!(s.edit_tree(), &before);

        assert!(s.delete("interfaces bogus", None).is_err());
    }

    #[test]
    fn test_delete_words_picks_value_form_for_leaves() {
        let mut s = session();
        s.set("interfaces dummy dum0 address", "10.0.0.1/24").unwrap();
        s.set("interfaces dummy dum0 address", "10.0.0.2/24").unwrap();
        s.set("interfaces dummy dum1 mtu", "9000").unwrap();

        s.delete_words(&crate::path::split("interfaces dummy dum0 address 10.0.0.1/24"))
            .unwrap();
        assert_eq!(
            s.return_values("interfaces dummy dum0 address"),
            vec!["10.0.0.2/24"]
        );

        s.delete_words(&crate::path::split("interfaces dummy dum1"))
            .unwrap();
        assert_eq!(s.children("interfaces dummy"), vec!["dum0"]);
    }

    #[test]
    fn test_set_words_takes_last_word_as_value() {
        let mut s = session();
        s.set_words(&crate::path::tokenize(
            "interfaces dummy dum0 description 'uplink to core'",
        ))
        .unwrap();
        assert_eq!(
            s.return_value("interfaces dummy dum0 description").as_deref(),
            Some("uplink to core")
        );
        assert!(s.set_words(&[]).is_err());
    }

    #[test]
    fn test_changed_and_effective_reads() {
        let mut s = session();
        assert!(!s.changed("interfaces").unwrap());
        s.set("interfaces dummy dum0 address", "10.0.0.1/24").unwrap();
        assert!(s.changed("interfaces").unwrap());
        assert!(s.changed("interfaces dummy dum0").unwrap());
        assert!(!s.changed("system").unwrap());

        assert!(!s.exists_effective("interfaces").unwrap());
        assert!(s.effective_children("interfaces dummy").unwrap().is_empty());

        assert!(s.commit(true).unwrap());
        assert!(!s.changed("interfaces").unwrap());
        assert!(s.exists_effective("interfaces dummy dum0").unwrap());
        assert_eq!(
            s.return_effective_values("interfaces dummy dum0 address")
                .unwrap(),
            vec!["10.0.0.1/24"]
        );
        assert_eq!(s.return_effective_value("system host-name").unwrap(), None);
    }

    #[test]
    fn test_discard_resets_tree_and_level() {
        let mut s = session();
        s.set("system host-name", "r1").unwrap();
        s.commit(true).unwrap();
        s.set("system host-name", "r2").unwrap();
        s.set_level("system").unwrap();

        s.discard().unwrap();
        assert!(s.get_level().is_empty());
        assert_eq!(s.return_value("system host-name").as_deref(), Some("r1"));
    }

    #[test]
    fn test_get_config_dict_and_show_config() {
        let mut s = session();
        s.set("interfaces dummy dum0 address", "10.0.0.1/24").unwrap();

        let dict = s.get_config_dict("interfaces dummy", false).unwrap();
        assert_eq!(dict.keys(), vec!["dum0"]);
        assert!(s.get_config_dict("interfaces", true).unwrap().is_empty());

        let json = s.show_config("interfaces dummy dum0", false).unwrap();
        assert_eq!(json, "{\n   \"address\": [\n      \"10.0.0.1/24\"\n   ]\n}");
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = ConfigStore::new(router_schema()).unwrap();
        let mut a = store.open_session("a").unwrap();
        let b = store.open_session("b").unwrap();
        a.set("system host-name", "r1").unwrap();
        assert!(!b.exists("system host-name"));
    }
}
