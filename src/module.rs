//! # Configuration Modules
//!
//! A configuration module owns one schema path and knows how to turn the
//! configuration below it into a running system. The commit orchestrator
//! drives every module through four calls:
//!
//! 1. `get_config` reads the session (and, for tag nodes, the instance name
//!    from its [`ModuleContext`]) and returns a self-contained [`ConfigDict`].
//! 2. `verify` rejects invalid combinations before anything is touched.
//! 3. `generate` renders on-disk artifacts.
//! 4. `apply` performs the live change.
//!
//! `generate` and `apply` may run concurrently with other modules and only
//! ever see their own dict, never the shared trees.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::session::Session;

/// Resolved configuration handed from `get_config` to the later phases
pub type ConfigDict = serde_json::Value;

/// Contract every configuration module implements
pub trait ConfigModule: Send + Sync {
    /// Collect the configuration this module needs from the session.
    fn get_config(&self, ctx: &mut ModuleContext<'_>) -> Result<ConfigDict>;

    /// Reject invalid configurations. Runs sequentially across modules.
    fn verify(&self, _config: &ConfigDict) -> Result<()> {
        Ok(())
    }

    /// Render configuration artifacts.
    fn generate(&self, _config: &ConfigDict) -> Result<()> {
        Ok(())
    }

    /// Apply the configuration to the live system.
    fn apply(&self, config: &ConfigDict) -> Result<()>;
}

/// What a module sees while its configuration is collected
pub struct ModuleContext<'a> {
    tag_node: &'a str,
    session: &'a mut Session,
}

impl<'a> ModuleContext<'a> {
    pub fn new(tag_node: &'a str, session: &'a mut Session) -> Self {
        Self { tag_node, session }
    }

    /// Tag instance this task was created for; `None` for non-tag owners
    pub fn tag_node(&self) -> Option<&str> {
        if self.tag_node.is_empty() {
            None
        } else {
            Some(self.tag_node)
        }
    }

    /// Tag instance, failing for modules that are only meaningful per instance
    pub fn require_tag_node(&self) -> Result<&str> {
        self.tag_node()
            .ok_or_else(|| Error::module_config("tag node instance not specified"))
    }

    /// Session being committed; the cursor starts at the root.
    pub fn config(&mut self) -> &mut Session {
        &mut *self.session
    }
}

/// Modules keyed by the owner id the schema refers to
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Arc<dyn ConfigModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` for `owner`, returning the module it replaces.
    pub fn register<M>(
        &mut self,
        owner: impl Into<String>,
        module: M,
    ) -> Option<Arc<dyn ConfigModule>>
    where
        M: ConfigModule + 'static,
    {
        self.modules.insert(owner.into(), Arc::new(module))
    }

    /// Register an already shared module.
    pub fn register_shared(
        &mut self,
        owner: impl Into<String>,
        module: Arc<dyn ConfigModule>,
    ) -> Option<Arc<dyn ConfigModule>> {
        self.modules.insert(owner.into(), module)
    }

    pub fn get(&self, owner: &str) -> Option<Arc<dyn ConfigModule>> {
        self.modules.get(owner).cloned()
    }

    pub fn contains(&self, owner: &str) -> bool {
        self.modules.contains_key(owner)
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("owners", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Noop;

    impl ConfigModule for Noop {
        fn get_config(&self, ctx: &mut ModuleContext<'_>) -> Result<ConfigDict> {
            Ok(json!({ "tag": ctx.tag_node() }))
        }

        fn apply(&self, _config: &ConfigDict) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_register_and_lookup() {
        let mut registry = ModuleRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.register("system-options", Noop).is_none());
        assert!(registry.register("system-options", Noop).is_some());
        registry.register("interfaces-dummy", Noop);

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("interfaces-dummy"));
        assert!(registry.get("missing").is_none());
        assert_eq!(
            registry.owners().collect::<Vec<_>>(),
            vec!["interfaces-dummy", "system-options"]
        );
    }

    #[test]
    fn test_default_verify_and_generate_succeed() {
        let module = Noop;
        assert!(module.verify(&json!({})).is_ok());
        assert!(module.generate(&json!({})).is_ok());
    }

    #[test]
    fn test_registry_debug_lists_owners() {
        let mut registry = ModuleRegistry::new();
        registry.register("console-server", Noop);
        assert!(format!("{:?}", registry).contains("console-server"));
    }
}
