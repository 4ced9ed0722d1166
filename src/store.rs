//! The configuration store
//!
//! A [`ConfigStore`] ties together everything sessions share: the compiled
//! schema, the running configuration, the registered modules and the
//! executor used by the parallel commit phases. It is cheap to clone; every
//! clone refers to the same running tree.

use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::module::ModuleRegistry;
use crate::phases::executor::{PhaseExecutor, RayonExecutor};
use crate::running::RunningConfig;
use crate::schema::SchemaRepository;
use crate::session::Session;
use crate::settings::Settings;
use crate::tree::ConfigTree;

/// Shared state behind every session
#[derive(Clone)]
pub struct ConfigStore {
    schema: Arc<SchemaRepository>,
    running: RunningConfig,
    modules: Arc<ModuleRegistry>,
    executor: Arc<dyn PhaseExecutor>,
    backup: bool,
}

impl ConfigStore {
    /// Create a store with default settings and no modules.
    pub fn new(schema: SchemaRepository) -> Result<Self> {
        Self::from_settings(schema, &Settings::default())
    }

    /// Create a store whose commit executor follows `settings`.
    pub fn from_settings(schema: SchemaRepository, settings: &Settings) -> Result<Self> {
        let executor = RayonExecutor::new(settings.max_workers, settings.phase_timeout())?;
        Ok(Self {
            schema: Arc::new(schema),
            running: RunningConfig::new(),
            modules: Arc::new(ModuleRegistry::new()),
            executor: Arc::new(executor),
            backup: settings.backup,
        })
    }

    pub fn with_modules(mut self, modules: ModuleRegistry) -> Self {
        self.modules = Arc::new(modules);
        self
    }

    pub fn with_executor<E>(mut self, executor: E) -> Self
    where
        E: PhaseExecutor + 'static,
    {
        self.executor = Arc::new(executor);
        self
    }

    /// Start from an existing running tree.
    pub fn with_running(mut self, tree: ConfigTree) -> Self {
        self.running = RunningConfig::with_tree(tree);
        self
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Open an editing session on a copy of the current running tree.
    pub fn open_session(&self, id: impl Into<String>) -> Result<Session> {
        let id = id.into();
        let edit = self.running.snapshot()?.as_ref().clone();
        debug!("opened session {}", id);
        Ok(Session::new(id, edit, self.clone()))
    }

    pub fn schema(&self) -> &Arc<SchemaRepository> {
        &self.schema
    }

    pub fn running(&self) -> &RunningConfig {
        &self.running
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn executor(&self) -> &dyn PhaseExecutor {
        self.executor.as_ref()
    }

    /// Whether saving keeps the previous file as `.backup`
    pub fn backup(&self) -> bool {
        self.backup
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("modules", &self.modules)
            .field("backup", &self.backup)
            .finish_non_exhaustive()
    }
}
