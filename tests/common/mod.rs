//! Shared test utilities for integration and E2E tests.
//!
//! This module provides the router schema used across test files, module
//! doubles that record or fail on demand, and a fixture for CLI tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let recorder = Recorder::default();
//! let store = store_with(|modules| {
//!     modules.register("host-name", recorder.module("host-name"));
//! });
//! ```

#![allow(dead_code)]

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use routecfg::error::{Error, Result};
use routecfg::module::{ConfigDict, ConfigModule, ModuleContext, ModuleRegistry};
use routecfg::phases::executor::SequentialExecutor;
use routecfg::phases::Phase;
use routecfg::schema::SchemaRepository;
use routecfg::store::ConfigStore;
use serde_json::json;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{router_schema, store_with, Behaviour, Recorder, TestFixture, ROUTER_SCHEMA};
}

/// Schema of a small router: interfaces, static routes and system settings.
pub const ROUTER_SCHEMA: &str = r#"
interfaces:
  children:
    dummy:
      type: tag
      owner: interfaces-dummy
      priority: 300
      children:
        address:
          type: leaf
          multi: true
          constraint: '[0-9a-f:.]+/[0-9]+'
        description:
          type: leaf
        disable:
          type: leaf
          valueless: true
        mtu:
          type: leaf
          default: 1500
    ethernet:
      type: tag
      owner: interfaces-ethernet
      priority: 5
      children:
        speed:
          type: leaf
          default: auto
    loopback:
      owner: interfaces-loopback
      priority: 10
      children:
        address:
          type: leaf
          multi: true
protocols:
  children:
    static:
      owner: protocols-static
      priority: 20
      children:
        route:
          type: tag
          children:
            next-hop:
              type: leaf
system:
  children:
    host-name:
      type: leaf
      owner: host-name
      priority: 400
    options:
      owner: system-options
      children:
        reboot-on-panic:
          type: leaf
          valueless: true
    name-server:
      type: leaf
      multi: true
"#;

pub fn router_schema() -> SchemaRepository {
    SchemaRepository::from_yaml(ROUTER_SCHEMA).expect("router schema compiles")
}

/// Store over the router schema, running phases on the calling thread.
pub fn store_with(register: impl FnOnce(&mut ModuleRegistry)) -> ConfigStore {
    let mut modules = ModuleRegistry::new();
    register(&mut modules);
    ConfigStore::new(router_schema())
        .expect("store builds")
        .with_modules(modules)
        .with_executor(SequentialExecutor)
}

/// How a recording module behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Succeed,
    FailIn(Phase),
    PanicIn(Phase),
}

/// Shared log of `"<phase> <owner> <tag>"` entries across modules
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn module(&self, owner: &str) -> Recording {
        self.module_with(owner, Behaviour::Succeed)
    }

    pub fn module_with(&self, owner: &str, behaviour: Behaviour) -> Recording {
        Recording {
            owner: owner.to_string(),
            behaviour,
            events: Arc::clone(&self.events),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("recorder lock").clone()
    }

    /// Entries of one phase, in the order they were recorded
    pub fn phase(&self, verb: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix(&format!("{} ", verb)).map(str::to_string))
            .collect()
    }
}

/// Module double that records every call and reads its subtree
pub struct Recording {
    owner: String,
    behaviour: Behaviour,
    events: Arc<Mutex<Vec<String>>>,
}

impl Recording {
    fn record(&self, phase: Phase, config: &ConfigDict) -> Result<()> {
        let tag = config["tag"].as_str().unwrap_or_default();
        let entry = format!("{} {} {}", phase.verb(), self.owner, tag);
        self.events
            .lock()
            .expect("recorder lock")
            .push(entry.trim_end().to_string());
        match self.behaviour {
            Behaviour::FailIn(p) if p == phase => {
                Err(Error::module_config(format!("{} refused", self.owner)))
            }
            Behaviour::PanicIn(p) if p == phase => panic!("{} exploded", self.owner),
            _ => Ok(()),
        }
    }
}

impl ConfigModule for Recording {
    fn get_config(&self, ctx: &mut ModuleContext<'_>) -> Result<ConfigDict> {
        let tag = ctx.tag_node().unwrap_or_default().to_string();
        let config = json!({ "tag": tag });
        self.record(Phase::Selecting, &config)?;
        Ok(config)
    }

    fn verify(&self, config: &ConfigDict) -> Result<()> {
        self.record(Phase::Verifying, config)
    }

    fn generate(&self, config: &ConfigDict) -> Result<()> {
        self.record(Phase::Generating, config)
    }

    fn apply(&self, config: &ConfigDict) -> Result<()> {
        self.record(Phase::Applying, config)
    }
}

/// A temporary directory holding a schema and command files for CLI tests.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a fixture with the router schema and a settings file.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("schema.yaml")
            .write_str(ROUTER_SCHEMA)
            .expect("Failed to write schema");
        temp_dir
            .child("settings.toml")
            .write_str("phase_timeout_secs = 30\n")
            .expect("Failed to write settings");
        Self { temp_dir }
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn schema_path(&self) -> PathBuf {
        self.temp_dir.path().join("schema.yaml")
    }

    pub fn file(&self, path: &str) -> PathBuf {
        self.temp_dir.path().join(path)
    }

    /// `routecfg` running in the fixture directory with the fixture schema.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("routecfg");
        cmd.current_dir(self.path())
            .env("ROUTECFG_SCHEMA", self.schema_path())
            .env("ROUTECFG_SETTINGS", self.file("settings.toml"))
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
