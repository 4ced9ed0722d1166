//! # routecfg
//!
//! This library provides the configuration core of a router operating
//! system: a schema-checked editing session over a hierarchical
//! configuration tree, a diff engine comparing the session against the
//! running configuration, and a commit orchestrator that hands changed
//! subtrees to configuration modules in priority order.
//!
//! ## Quick Example
//!
//! ```
//! use routecfg::schema::SchemaRepository;
//! use routecfg::store::ConfigStore;
//!
//! let schema = SchemaRepository::from_yaml(r#"
//! system:
//!   children:
//!     host-name:
//!       type: leaf
//!       owner: host-name
//!       priority: 400
//! "#).unwrap();
//!
//! let store = ConfigStore::new(schema).unwrap();
//! let mut session = store.open_session("cli").unwrap();
//! session.set("system host-name", "r1").unwrap();
//! assert!(session.changed("system").unwrap());
//!
//! // No module is registered for `host-name`, so the commit only promotes.
//! assert!(session.commit(false).unwrap());
//! assert_eq!(
//!     session.return_effective_value("system host-name").unwrap(),
//!     Some("r1".to_string())
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Schema (`schema`)**: the read-only description of every path, its
//!   kind, owner and commit priority.
//! - **Trees (`tree`, `running`)**: the configuration tree type and the
//!   shared running configuration every session compares against.
//! - **Sessions (`session`, `store`)**: a cursor and a private edit tree;
//!   all reads and writes are checked against the schema.
//! - **Diff (`diff`, `show`)**: classification of child keys into merge,
//!   delete, add and stable, and the `+`/`-` annotated rendering.
//! - **Modules (`module`)**: the four-phase contract every configuration
//!   owner implements.
//! - **Commit (`phases`)**: selection, sequential verification, parallel
//!   generation and application, then promotion.
//! - **Persistence (`load`)**: command files of `set`/`delete`/`commit`
//!   lines.
//!
//! ## Commit Flow
//!
//! 1.  **Selecting**: changed, owned paths in priority order, tag nodes fanned
//!     out per instance, each module's configuration collected.
//! 2.  **Verifying**: every task checked on the calling thread.
//! 3.  **Generating**: artifacts rendered concurrently.
//! 4.  **Applying**: changes pushed to the system concurrently.
//! 5.  **Promotion**: the session tree becomes the running tree.

pub mod defaults;
pub mod diff;
pub mod error;
pub mod load;
pub mod module;
pub mod output;
pub mod path;
pub mod phases;
pub mod running;
pub mod schema;
pub mod session;
pub mod settings;
pub mod show;
pub mod store;
pub mod tree;

#[cfg(test)]
mod path_proptest;
