//! # Error Handling
//!
//! This module defines the centralized error type for `routecfg`. It uses the
//! `thiserror` library to build one `Error` enum covering every failure the
//! session, diff and commit layers can report.
//!
//! ## Error Kinds
//!
//! - **Schema errors** (`Schema`, `SchemaDefinition`): a path is not declared,
//!   a value does not fit the node it targets, or the schema definition
//!   itself is malformed. Always fatal to the operation that raised them.
//! - **Diff errors** (`Diff`): a diff was requested on a shape that has no
//!   child-key structure. Fatal to that call only.
//! - **Module errors** (`Module`, `ModuleConfig`): a configuration module
//!   failed in one of its four phases. `ModuleConfig` is what module authors
//!   raise; the orchestrator wraps it into `Module` with the task context and
//!   aggregates it into the commit report instead of propagating it.
//! - **Load errors** (`Load`): a command file contains a line that is not
//!   understood.
//! - **Infrastructure errors**: I/O, YAML, JSON, TOML, regex, lock poisoning
//!   and phase watchdog timeouts.

use thiserror::Error;

/// Main error type for routecfg operations
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration path is not declared in the schema, or the value given
    /// for it does not match the node kind or its constraint.
    #[error("Schema error at '{path}': {message}")]
    Schema { path: String, message: String },

    /// The schema definition document could not be compiled.
    #[error("Schema definition error: {message}")]
    SchemaDefinition { message: String },

    /// A diff operation was requested on a node without child keys, or a
    /// value diff hit a subtree.
    #[error("Diff error at '{path}': {message}")]
    Diff { path: String, message: String },

    /// A configuration module failed during a commit phase.
    #[error("Module {module} failed to {phase} '{path}'{}: {message}", tag_node.as_ref().map(|t| format!(" ({})", t)).unwrap_or_default())]
    Module {
        module: String,
        path: String,
        /// Tag instance the task was created for, if any
        tag_node: Option<String>,
        phase: String,
        message: String,
    },

    /// Raised by module implementations on an invalid configuration.
    #[error("{message}")]
    ModuleConfig { message: String },

    /// A command file line could not be processed.
    #[error("Load error on line {line}: {message}")]
    Load { line: usize, message: String },

    /// Engine settings are invalid.
    #[error("Settings error: {message}")]
    Settings { message: String },

    /// A parallel commit phase did not finish before its watchdog fired.
    #[error("Phase {phase} timed out with {pending} task(s) still running")]
    PhaseTimeout { phase: String, pending: usize },

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Shorthand for a schema error on a path given as segments.
    pub fn schema(path: &[String], message: impl Into<String>) -> Self {
        Error::Schema {
            path: path.join(" "),
            message: message.into(),
        }
    }

    /// Shorthand for a diff error on a path given as segments.
    pub fn diff(path: &[String], message: impl Into<String>) -> Self {
        Error::Diff {
            path: path.join(" "),
            message: message.into(),
        }
    }

    /// Error a module returns when the configuration it was handed is invalid.
    pub fn module_config(message: impl Into<String>) -> Self {
        Error::ModuleConfig {
            message: message.into(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
