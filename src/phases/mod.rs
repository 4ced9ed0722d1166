//! Implementation of the commit phases.
//!
//! ## Overview
//!
//! A commit reconciles one session against the running configuration by
//! driving the owning configuration modules through these phases:
//! 1. Selecting - find changed, owned paths in priority order, fan tag nodes
//!    out per instance and collect each task's configuration
//! 2. Verifying - check every task sequentially; any failure aborts
//! 3. Generating - render artifacts for every task concurrently, then join
//! 4. Applying - apply every task concurrently, then join
//! 5. Promotion - replace the running tree with the session tree
//!
//! Priority is the only ordering between tasks: Verifying walks tasks in
//! candidate order, the parallel phases give no ordering at all. Each phase
//! is a barrier; nothing of phase N+1 starts before every task of phase N
//! has reported.
//!
//! There is no compensating rollback. When Generating or Applying fails after
//! some tasks succeeded, the running tree is left untouched but the system
//! may already be partially changed.

use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::module::{ConfigDict, ConfigModule};

// Phase modules
pub mod apply;
pub mod executor;
pub mod generate;
pub mod orchestrator;
pub mod selection;
pub mod verify;

// Re-export phase modules in pipeline order
pub use apply as phase4;
pub use generate as phase3;
pub use selection as phase1;
pub use verify as phase2;

/// Commit phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Selecting,
    Verifying,
    Generating,
    Applying,
}

impl Phase {
    /// Name of the module call made during this phase
    pub fn verb(&self) -> &'static str {
        match self {
            Phase::Selecting => "get_config",
            Phase::Verifying => "verify",
            Phase::Generating => "generate",
            Phase::Applying => "apply",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Selecting => "selecting",
            Phase::Verifying => "verifying",
            Phase::Generating => "generating",
            Phase::Applying => "applying",
        };
        f.write_str(name)
    }
}

/// An owned path selected for commit, before its configuration is collected
#[derive(Clone)]
pub struct Candidate {
    pub owner: String,
    pub path: Vec<String>,
    /// Tag instance name, empty for non-tag owners
    pub tag_node: String,
    pub module: Arc<dyn ConfigModule>,
}

impl Candidate {
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            owner: self.owner.clone(),
            path: self.path.clone(),
            tag_node: self.tag_node.clone(),
        }
    }
}

/// One unit of commit work: a module bound to its resolved configuration
#[derive(Clone)]
pub struct CommitTask {
    pub owner: String,
    pub path: Vec<String>,
    /// Tag instance name, empty for non-tag owners
    pub tag_node: String,
    pub module: Arc<dyn ConfigModule>,
    pub config: Arc<ConfigDict>,
}

impl CommitTask {
    pub fn new(candidate: Candidate, config: ConfigDict) -> Self {
        Self {
            owner: candidate.owner,
            path: candidate.path,
            tag_node: candidate.tag_node,
            module: candidate.module,
            config: Arc::new(config),
        }
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            owner: self.owner.clone(),
            path: self.path.clone(),
            tag_node: self.tag_node.clone(),
        }
    }

    /// Wrap a module failure with this task's context
    pub fn failure(&self, phase: Phase, error: &Error) -> Error {
        self.summary().failure(phase, error)
    }
}

/// Identity of a task, kept in the commit report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSummary {
    pub owner: String,
    pub path: Vec<String>,
    pub tag_node: String,
}

impl TaskSummary {
    /// Wrap a module failure with this task's context
    pub fn failure(&self, phase: Phase, error: &Error) -> Error {
        Error::Module {
            module: self.owner.clone(),
            path: self.path.join(" "),
            tag_node: (!self.tag_node.is_empty()).then(|| self.tag_node.clone()),
            phase: phase.verb().to_string(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for TaskSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join(" "))?;
        if !self.tag_node.is_empty() {
            write!(f, " {}", self.tag_node)?;
        }
        Ok(())
    }
}

/// Final state of a commit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
    /// Every phase succeeded and the session became the running tree
    Promoted,
    /// The commit stopped at the end of this phase; running tree unchanged
    Aborted(Phase),
}

/// Outcome of one commit attempt
#[derive(Debug)]
pub struct CommitReport {
    pub state: CommitState,
    /// Tasks that took part, in candidate order
    pub tasks: Vec<TaskSummary>,
    /// Tasks dropped because their configuration could not be collected
    pub dropped: Vec<Error>,
    /// Failures of the phase that aborted the commit
    pub failures: Vec<Error>,
}

impl CommitReport {
    pub fn succeeded(&self) -> bool {
        self.state == CommitState::Promoted
    }
}
