//! Phase 4: Applying
//!
//! Every task applies its configuration to the live system concurrently.
//! Work done by tasks that succeeded is not undone when a sibling fails.

use super::executor::{fan_out, PhaseExecutor};
use super::{CommitTask, Phase};
use crate::error::Error;

/// Executes Phase 4 of the commit; an empty result means every task succeeded.
pub fn execute(tasks: &[CommitTask], executor: &dyn PhaseExecutor) -> Vec<Error> {
    fan_out(Phase::Applying, tasks, executor, |module, config| {
        module.apply(config)
    })
}
