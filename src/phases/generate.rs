//! Phase 3: Generating
//!
//! Every task renders its artifacts concurrently on the store's executor.
//! The phase is a barrier: it returns once every task reported or the
//! watchdog fired.

use super::executor::{fan_out, PhaseExecutor};
use super::{CommitTask, Phase};
use crate::error::Error;

/// Executes Phase 3 of the commit; an empty result means every task succeeded.
pub fn execute(tasks: &[CommitTask], executor: &dyn PhaseExecutor) -> Vec<Error> {
    fan_out(Phase::Generating, tasks, executor, |module, config| {
        module.generate(config)
    })
}
