//! Phase 2: Verifying
//!
//! Every task's `verify` runs on the calling thread, one after the other in
//! candidate order. Verification never stops early: all tasks are checked
//! so the operator sees every problem at once. Nothing has touched the
//! system yet, so a failure here leaves it exactly as it was.

use log::{debug, error};

use super::executor::guarded;
use super::{CommitTask, Phase};
use crate::error::Error;

/// Executes Phase 2 of the commit, returning one error per failed task.
pub fn execute(tasks: &[CommitTask]) -> Vec<Error> {
    let mut failures = Vec::new();

    for task in tasks {
        debug!("verify {}", task.summary());
        if let Err(e) = guarded(|| task.module.verify(&task.config)) {
            let failure = task.failure(Phase::Verifying, &e);
            error!("{}", failure);
            failures.push(failure);
        }
    }

    failures
}
