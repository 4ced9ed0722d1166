//! Orchestrator for the complete commit
//!
//! This module coordinates all phases to provide a clean API for one commit
//! attempt: `Selecting → Verifying → Generating → Applying → Promoted`, or
//! `Aborted` at the end of the first phase that reports a failure.

use log::{error, info};

use super::{phase1, phase2, phase3, phase4};
use super::{CommitReport, CommitState, CommitTask, Phase, TaskSummary};
use crate::error::{Error, Result};
use crate::session::Session;

/// Execute one commit of `session`.
///
/// With `memory_only`, no module runs and the session is promoted
/// unconditionally. Otherwise:
/// 1. Select changed, owned paths and collect each task's configuration
/// 2. Verify every task sequentially
/// 3. Generate every task concurrently
/// 4. Apply every task concurrently
/// 5. Promote the session tree to the running tree
///
/// Module failures never surface as `Err`: they abort the commit and are
/// listed in the report. `Err` is reserved for failures of the engine itself.
/// The session's cursor is restored afterwards.
pub fn execute(session: &mut Session, memory_only: bool) -> Result<CommitReport> {
    if memory_only {
        session.promote()?;
        info!(
            "session {}: configuration promoted without running modules",
            session.id()
        );
        return Ok(CommitReport {
            state: CommitState::Promoted,
            tasks: Vec::new(),
            dropped: Vec::new(),
            failures: Vec::new(),
        });
    }

    let level = session.get_level().to_vec();
    let report = run_phases(session);
    session.restore_level(level);
    report
}

fn run_phases(session: &mut Session) -> Result<CommitReport> {
    // Phase 1: Selecting
    info!("session {}: selecting changed configuration", session.id());
    let selection = phase1::execute(session)?;
    let tasks = selection.tasks;
    let summaries: Vec<TaskSummary> = tasks.iter().map(CommitTask::summary).collect();
    let mut report = CommitReport {
        state: CommitState::Promoted,
        tasks: summaries,
        dropped: selection.dropped,
        failures: Vec::new(),
    };

    // Phase 2: Verifying
    info!("verifying {} task(s)", tasks.len());
    let failures = phase2::execute(&tasks);
    if !failures.is_empty() {
        return Ok(abort(report, Phase::Verifying, failures));
    }

    let executor = session.store().executor();

    // Phase 3: Generating
    info!("generating {} task(s)", tasks.len());
    let failures = phase3::execute(&tasks, executor);
    if !failures.is_empty() {
        return Ok(abort(report, Phase::Generating, failures));
    }

    // Phase 4: Applying
    info!("applying {} task(s)", tasks.len());
    let failures = phase4::execute(&tasks, executor);
    if !failures.is_empty() {
        return Ok(abort(report, Phase::Applying, failures));
    }

    // Promotion
    session.promote()?;
    info!("session {}: configuration updated", session.id());
    report.state = CommitState::Promoted;
    Ok(report)
}

fn abort(mut report: CommitReport, phase: Phase, failures: Vec<Error>) -> CommitReport {
    for failure in &failures {
        error!("{}", failure);
    }
    error!(
        "configuration update failed: {} phase reported {} failure(s)",
        phase,
        failures.len()
    );
    report.state = CommitState::Aborted(phase);
    report.failures = failures;
    report
}
