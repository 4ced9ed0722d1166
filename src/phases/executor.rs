//! Task groups for the parallel commit phases
//!
//! Generating and Applying fan every task out to a worker and join them all
//! before the commit may move on. The [`PhaseExecutor`] trait is that
//! barrier: it takes the phase's jobs and returns one outcome per job, in job
//! order, once every job has reported or the watchdog fired.
//!
//! - [`RayonExecutor`] runs jobs on a dedicated rayon thread pool and waits
//!   at most the configured timeout. Jobs still running when it fires are
//!   reported as `None`; they are not cancelled and run to completion in the
//!   background.
//! - [`SequentialExecutor`] runs jobs inline, one after the other, which
//!   keeps tests deterministic.
//!
//! Both contain panics: a panicking module becomes a failed job.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::{CommitTask, Phase};
use crate::error::{Error, Result};
use crate::module::{ConfigDict, ConfigModule};

/// A unit of work in a parallel phase
pub type Job = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// Runs all jobs of one phase and joins them
pub trait PhaseExecutor: Send + Sync {
    /// Run every job; `None` marks a job that did not report in time.
    fn run_all(&self, phase: Phase, jobs: Vec<Job>) -> Vec<Option<Result<()>>>;
}

/// Run `f`, turning a panic into an error.
pub fn guarded<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(Error::module_config(format!(
            "module panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Executor backed by a rayon thread pool with a phase watchdog
pub struct RayonExecutor {
    pool: rayon::ThreadPool,
    timeout: Duration,
}

impl RayonExecutor {
    /// Build a pool of `max_workers` threads (0 = one per CPU).
    pub fn new(max_workers: usize, timeout: Duration) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .thread_name(|index| format!("commit-worker-{}", index))
            .build()
            .map_err(|e| Error::Settings {
                message: format!("cannot start commit worker pool: {}", e),
            })?;
        Ok(Self { pool, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl PhaseExecutor for RayonExecutor {
    fn run_all(&self, phase: Phase, jobs: Vec<Job>) -> Vec<Option<Result<()>>> {
        let total = jobs.len();
        let (tx, rx) = mpsc::channel();

        for (index, job) in jobs.into_iter().enumerate() {
            let tx = tx.clone();
            self.pool.spawn(move || {
                // The receiver is gone once the watchdog fired; nothing to report to.
                let _ = tx.send((index, guarded(job)));
            });
        }
        drop(tx);

        let mut outcomes: Vec<Option<Result<()>>> = (0..total).map(|_| None).collect();
        let deadline = Instant::now() + self.timeout;
        let mut received = 0;

        while received < total {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((index, outcome)) => {
                    outcomes[index] = Some(outcome);
                    received += 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "{} phase watchdog fired after {:?} with {} task(s) outstanding",
                        phase,
                        self.timeout,
                        total - received
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        outcomes
    }
}

/// Executor running every job inline on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl PhaseExecutor for SequentialExecutor {
    fn run_all(&self, _phase: Phase, jobs: Vec<Job>) -> Vec<Option<Result<()>>> {
        jobs.into_iter().map(|job| Some(guarded(job))).collect()
    }
}

/// Operation a parallel phase performs on each task
pub type TaskOperation = fn(&dyn ConfigModule, &ConfigDict) -> Result<()>;

/// Fan `operation` out over `tasks` and join.
///
/// Returns the phase's failures: one per failed task plus a `PhaseTimeout`
/// when tasks did not report. Success means the list is empty, i.e. every
/// task completed successfully.
pub fn fan_out(
    phase: Phase,
    tasks: &[CommitTask],
    executor: &dyn PhaseExecutor,
    operation: TaskOperation,
) -> Vec<Error> {
    let jobs: Vec<Job> = tasks
        .iter()
        .map(|task| {
            let module = Arc::clone(&task.module);
            let config = Arc::clone(&task.config);
            let label = task.summary().to_string();
            Box::new(move || {
                debug!("{} {}", phase.verb(), label);
                operation(module.as_ref(), &config)?;
                debug!("{} {} done", phase.verb(), label);
                Ok(())
            }) as Job
        })
        .collect();

    let outcomes = executor.run_all(phase, jobs);

    let mut failures = Vec::new();
    let mut completed = 0;
    let mut pending = 0;
    for (task, outcome) in tasks.iter().zip(outcomes.iter()) {
        match outcome {
            Some(Ok(())) => completed += 1,
            Some(Err(e)) => failures.push(task.failure(phase, e)),
            None => pending += 1,
        }
    }
    // An executor returning fewer outcomes than jobs lost track of the rest.
    pending += tasks.len().saturating_sub(outcomes.len());

    if pending > 0 {
        failures.push(Error::PhaseTimeout {
            phase: phase.to_string(),
            pending,
        });
    }
    debug!(
        "{} phase: {}/{} task(s) completed",
        phase,
        completed,
        tasks.len()
    );
    failures
}
