//! Phase 1: Selecting
//!
//! Turns the session's pending changes into the ordered list of commit tasks.
//!
//! ## Process
//!
//! 1.  **Owned paths**: the schema's owned paths are walked in commit order
//!     (ascending priority, unprioritised owners last). A path is only
//!     considered when its subtree differs between session and running.
//!
//! 2.  **Module lookup**: owners without a registered module are skipped with
//!     a warning; priorities declared without an owner are reported once per
//!     commit.
//!
//! 3.  **Tag fan-out**: an owned tag node yields one candidate per instance
//!     in the union of session and running instance names, so removed
//!     instances are torn down and new ones brought up.
//!
//! 4.  **Configuration**: for every candidate the session cursor is reset to
//!     the root and the module's `get_config` is called with the instance
//!     name in its context. A candidate whose configuration cannot be
//!     collected is dropped with a warning; the commit goes on without it.

use std::collections::BTreeSet;

use log::{debug, warn};

use super::executor::guarded;
use super::{Candidate, CommitTask, Phase};
use crate::error::{Error, Result};
use crate::module::ModuleContext;
use crate::path::join;
use crate::session::Session;

/// Tasks ready for verification, and the candidates that were dropped
#[derive(Default)]
pub struct Selection {
    pub tasks: Vec<CommitTask>,
    pub dropped: Vec<Error>,
}

/// Executes Phase 1 of the commit.
///
/// The session cursor is left at the root.
pub fn execute(session: &mut Session) -> Result<Selection> {
    session.reset_level();
    let candidates = select_candidates(session)?;
    debug!("selected {} candidate(s)", candidates.len());
    Ok(resolve_tasks(session, candidates))
}

/// Changed, owned paths in commit order, tag nodes fanned out per instance.
///
/// Paths are taken relative to the session's current level, which callers
/// reset to the root first.
pub fn select_candidates(session: &Session) -> Result<Vec<Candidate>> {
    let schema = session.schema();
    let modules = session.store().modules();

    for (priority, path) in schema.unowned_priorities() {
        warn!(
            "priority {} declared on '{}' without an owner",
            priority,
            join(path)
        );
    }

    let mut candidates = Vec::new();
    for owned in schema.owned_paths() {
        if !session.changed(&owned.path)? {
            continue;
        }
        let Some(module) = modules.get(&owned.owner) else {
            warn!(
                "no module registered for '{}', skipping changes at '{}'",
                owned.owner,
                join(&owned.path)
            );
            continue;
        };

        if !owned.is_tag {
            candidates.push(Candidate {
                owner: owned.owner.clone(),
                path: owned.path.clone(),
                tag_node: String::new(),
                module,
            });
            continue;
        }

        let mut instances: BTreeSet<String> = session.children(&owned.path).into_iter().collect();
        instances.extend(session.effective_children(&owned.path)?);
        for instance in instances {
            candidates.push(Candidate {
                owner: owned.owner.clone(),
                path: owned.path.clone(),
                tag_node: instance,
                module: module.clone(),
            });
        }
    }

    Ok(candidates)
}

/// Collect every candidate's configuration, sequentially and in order.
pub fn resolve_tasks(session: &mut Session, candidates: Vec<Candidate>) -> Selection {
    let mut selection = Selection::default();

    for candidate in candidates {
        session.reset_level();
        let outcome = guarded(|| {
            let mut ctx = ModuleContext::new(&candidate.tag_node, session);
            candidate.module.get_config(&mut ctx)
        });

        match outcome {
            Ok(config) => {
                debug!("get_config {} done", candidate.summary());
                selection.tasks.push(CommitTask::new(candidate, config));
            }
            Err(e) => {
                let error = candidate.summary().failure(Phase::Selecting, &e);
                warn!("dropping task: {}", error);
                selection.dropped.push(error);
            }
        }
    }

    session.reset_level();
    selection
}
