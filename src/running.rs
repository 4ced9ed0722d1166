//! Shared handle on the Running Tree
//!
//! The running configuration is read by every session and written only by
//! commit promotion. Readers take a cheap snapshot (an `Arc` clone of the
//! current version); promotion swaps in a new version under the write lock,
//! so no reader ever observes a partially promoted tree.

use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};
use crate::tree::ConfigTree;

/// Process-wide running configuration, shared between sessions
#[derive(Debug, Clone, Default)]
pub struct RunningConfig {
    current: Arc<RwLock<Arc<ConfigTree>>>,
}

impl RunningConfig {
    /// Create a handle on an empty running configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle starting from an existing tree
    pub fn with_tree(tree: ConfigTree) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(tree))),
        }
    }

    /// Current version of the running tree
    pub fn snapshot(&self) -> Result<Arc<ConfigTree>> {
        let current = self.current.read().map_err(|_| Error::LockPoisoned {
            context: "running configuration".to_string(),
        })?;
        Ok(Arc::clone(&current))
    }

    /// Replace the running tree with `tree`.
    pub fn promote(&self, tree: ConfigTree) -> Result<()> {
        let mut current = self.current.write().map_err(|_| Error::LockPoisoned {
            context: "running configuration".to_string(),
        })?;
        *current = Arc::new(tree);
        Ok(())
    }
}
