//! One chapter run per project at a time.

use chronicler_error::{ChroniclerResult, PipelineError, PipelineErrorKind};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Registry of projects with a run in progress.
#[derive(Debug, Clone, Default)]
pub struct ProjectLeases {
    held: Arc<Mutex<HashSet<String>>>,
}

impl ProjectLeases {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease for `project_id` without waiting.
    ///
    /// # Errors
    ///
    /// Returns `PipelineErrorKind::ProjectBusy` when the lease is held.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronicler_narrative::ProjectLeases;
    ///
    /// let leases = ProjectLeases::new();
    /// let lease = leases.acquire("p1").unwrap();
    /// assert!(leases.acquire("p1").is_err());
    /// assert!(leases.acquire("p2").is_ok());
    /// drop(lease);
    /// assert!(leases.acquire("p1").is_ok());
    /// ```
    pub fn acquire(&self, project_id: &str) -> ChroniclerResult<ProjectLease> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(project_id.to_string()) {
            return Err(PipelineError::new(PipelineErrorKind::ProjectBusy(project_id.to_string())).into());
        }
        debug!(project_id, "Lease acquired");
        Ok(ProjectLease {
            project_id: project_id.to_string(),
            held: Arc::clone(&self.held),
        })
    }

    /// Whether a run holds the lease for `project_id`.
    pub fn is_held(&self, project_id: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(project_id)
    }
}

/// Exclusive right to run a chapter for one project; released on drop.
#[derive(Debug)]
pub struct ProjectLease {
    project_id: String,
    held: Arc<Mutex<HashSet<String>>>,
}

impl ProjectLease {
    /// Project the lease covers.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

impl Drop for ProjectLease {
    fn drop(&mut self) {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.project_id);
        debug!(project_id = %self.project_id, "Lease released");
    }
}
