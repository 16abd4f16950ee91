//! The persisted progress surface.

use chronicler_core::{RunState, RunStatus, TerminalStatus};
use chronicler_interface::StoryRepository;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Writes [`RunStatus`] updates for one run.
///
/// Progress never moves backwards within a run. Failed writes are logged and
/// otherwise ignored.
pub struct StatusReporter<R> {
    repository: Arc<R>,
    project_id: String,
    status: RunStatus,
}

impl<R: StoryRepository> StatusReporter<R> {
    /// Reporter for a run producing `chapter`.
    pub fn new(repository: Arc<R>, project_id: impl Into<String>, chapter: u32) -> Self {
        Self {
            repository,
            project_id: project_id.into(),
            status: RunStatus {
                chapter: Some(chapter),
                ..RunStatus::default()
            },
        }
    }

    /// The status as last written.
    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    /// Enter `state` with a step label.
    pub async fn enter(&mut self, state: RunState, step: impl Into<String>) {
        self.status.state = state;
        self.advance(state.base_progress(), step).await;
    }

    /// Move progress forward within the current state.
    pub async fn advance(&mut self, progress: u8, step: impl Into<String>) {
        self.status.progress = self.status.progress.max(progress.min(100));
        self.status.step = step.into();
        self.write().await;
    }

    /// End the run.
    pub async fn finish(&mut self, terminal: TerminalStatus, error: Option<String>) {
        self.status.state = match terminal {
            TerminalStatus::Completed => RunState::Accepted,
            TerminalStatus::Failed | TerminalStatus::Stopped => RunState::Failed,
        };
        self.status.progress = 100;
        self.status.step = terminal.to_string();
        self.status.terminal = Some(terminal);
        self.status.error = error;
        self.write().await;
    }

    async fn write(&mut self) {
        self.status.updated_at = Utc::now();
        debug!(
            project_id = %self.project_id,
            state = %self.status.state,
            progress = self.status.progress,
            step = %self.status.step,
            "Run status"
        );
        if let Err(e) = self
            .repository
            .update_status(&self.project_id, &self.status)
            .await
        {
            warn!(project_id = %self.project_id, error = %e, "Failed to persist run status");
        }
    }
}
