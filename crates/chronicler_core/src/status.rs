//! The persisted run status surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Orchestrator state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    /// No run has started
    #[default]
    Idle,
    /// Assembling context and outlining
    Planning,
    /// Writing prose
    Drafting,
    /// Quality gate and repair
    Validating,
    /// Critic and repetition checks
    Reviewing,
    /// Chapter committed
    Accepted,
    /// Run ended without a chapter
    Failed,
}

impl RunState {
    /// Progress percentage reached when entering this state.
    pub fn base_progress(&self) -> u8 {
        match self {
            RunState::Idle => 0,
            RunState::Planning => 5,
            RunState::Drafting => 25,
            RunState::Validating => 50,
            RunState::Reviewing => 75,
            RunState::Accepted | RunState::Failed => 100,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TerminalStatus {
    /// A chapter was committed
    Completed,
    /// The run failed
    Failed,
    /// The run was cancelled
    Stopped,
}

/// Progress of the current or most recent chapter run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    /// Current state
    pub state: RunState,
    /// Monotonic progress percentage within a run
    pub progress: u8,
    /// Human-readable step label
    pub step: String,
    /// Chapter being produced
    #[serde(default)]
    pub chapter: Option<u32>,
    /// Set once the run ends
    #[serde(default)]
    pub terminal: Option<TerminalStatus>,
    /// Most specific error message on failure
    #[serde(default)]
    pub error: Option<String>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Default for RunStatus {
    fn default() -> Self {
        Self {
            state: RunState::Idle,
            progress: 0,
            step: "idle".to_string(),
            chapter: None,
            terminal: None,
            error: None,
            updated_at: Utc::now(),
        }
    }
}

impl RunStatus {
    /// Whether the run has ended.
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }
}
