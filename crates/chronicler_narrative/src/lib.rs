//! Chapter production for long-running serials.
//!
//! [`ChapterOrchestrator`] runs one chapter at a time through four agent
//! roles sharing one generation client. The Architect plans the arc and
//! outline, the Writer drafts, the quality gate and Critic review, and the
//! Archivist records what the accepted chapter established. A run either
//! commits exactly one chapter, with all of its memory, or leaves the
//! project as it found it.
//!
//! ```text
//! Idle -> Planning -> Drafting -> Validating -> Reviewing -> Accepted
//!                        ^                           |
//!                        +------ rewrite notes ------+   (up to max_retries)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod agent;
mod archivist;
mod critic;
mod lease;
mod orchestrator;
mod outline;
mod prompts;
mod status;

pub use agent::AgentRole;
pub use critic::CriticReport;
pub use lease::{ProjectLease, ProjectLeases};
pub use orchestrator::ChapterOrchestrator;
pub use outline::ChapterOutline;
pub use status::StatusReporter;
