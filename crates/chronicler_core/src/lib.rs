//! Core data model for Chronicler.
//!
//! This crate holds the records every other crate reads and writes: projects,
//! committed chapters, compressed story memory, plot state, per-project
//! configuration and the genre registry.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chapter;
mod character;
mod commit;
mod config;
pub mod extraction;
mod genre;
mod plot;
mod project;
mod repetition;
mod request;
mod status;
mod summary;
pub mod text;

pub use chapter::{ChapterAnalysis, ChapterRecord, CharacterUpdate, NewThread, StoryGraphNode};
pub use character::{CharacterLedger, CharacterState};
pub use commit::ChapterCommit;
pub use config::{
    MemoryConfig, PlotConfig, ProjectConfig, RefinementConfig, RelevanceWeights,
    RepetitionConfig,
};
pub use genre::{CompositionTargets, GenreProfile, GenreRegistry, PercentRange};
pub use plot::{ArcPlan, ArcStatus, PlotThread, ThreadStatus, Twist, TwistKind, TwistStatus};
pub use project::{Project, ProjectBuilder, ProjectBuilderError};
pub use repetition::{RepetitionKind, RepetitionLedger};
pub use request::{EmbeddingTask, GenerateRequest, GenerateResponse, Usage};
pub use status::{RunState, RunStatus, TerminalStatus};
pub use summary::{ArcSummary, CharacterDelta, VolumeSummary};
