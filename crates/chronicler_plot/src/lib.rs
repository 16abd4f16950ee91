//! Plot and arc state management.
//!
//! [`PlotManager`] owns the narrative state machine of one project: arcs
//! (created lazily, Planned → Active → Completed), plot threads, scheduled
//! twists and the character snapshot ledger. It computes per-chapter
//! objectives for the Architect and applies the structured analysis of an
//! accepted chapter. It never reads prose; thread resolution happens only
//! through explicit signals.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod manager;
mod objectives;
mod state;

pub use manager::{PlotManager, PlotUpdate, RejectedResolution};
pub use objectives::{ArcPhase, ChapterObjectives, Objective};
pub use state::PlotState;
