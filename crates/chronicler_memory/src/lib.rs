//! Story memory for long-running serials.
//!
//! Three pieces live here:
//!
//! - [`ContextAssembler`] builds a bounded [`ContextPayload`] for the next
//!   chapter from five levels of compressed memory (story essence, relevant
//!   volumes, the current arc, recent chapters, characters and threads), so
//!   prompt size stays roughly constant as the story grows.
//! - [`RollupSummarizer`] compresses closed arcs and volumes into summaries,
//!   falling back to an extractive digest when generation fails.
//! - [`RepetitionTracker`] rejects near-duplicate titles, openings and
//!   cliffhangers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assembler;
mod payload;
mod relevance;
mod repetition;
mod rollup;

pub use assembler::ContextAssembler;
pub use payload::{ContextLayer, ContextPayload, VolumeEntry};
pub use relevance::volume_relevance;
pub use repetition::{RepetitionTracker, RepetitionVerdict, similarity};
pub use rollup::RollupSummarizer;
