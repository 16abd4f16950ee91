//! Capability traits for Chronicler.
//!
//! The pipeline talks to the outside world through two seams: a text-generation
//! driver and a story repository. Both are object-safe async traits so callers
//! can swap providers and backends, including test doubles.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod repository;
mod traits;

pub use repository::StoryRepository;
pub use traits::{Embeddings, GenerationDriver};
