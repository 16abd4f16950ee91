//! Chronicler: automatic chapter generation for long-running serialized fiction.
//!
//! Chronicler writes one installment of a serial at a time. Each run assembles
//! a bounded memory of the story so far, has an Architect plan the chapter, a
//! Writer draft it, a quality gate and Critic review it, and commits the
//! accepted chapter together with everything the story now remembers.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use chronicler::{Chronicler, ChroniclerConfig, Project};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ChroniclerConfig::load()?;
//!     let app = Chronicler::gemini(&config, &config.resolve_data_dir(None))?;
//!
//!     let project = Project::builder()
//!         .id("salt-road")
//!         .title("The Salt Road")
//!         .protagonist("Mira")
//!         .target_chapters(300u32)
//!         .config(config.project.clone())
//!         .build()?;
//!     app.projects().create_project(project).await?;
//!
//!     let chapters = app.next_chapters("salt-road", 1, &CancellationToken::new()).await?;
//!     println!("{}", chapters[0].title);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `chronicler_error` - error hierarchy
//! - `chronicler_core` - data model, project configuration, genre registry
//! - `chronicler_interface` - generation and repository capabilities
//! - `chronicler_rate_limit` - token bucket and retry policy
//! - `chronicler_models` - resilient generation client and Gemini driver
//! - `chronicler_style` - prose style analyzer
//! - `chronicler_plot` - arcs, threads, twists and character state
//! - `chronicler_memory` - context assembly, roll-ups, anti-repetition
//! - `chronicler_quality` - quality gate and refinement loop
//! - `chronicler_narrative` - the chapter orchestrator
//! - `chronicler_storage` - in-memory and filesystem repositories
//!
//! This crate re-exports the commonly used items and adds layered
//! configuration, logging setup and the `chronicler` binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod observability;
mod service;

pub use config::{ChroniclerConfig, LogConfig};
pub use observability::{ObservabilityConfig, init_observability};
pub use service::{Chronicler, Projects};

pub use chronicler_core::*;
pub use chronicler_error::*;
pub use chronicler_interface::*;
pub use chronicler_memory::{ContextAssembler, ContextPayload, RepetitionTracker, RollupSummarizer};
pub use chronicler_models::GenerationClient;
pub use chronicler_narrative::{AgentRole, ChapterOrchestrator, CriticReport, ProjectLeases};
pub use chronicler_plot::{ChapterObjectives, PlotManager, PlotState};
pub use chronicler_quality::{QualityGate, RefinementLoop};
pub use chronicler_rate_limit::{RateLimitConfig, RateLimiter, RetryConfig, RetryPolicy};
pub use chronicler_storage::{FileStoryRepository, InMemoryStoryRepository};
pub use chronicler_style::{StyleAnalyzer, StyleReport};

#[cfg(feature = "gemini")]
pub use chronicler_models::GeminiDriver;

#[cfg(feature = "gemini")]
mod gemini {
    use crate::{Chronicler, ChroniclerConfig};
    use chronicler_error::ChroniclerResult;
    use chronicler_models::{GeminiDriver, GenerationClient};
    use chronicler_rate_limit::{RateLimiter, RetryPolicy};
    use chronicler_storage::FileStoryRepository;
    use std::path::Path;
    use std::sync::Arc;
    use tracing::info;

    impl Chronicler<GeminiDriver, FileStoryRepository> {
        /// Gemini-backed instance storing projects under `data_dir`.
        ///
        /// # Errors
        ///
        /// Returns a configuration error when `GEMINI_API_KEY` is unset or
        /// the rate limit is invalid, and a write error when `data_dir`
        /// cannot be created.
        pub fn gemini(config: &ChroniclerConfig, data_dir: &Path) -> ChroniclerResult<Self> {
            let driver = GeminiDriver::from_env(&config.model)?;
            let limiter = RateLimiter::new(&config.rate_limit)?;
            let client = GenerationClient::new(driver, limiter, RetryPolicy::new(config.retry.clone()));
            let repository = Arc::new(FileStoryRepository::new(data_dir)?);
            info!(model = %config.model, data_dir = %data_dir.display(), "Chronicler ready");
            Self::new(client, repository)
        }
    }
}
