//! Story repositories for Chronicler.
//!
//! Two implementations of [`StoryRepository`](chronicler_interface::StoryRepository):
//!
//! - [`InMemoryStoryRepository`] for tests and throwaway runs;
//! - [`FileStoryRepository`] keeping one JSON archive per project plus one
//!   file per chapter under a data directory.
//!
//! Both apply a [`ChapterCommit`](chronicler_core::ChapterCommit) as one unit:
//! a commit is validated completely before anything changes, and a rejected
//! commit leaves the stored state untouched.
//!
//! # Example
//!
//! ```rust
//! use chronicler_core::Project;
//! use chronicler_interface::StoryRepository;
//! use chronicler_storage::InMemoryStoryRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = InMemoryStoryRepository::new();
//! let project = Project::builder()
//!     .id("p1")
//!     .title("The Salt Road")
//!     .protagonist("Mira")
//!     .target_chapters(300u32)
//!     .build()?;
//!
//! repository.save_project(&project).await?;
//! assert_eq!(repository.load_project("p1").await?.title, "The Salt Road");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod archive;
mod file;
mod memory;

pub use chronicler_error::{StorageError, StorageErrorKind};
pub use file::FileStoryRepository;
pub use memory::InMemoryStoryRepository;
