//! The project record.

use crate::{ProjectConfig, RunStatus};
use chronicler_error::{BuilderError, BuilderErrorKind, ChroniclerResult};
use serde::{Deserialize, Serialize};

/// One serialized work in progress.
///
/// # Examples
///
/// ```
/// use chronicler_core::Project;
///
/// let project = Project::builder()
///     .id("p1")
///     .title("The Salt Road")
///     .protagonist("Mira")
///     .target_chapters(300u32)
///     .build()
///     .unwrap();
///
/// assert_eq!(project.current_chapter, 0);
/// assert_eq!(project.next_chapter(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct Project {
    /// Stable identifier
    pub id: String,
    /// Working title
    pub title: String,
    /// Protagonist name
    pub protagonist: String,
    /// Premise, voice and world rules; fixed for the project lifetime
    #[builder(default)]
    #[serde(default)]
    pub story_essence: String,
    /// Planned length in chapters
    pub target_chapters: u32,
    /// Highest committed chapter number (0 before the first chapter)
    #[builder(default)]
    #[serde(default)]
    pub current_chapter: u32,
    /// Generation parameters
    #[builder(default)]
    #[serde(default)]
    pub config: ProjectConfig,
    /// Status of the most recent chapter run
    #[builder(default)]
    #[serde(default)]
    pub status: RunStatus,
}

impl Project {
    /// Start building a project.
    pub fn builder() -> ProjectBuilder {
        ProjectBuilder::default()
    }

    /// Number of the chapter the next run produces.
    pub fn next_chapter(&self) -> u32 {
        self.current_chapter + 1
    }

    /// Genre tag from the project configuration.
    pub fn genre(&self) -> &str {
        self.config.genre()
    }

    /// Whether the target chapter count has been reached.
    pub fn is_complete(&self) -> bool {
        self.current_chapter >= self.target_chapters
    }
}

impl ProjectBuilder {
    /// Build the project.
    ///
    /// # Errors
    ///
    /// Returns a builder error when a required field is missing or the id,
    /// title or protagonist is blank.
    #[track_caller]
    pub fn build(&self) -> ChroniclerResult<Project> {
        let project = self.build_internal().map_err(|e| match e {
            ProjectBuilderError::UninitializedField(field) => {
                BuilderError::new(BuilderErrorKind::MissingField(field.to_string()))
            }
            ProjectBuilderError::ValidationError(message) => BuilderError::from(message),
        })?;
        for (field, value) in [
            ("id", &project.id),
            ("title", &project.title),
            ("protagonist", &project.protagonist),
        ] {
            if value.trim().is_empty() {
                return Err(BuilderError::from(format!("project {} must not be blank", field)).into());
            }
        }
        Ok(project)
    }
}
