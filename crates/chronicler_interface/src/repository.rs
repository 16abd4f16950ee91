//! Persistence capability for story state.

use async_trait::async_trait;
use chronicler_core::{
    ArcPlan, ArcSummary, ChapterCommit, ChapterRecord, CharacterLedger, PlotThread, Project,
    RepetitionLedger, RunStatus, StoryGraphNode, Twist, VolumeSummary,
};
use chronicler_error::ChroniclerResult;
use std::ops::RangeInclusive;

/// Read/write access to everything a project persists.
///
/// Lists are returned in ascending chapter (or arc/volume) order. Loading an
/// unknown project fails with `StorageErrorKind::NotFound`; listing data for a
/// project with nothing stored yet returns an empty collection.
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Insert or replace a project record.
    async fn save_project(&self, project: &Project) -> ChroniclerResult<()>;

    /// Load a project by id.
    async fn load_project(&self, project_id: &str) -> ChroniclerResult<Project>;

    /// Every stored project.
    async fn list_projects(&self) -> ChroniclerResult<Vec<Project>>;

    /// Replace the persisted run status of a project.
    async fn update_status(&self, project_id: &str, status: &RunStatus) -> ChroniclerResult<()>;

    /// Load one committed chapter.
    async fn load_chapter(
        &self,
        project_id: &str,
        number: u32,
    ) -> ChroniclerResult<Option<ChapterRecord>>;

    /// Committed chapters whose numbers fall in `range`.
    async fn list_chapters(
        &self,
        project_id: &str,
        range: RangeInclusive<u32>,
    ) -> ChroniclerResult<Vec<ChapterRecord>>;

    /// Story graph nodes whose chapters fall in `range`.
    async fn list_story_nodes(
        &self,
        project_id: &str,
        range: RangeInclusive<u32>,
    ) -> ChroniclerResult<Vec<StoryGraphNode>>;

    /// Arc plans.
    async fn list_arcs(&self, project_id: &str) -> ChroniclerResult<Vec<ArcPlan>>;

    /// Arc summaries.
    async fn list_arc_summaries(&self, project_id: &str) -> ChroniclerResult<Vec<ArcSummary>>;

    /// Volume summaries.
    async fn list_volume_summaries(&self, project_id: &str)
    -> ChroniclerResult<Vec<VolumeSummary>>;

    /// Plot threads.
    async fn list_threads(&self, project_id: &str) -> ChroniclerResult<Vec<PlotThread>>;

    /// Replace the plot thread list.
    async fn save_threads(&self, project_id: &str, threads: &[PlotThread]) -> ChroniclerResult<()>;

    /// Twists.
    async fn list_twists(&self, project_id: &str) -> ChroniclerResult<Vec<Twist>>;

    /// Replace the twist list.
    async fn save_twists(&self, project_id: &str, twists: &[Twist]) -> ChroniclerResult<()>;

    /// Character snapshot history.
    async fn load_characters(&self, project_id: &str) -> ChroniclerResult<CharacterLedger>;

    /// Anti-repetition lists.
    async fn load_repetition(&self, project_id: &str) -> ChroniclerResult<RepetitionLedger>;

    /// Apply every mutation of an accepted chapter as one unit.
    ///
    /// Insert-if-absent on the chapter number: when the chapter already exists
    /// this fails with `StorageErrorKind::DuplicateCommit` and nothing is
    /// written. A chapter that does not directly follow the highest committed
    /// one fails with `StorageErrorKind::NonContiguous`.
    async fn commit_chapter(&self, commit: &ChapterCommit) -> ChroniclerResult<()>;
}
