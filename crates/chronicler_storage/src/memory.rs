//! In-memory repository.

use crate::archive::{ProjectArchive, not_found};
use async_trait::async_trait;
use chronicler_core::{
    ArcPlan, ArcSummary, ChapterCommit, ChapterRecord, CharacterLedger, PlotThread, Project,
    RepetitionLedger, RunStatus, StoryGraphNode, Twist, VolumeSummary,
};
use chronicler_error::ChroniclerResult;
use chronicler_interface::StoryRepository;
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

#[derive(Debug)]
struct Stored {
    archive: ProjectArchive,
    chapters: BTreeMap<u32, ChapterRecord>,
}

/// Repository that keeps everything in process memory.
///
/// Commits take the write lock for their whole duration, so concurrent
/// commits of the same chapter resolve to exactly one success.
#[derive(Debug, Default)]
pub struct InMemoryStoryRepository {
    projects: RwLock<HashMap<String, Stored>>,
}

impl InMemoryStoryRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    async fn read<T>(&self, project_id: &str, f: impl FnOnce(&Stored) -> T) -> ChroniclerResult<T> {
        let projects = self.projects.read().await;
        let stored = projects.get(project_id).ok_or_else(|| not_found(project_id))?;
        Ok(f(stored))
    }

    async fn write<T>(
        &self,
        project_id: &str,
        f: impl FnOnce(&mut Stored) -> T,
    ) -> ChroniclerResult<T> {
        let mut projects = self.projects.write().await;
        let stored = projects
            .get_mut(project_id)
            .ok_or_else(|| not_found(project_id))?;
        Ok(f(stored))
    }
}

#[async_trait]
impl StoryRepository for InMemoryStoryRepository {
    #[instrument(skip(self, project), fields(project_id = %project.id))]
    async fn save_project(&self, project: &Project) -> ChroniclerResult<()> {
        let mut projects = self.projects.write().await;
        match projects.get_mut(&project.id) {
            Some(stored) => stored.archive.project = project.clone(),
            None => {
                debug!("Creating project");
                projects.insert(
                    project.id.clone(),
                    Stored {
                        archive: ProjectArchive::new(project.clone()),
                        chapters: BTreeMap::new(),
                    },
                );
            }
        }
        Ok(())
    }

    async fn load_project(&self, project_id: &str) -> ChroniclerResult<Project> {
        self.read(project_id, |s| s.archive.project.clone()).await
    }

    async fn list_projects(&self) -> ChroniclerResult<Vec<Project>> {
        let projects = self.projects.read().await;
        let mut out: Vec<Project> = projects.values().map(|s| s.archive.project.clone()).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    async fn update_status(&self, project_id: &str, status: &RunStatus) -> ChroniclerResult<()> {
        self.write(project_id, |s| s.archive.project.status = status.clone())
            .await
    }

    async fn load_chapter(
        &self,
        project_id: &str,
        number: u32,
    ) -> ChroniclerResult<Option<ChapterRecord>> {
        self.read(project_id, |s| s.chapters.get(&number).cloned()).await
    }

    async fn list_chapters(
        &self,
        project_id: &str,
        range: RangeInclusive<u32>,
    ) -> ChroniclerResult<Vec<ChapterRecord>> {
        self.read(project_id, |s| s.chapters.range(range).map(|(_, c)| c.clone()).collect())
            .await
    }

    async fn list_story_nodes(
        &self,
        project_id: &str,
        range: RangeInclusive<u32>,
    ) -> ChroniclerResult<Vec<StoryGraphNode>> {
        self.read(project_id, |s| s.archive.nodes_in(range)).await
    }

    async fn list_arcs(&self, project_id: &str) -> ChroniclerResult<Vec<ArcPlan>> {
        self.read(project_id, |s| s.archive.arcs.clone()).await
    }

    async fn list_arc_summaries(&self, project_id: &str) -> ChroniclerResult<Vec<ArcSummary>> {
        self.read(project_id, |s| s.archive.arc_summaries.clone()).await
    }

    async fn list_volume_summaries(
        &self,
        project_id: &str,
    ) -> ChroniclerResult<Vec<VolumeSummary>> {
        self.read(project_id, |s| s.archive.volume_summaries.clone())
            .await
    }

    async fn list_threads(&self, project_id: &str) -> ChroniclerResult<Vec<PlotThread>> {
        self.read(project_id, |s| s.archive.threads.clone()).await
    }

    async fn save_threads(&self, project_id: &str, threads: &[PlotThread]) -> ChroniclerResult<()> {
        self.write(project_id, |s| s.archive.threads = threads.to_vec())
            .await
    }

    async fn list_twists(&self, project_id: &str) -> ChroniclerResult<Vec<Twist>> {
        self.read(project_id, |s| s.archive.twists.clone()).await
    }

    async fn save_twists(&self, project_id: &str, twists: &[Twist]) -> ChroniclerResult<()> {
        self.write(project_id, |s| s.archive.twists = twists.to_vec())
            .await
    }

    async fn load_characters(&self, project_id: &str) -> ChroniclerResult<CharacterLedger> {
        self.read(project_id, |s| s.archive.characters.clone()).await
    }

    async fn load_repetition(&self, project_id: &str) -> ChroniclerResult<RepetitionLedger> {
        self.read(project_id, |s| s.archive.repetition.clone()).await
    }

    #[instrument(skip(self, commit), fields(project_id = %commit.project.id, chapter = commit.chapter.number))]
    async fn commit_chapter(&self, commit: &ChapterCommit) -> ChroniclerResult<()> {
        let mut projects = self.projects.write().await;
        let stored = projects
            .get_mut(&commit.project.id)
            .ok_or_else(|| not_found(&commit.project.id))?;

        stored.archive.validate(commit)?;
        stored.archive.apply(commit);
        stored
            .chapters
            .insert(commit.chapter.number, commit.chapter.clone());
        debug!("Chapter committed");
        Ok(())
    }
}
