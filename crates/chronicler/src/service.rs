//! The application surface behind the CLI.

use chronicler_core::{
    ChapterRecord, CharacterLedger, GenreRegistry, PlotThread, Project, Twist, TwistKind,
};
use chronicler_error::{
    ChroniclerError, ChroniclerErrorKind, ChroniclerResult, ConfigError, StorageError,
    StorageErrorKind,
};
use chronicler_interface::{GenerationDriver, StoryRepository};
use chronicler_models::GenerationClient;
use chronicler_narrative::{ChapterOrchestrator, ProjectLeases};
use chronicler_plot::{PlotManager, PlotState};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Project records, committed chapters and hand-made plot edits.
///
/// Plot edits take the same per-project lease as chapter runs, so a thread or
/// twist added while a chapter is being produced is refused rather than lost.
pub struct Projects<R> {
    repository: Arc<R>,
    leases: ProjectLeases,
}

impl<R> Clone for Projects<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            leases: self.leases.clone(),
        }
    }
}

impl<R> std::fmt::Debug for Projects<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projects")
            .field("leases", &self.leases)
            .finish_non_exhaustive()
    }
}

impl<R: StoryRepository> Projects<R> {
    /// Projects over `repository`, sharing `leases` with any orchestrator.
    pub fn new(repository: Arc<R>, leases: ProjectLeases) -> Self {
        Self { repository, leases }
    }

    /// The story repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Register a new project.
    ///
    /// # Errors
    ///
    /// Returns a write error when the id is taken and a configuration error
    /// for an unknown genre or a zero chapter target.
    #[instrument(skip(self, project), fields(project_id = %project.id))]
    pub async fn create_project(&self, project: Project) -> ChroniclerResult<Project> {
        if project.target_chapters == 0 {
            return Err(ConfigError::new("target_chapters must be at least 1").into());
        }
        GenreRegistry::builtin()?.profile(project.genre())?;
        match self.repository.load_project(&project.id).await {
            Ok(_) => {
                return Err(StorageError::new(StorageErrorKind::Write(format!(
                    "project '{}' already exists",
                    project.id
                )))
                .into());
            }
            Err(e) if is_not_found(&e) => {}
            Err(e) => return Err(e),
        }
        self.repository.save_project(&project).await?;
        info!(genre = project.genre(), target = project.target_chapters, "Project created");
        Ok(project)
    }

    /// Every project, ordered by id.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn projects(&self) -> ChroniclerResult<Vec<Project>> {
        self.repository.list_projects().await
    }

    /// One project with its latest run status.
    ///
    /// # Errors
    ///
    /// Returns `StorageErrorKind::NotFound` for an unknown project.
    pub async fn project(&self, project_id: &str) -> ChroniclerResult<Project> {
        self.repository.load_project(project_id).await
    }

    /// A committed chapter.
    ///
    /// # Errors
    ///
    /// Returns `StorageErrorKind::NotFound` when the chapter does not exist.
    pub async fn chapter(&self, project_id: &str, number: u32) -> ChroniclerResult<ChapterRecord> {
        self.repository
            .load_chapter(project_id, number)
            .await?
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::NotFound(format!(
                    "chapter {} of project '{}'",
                    number, project_id
                )))
                .into()
            })
    }

    /// Open a plot thread by hand.
    ///
    /// # Errors
    ///
    /// Returns `ProjectBusy` during a chapter run and a configuration error
    /// for a blank description or a priority outside 1-10.
    #[instrument(skip(self, description))]
    pub async fn add_thread(
        &self,
        project_id: &str,
        description: &str,
        priority: u8,
    ) -> ChroniclerResult<PlotThread> {
        if description.trim().is_empty() {
            return Err(ConfigError::new("thread description must not be empty").into());
        }
        if !(1..=10).contains(&priority) {
            return Err(ConfigError::new(format!(
                "thread priority must lie in 1-10, got {}",
                priority
            ))
            .into());
        }
        let _lease = self.leases.acquire(project_id)?;
        let project = self.repository.load_project(project_id).await?;
        let threads = self.repository.list_threads(project_id).await?;

        let mut manager = PlotManager::new(
            project.config.plot().clone(),
            PlotState::new(Vec::new(), threads, Vec::new(), CharacterLedger::default()),
        );
        let thread = manager.open_thread(description.trim(), priority, project.current_chapter);
        self.repository
            .save_threads(project_id, &manager.state().threads)
            .await?;
        info!(thread_id = %thread.id, "Thread opened");
        Ok(thread)
    }

    /// Schedule a twist for a future chapter.
    ///
    /// # Errors
    ///
    /// Returns `ProjectBusy` during a chapter run and a configuration error
    /// when the target or foreshadowing chapters are not in the future.
    #[instrument(skip(self, description))]
    pub async fn schedule_twist(
        &self,
        project_id: &str,
        description: &str,
        kind: TwistKind,
        target_chapter: u32,
        foreshadow_chapters: Vec<u32>,
    ) -> ChroniclerResult<Twist> {
        if description.trim().is_empty() {
            return Err(ConfigError::new("twist description must not be empty").into());
        }
        let _lease = self.leases.acquire(project_id)?;
        let project = self.repository.load_project(project_id).await?;
        let twists = self.repository.list_twists(project_id).await?;

        let mut manager = PlotManager::new(
            project.config.plot().clone(),
            PlotState::new(Vec::new(), Vec::new(), twists, CharacterLedger::default()),
        );
        let twist = manager.schedule_twist(
            description.trim(),
            kind,
            target_chapter,
            foreshadow_chapters,
            project.current_chapter,
        )?;
        self.repository
            .save_twists(project_id, &manager.state().twists)
            .await?;
        Ok(twist)
    }
}

/// Chapter runs plus everything in [`Projects`], over one repository.
pub struct Chronicler<D, R> {
    orchestrator: ChapterOrchestrator<D, R>,
    projects: Projects<R>,
}

impl<D, R> std::fmt::Debug for Chronicler<D, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chronicler")
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl<D, R> Chronicler<D, R>
where
    D: GenerationDriver,
    R: StoryRepository,
{
    /// Wire an orchestrator over `client` and `repository`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the bundled genre or style data
    /// fails to load.
    pub fn new(client: GenerationClient<D>, repository: Arc<R>) -> ChroniclerResult<Self> {
        let orchestrator = ChapterOrchestrator::new(client, Arc::clone(&repository))?;
        let projects = Projects::new(repository, orchestrator.leases().clone());
        Ok(Self {
            orchestrator,
            projects,
        })
    }

    /// The chapter orchestrator.
    pub fn orchestrator(&self) -> &ChapterOrchestrator<D, R> {
        &self.orchestrator
    }

    /// Project records and plot edits, sharing this instance's leases.
    pub fn projects(&self) -> &Projects<R> {
        &self.projects
    }

    /// Produce up to `count` chapters, stopping at the project's target.
    ///
    /// # Errors
    ///
    /// Returns the first failed run; earlier chapters stay committed.
    pub async fn next_chapters(
        &self,
        project_id: &str,
        count: u32,
        cancel: &CancellationToken,
    ) -> ChroniclerResult<Vec<ChapterRecord>> {
        self.orchestrator
            .produce_chapters(project_id, count, cancel)
            .await
    }
}

fn is_not_found(error: &ChroniclerError) -> bool {
    matches!(
        error.kind(),
        ChroniclerErrorKind::Storage(e) if matches!(e.kind, StorageErrorKind::NotFound(_))
    )
}
