//! Scripted driver, fixtures and a repository with failing layers.

#![allow(dead_code)]

use async_trait::async_trait;
use chronicler_core::{
    ArcPlan, ArcSummary, ChapterCommit, ChapterRecord, CharacterLedger, GenerateRequest,
    GenerateResponse, PlotThread, Project, ProjectConfig, RepetitionLedger, RunStatus,
    StoryGraphNode, Twist, Usage, VolumeSummary,
};
use chronicler_error::{
    ChroniclerResult, GenerationError, GenerationErrorKind, StorageError, StorageErrorKind,
};
use chronicler_interface::{GenerationDriver, StoryRepository};
use chronicler_models::GenerationClient;
use chronicler_rate_limit::{RateLimitConfig, RateLimiter, RetryPolicy};
use chronicler_storage::InMemoryStoryRepository;
use std::collections::{HashSet, VecDeque};
use std::ops::RangeInclusive;
use std::sync::Mutex;

/// Driver that replays scripted texts; fails once the script runs out.
pub struct ScriptedDriver {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedDriver {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(String::from).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("lock").clone()
    }
}

#[async_trait]
impl GenerationDriver for ScriptedDriver {
    async fn generate(&self, req: &GenerateRequest) -> ChroniclerResult<GenerateResponse> {
        self.prompts.lock().expect("lock").push(req.prompt.clone());
        match self.replies.lock().expect("lock").pop_front() {
            Some(text) => Ok(GenerateResponse {
                text,
                usage: Usage::default(),
            }),
            None => Err(GenerationError::new(GenerationErrorKind::InvalidInput(
                "script exhausted".to_string(),
            ))
            .into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

pub fn client(driver: ScriptedDriver) -> GenerationClient<ScriptedDriver> {
    let limiter = RateLimiter::new(&RateLimitConfig::default()).expect("valid limiter");
    GenerationClient::new(driver, limiter, RetryPolicy::default())
}

pub fn project(config: ProjectConfig) -> Project {
    Project::builder()
        .id("p1")
        .title("The Salt Road")
        .protagonist("Mira")
        .story_essence("A courier crosses a drowned empire carrying a letter no one may read.")
        .target_chapters(300u32)
        .config(config)
        .build()
        .expect("valid project")
}

pub fn node(chapter: u32) -> StoryGraphNode {
    StoryGraphNode {
        project_id: "p1".into(),
        chapter,
        title: format!("Chapter title {}", chapter),
        summary: format!("Mira reaches waystation {}. The tide is rising.", chapter),
        key_events: vec![format!("Waystation {} burns", chapter)],
        characters: vec![],
        open_threads: vec![],
        cliffhanger: format!("A bell rings at station {}.", chapter),
    }
}

pub fn volume_summary(number: u32, start: u32, end: u32) -> VolumeSummary {
    VolumeSummary {
        volume_number: number,
        start_chapter: start,
        end_chapter: end,
        summary: format!("Volume {} summary.", number),
        milestones: vec![],
        threads_introduced: vec![],
        threads_resolved: vec![],
        character_deltas: vec![],
    }
}

/// Commit chapters `1..=count`; `decorate` may attach summaries or state.
pub async fn seed<R, F>(repo: &R, project: &Project, count: u32, mut decorate: F) -> ChroniclerResult<Project>
where
    R: StoryRepository,
    F: FnMut(&mut ChapterCommit),
{
    repo.save_project(project).await?;
    let mut current = project.clone();
    for number in 1..=count {
        let mut next = current.clone();
        next.current_chapter = number;
        let mut commit = ChapterCommit {
            project: next,
            chapter: ChapterRecord {
                project_id: project.id.clone(),
                number,
                title: format!("Chapter title {}", number),
                body: "Body.".into(),
                word_count: 1,
                critic_score: 80,
                critic_issues: vec![],
                attempts: 1,
                created_at: chrono::Utc::now(),
            },
            node: node(number),
            arcs: vec![],
            threads: vec![],
            twists: vec![],
            character_snapshots: vec![],
            arc_summary: None,
            volume_summary: None,
            repetition: RepetitionLedger::default(),
        };
        decorate(&mut commit);
        repo.commit_chapter(&commit).await?;
        current = commit.project;
    }
    Ok(current)
}

/// Repository whose listed layers fail to load.
pub struct FlakyRepository {
    pub inner: InMemoryStoryRepository,
    failing: HashSet<&'static str>,
}

impl FlakyRepository {
    pub fn new(failing: &[&'static str]) -> Self {
        Self {
            inner: InMemoryStoryRepository::new(),
            failing: failing.iter().copied().collect(),
        }
    }

    fn check(&self, layer: &'static str) -> ChroniclerResult<()> {
        if self.failing.contains(layer) {
            return Err(StorageError::new(StorageErrorKind::Unavailable(layer.to_string())).into());
        }
        Ok(())
    }
}

#[async_trait]
impl StoryRepository for FlakyRepository {
    async fn save_project(&self, project: &Project) -> ChroniclerResult<()> {
        self.inner.save_project(project).await
    }

    async fn load_project(&self, project_id: &str) -> ChroniclerResult<Project> {
        self.inner.load_project(project_id).await
    }

    async fn list_projects(&self) -> ChroniclerResult<Vec<Project>> {
        self.inner.list_projects().await
    }

    async fn update_status(&self, project_id: &str, status: &RunStatus) -> ChroniclerResult<()> {
        self.inner.update_status(project_id, status).await
    }

    async fn load_chapter(&self, project_id: &str, number: u32) -> ChroniclerResult<Option<ChapterRecord>> {
        self.inner.load_chapter(project_id, number).await
    }

    async fn list_chapters(
        &self,
        project_id: &str,
        range: RangeInclusive<u32>,
    ) -> ChroniclerResult<Vec<ChapterRecord>> {
        self.inner.list_chapters(project_id, range).await
    }

    async fn list_story_nodes(
        &self,
        project_id: &str,
        range: RangeInclusive<u32>,
    ) -> ChroniclerResult<Vec<StoryGraphNode>> {
        self.check("nodes")?;
        self.inner.list_story_nodes(project_id, range).await
    }

    async fn list_arcs(&self, project_id: &str) -> ChroniclerResult<Vec<ArcPlan>> {
        self.inner.list_arcs(project_id).await
    }

    async fn list_arc_summaries(&self, project_id: &str) -> ChroniclerResult<Vec<ArcSummary>> {
        self.check("arc_summaries")?;
        self.inner.list_arc_summaries(project_id).await
    }

    async fn list_volume_summaries(&self, project_id: &str) -> ChroniclerResult<Vec<VolumeSummary>> {
        self.check("volumes")?;
        self.inner.list_volume_summaries(project_id).await
    }

    async fn list_threads(&self, project_id: &str) -> ChroniclerResult<Vec<PlotThread>> {
        self.check("threads")?;
        self.inner.list_threads(project_id).await
    }

    async fn save_threads(&self, project_id: &str, threads: &[PlotThread]) -> ChroniclerResult<()> {
        self.inner.save_threads(project_id, threads).await
    }

    async fn list_twists(&self, project_id: &str) -> ChroniclerResult<Vec<Twist>> {
        self.inner.list_twists(project_id).await
    }

    async fn save_twists(&self, project_id: &str, twists: &[Twist]) -> ChroniclerResult<()> {
        self.inner.save_twists(project_id, twists).await
    }

    async fn load_characters(&self, project_id: &str) -> ChroniclerResult<CharacterLedger> {
        self.check("characters")?;
        self.inner.load_characters(project_id).await
    }

    async fn load_repetition(&self, project_id: &str) -> ChroniclerResult<RepetitionLedger> {
        self.check("repetition")?;
        self.inner.load_repetition(project_id).await
    }

    async fn commit_chapter(&self, commit: &ChapterCommit) -> ChroniclerResult<()> {
        self.inner.commit_chapter(commit).await
    }
}
