//! JSON-file repository.
//!
//! Layout under the data directory:
//!
//! ```text
//! {base}/
//! └── {project_id}/
//!     ├── archive.json        project, plot state, memory, repetition lists
//!     └── chapters/
//!         ├── 00001.json
//!         └── 00002.json
//! ```
//!
//! Every file is written to a temporary sibling and renamed into place. A
//! commit writes the chapter file first and the archive last; the archive's
//! `committed` counter decides which chapters exist, so a crash between the
//! two writes leaves an orphan chapter file that the next commit overwrites.

use crate::archive::{ProjectArchive, not_found};
use async_trait::async_trait;
use chronicler_core::{
    ArcPlan, ArcSummary, ChapterCommit, ChapterRecord, CharacterLedger, PlotThread, Project,
    RepetitionLedger, RunStatus, StoryGraphNode, Twist, VolumeSummary,
};
use chronicler_error::{ChroniclerResult, StorageError, StorageErrorKind};
use chronicler_interface::StoryRepository;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

const ARCHIVE_FILE: &str = "archive.json";
const CHAPTER_DIR: &str = "chapters";

/// Repository persisting each project as JSON files.
///
/// Writes are serialized through one lock per repository instance.
#[derive(Debug)]
pub struct FileStoryRepository {
    base_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStoryRepository {
    /// Open (and create if needed) a data directory.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the directory cannot be created.
    #[instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> ChroniclerResult<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::Write(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;
        info!(path = %base_path.display(), "Opened story repository");
        Ok(Self {
            base_path,
            write_lock: Mutex::new(()),
        })
    }

    /// Root data directory.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn project_dir(&self, project_id: &str) -> ChroniclerResult<PathBuf> {
        let valid = !project_id.is_empty()
            && project_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::new(StorageErrorKind::Write(format!(
                "invalid project id '{}': use letters, digits, '-' and '_'",
                project_id
            )))
            .into());
        }
        Ok(self.base_path.join(project_id))
    }

    fn chapter_path(&self, project_id: &str, number: u32) -> ChroniclerResult<PathBuf> {
        Ok(self
            .project_dir(project_id)?
            .join(CHAPTER_DIR)
            .join(format!("{:05}.json", number)))
    }

    async fn load_archive(&self, project_id: &str) -> ChroniclerResult<ProjectArchive> {
        let path = self.project_dir(project_id)?.join(ARCHIVE_FILE);
        read_json(&path)
            .await?
            .ok_or_else(|| not_found(project_id).into())
    }

    async fn store_archive(&self, archive: &ProjectArchive) -> ChroniclerResult<()> {
        let dir = self.project_dir(&archive.project.id)?;
        write_json(&dir.join(ARCHIVE_FILE), archive).await
    }

    /// Load, modify and store an archive under the write lock.
    async fn update<F>(&self, project_id: &str, f: F) -> ChroniclerResult<()>
    where
        F: FnOnce(&mut ProjectArchive) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut archive = self.load_archive(project_id).await?;
        f(&mut archive);
        self.store_archive(&archive).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> ChroniclerResult<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StorageError::new(StorageErrorKind::Read(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into());
        }
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        StorageError::new(StorageErrorKind::Serialization(format!(
            "{}: {}",
            path.display(),
            e
        )))
        .into()
    })
}

async fn write_json<T: Serialize + Sync>(path: &Path, value: &T) -> ChroniclerResult<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| {
        StorageError::new(StorageErrorKind::Serialization(format!(
            "{}: {}",
            path.display(),
            e
        )))
    })?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            StorageError::new(StorageErrorKind::Write(format!(
                "{}: {}",
                parent.display(),
                e
            )))
        })?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, &bytes).await.map_err(|e| {
        StorageError::new(StorageErrorKind::Write(format!(
            "{}: {}",
            temp_path.display(),
            e
        )))
    })?;
    tokio::fs::rename(&temp_path, path).await.map_err(|e| {
        StorageError::new(StorageErrorKind::Write(format!(
            "rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        )))
    })?;
    Ok(())
}

#[async_trait]
impl StoryRepository for FileStoryRepository {
    #[instrument(skip(self, project), fields(project_id = %project.id))]
    async fn save_project(&self, project: &Project) -> ChroniclerResult<()> {
        let _guard = self.write_lock.lock().await;
        let dir = self.project_dir(&project.id)?;
        let archive = match read_json::<ProjectArchive>(&dir.join(ARCHIVE_FILE)).await? {
            Some(mut archive) => {
                archive.project = project.clone();
                archive
            }
            None => {
                info!(path = %dir.display(), "Creating project");
                ProjectArchive::new(project.clone())
            }
        };
        self.store_archive(&archive).await
    }

    async fn load_project(&self, project_id: &str) -> ChroniclerResult<Project> {
        Ok(self.load_archive(project_id).await?.project)
    }

    async fn list_projects(&self) -> ChroniclerResult<Vec<Project>> {
        let read_error = |e: std::io::Error| {
            StorageError::new(StorageErrorKind::Read(format!(
                "{}: {}",
                self.base_path.display(),
                e
            )))
        };
        let mut entries = tokio::fs::read_dir(&self.base_path)
            .await
            .map_err(read_error)?;
        let mut projects = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
            if !entry.file_type().await.map_err(read_error)?.is_dir() {
                continue;
            }
            let path = entry.path().join(ARCHIVE_FILE);
            if let Some(archive) = read_json::<ProjectArchive>(&path).await? {
                projects.push(archive.project);
            }
        }
        projects.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(projects)
    }

    async fn update_status(&self, project_id: &str, status: &RunStatus) -> ChroniclerResult<()> {
        let status = status.clone();
        self.update(project_id, move |a| a.project.status = status)
            .await
    }

    async fn load_chapter(
        &self,
        project_id: &str,
        number: u32,
    ) -> ChroniclerResult<Option<ChapterRecord>> {
        let archive = self.load_archive(project_id).await?;
        if number == 0 || number > archive.committed {
            return Ok(None);
        }
        read_json(&self.chapter_path(project_id, number)?).await
    }

    async fn list_chapters(
        &self,
        project_id: &str,
        range: RangeInclusive<u32>,
    ) -> ChroniclerResult<Vec<ChapterRecord>> {
        let archive = self.load_archive(project_id).await?;
        let start = (*range.start()).max(1);
        let end = (*range.end()).min(archive.committed);
        let mut chapters = Vec::new();
        for number in start..=end {
            if let Some(chapter) = read_json(&self.chapter_path(project_id, number)?).await? {
                chapters.push(chapter);
            }
        }
        Ok(chapters)
    }

    async fn list_story_nodes(
        &self,
        project_id: &str,
        range: RangeInclusive<u32>,
    ) -> ChroniclerResult<Vec<StoryGraphNode>> {
        Ok(self.load_archive(project_id).await?.nodes_in(range))
    }

    async fn list_arcs(&self, project_id: &str) -> ChroniclerResult<Vec<ArcPlan>> {
        Ok(self.load_archive(project_id).await?.arcs)
    }

    async fn list_arc_summaries(&self, project_id: &str) -> ChroniclerResult<Vec<ArcSummary>> {
        Ok(self.load_archive(project_id).await?.arc_summaries)
    }

    async fn list_volume_summaries(
        &self,
        project_id: &str,
    ) -> ChroniclerResult<Vec<VolumeSummary>> {
        Ok(self.load_archive(project_id).await?.volume_summaries)
    }

    async fn list_threads(&self, project_id: &str) -> ChroniclerResult<Vec<PlotThread>> {
        Ok(self.load_archive(project_id).await?.threads)
    }

    async fn save_threads(&self, project_id: &str, threads: &[PlotThread]) -> ChroniclerResult<()> {
        let threads = threads.to_vec();
        self.update(project_id, move |a| a.threads = threads).await
    }

    async fn list_twists(&self, project_id: &str) -> ChroniclerResult<Vec<Twist>> {
        Ok(self.load_archive(project_id).await?.twists)
    }

    async fn save_twists(&self, project_id: &str, twists: &[Twist]) -> ChroniclerResult<()> {
        let twists = twists.to_vec();
        self.update(project_id, move |a| a.twists = twists).await
    }

    async fn load_characters(&self, project_id: &str) -> ChroniclerResult<CharacterLedger> {
        Ok(self.load_archive(project_id).await?.characters)
    }

    async fn load_repetition(&self, project_id: &str) -> ChroniclerResult<RepetitionLedger> {
        Ok(self.load_archive(project_id).await?.repetition)
    }

    #[instrument(skip(self, commit), fields(project_id = %commit.project.id, chapter = commit.chapter.number))]
    async fn commit_chapter(&self, commit: &ChapterCommit) -> ChroniclerResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut archive = self.load_archive(&commit.project.id).await?;
        archive.validate(commit)?;

        let chapter_path = self.chapter_path(&commit.project.id, commit.chapter.number)?;
        write_json(&chapter_path, &commit.chapter).await?;

        archive.apply(commit);
        self.store_archive(&archive).await?;
        debug!(path = %chapter_path.display(), "Chapter committed");
        Ok(())
    }
}
