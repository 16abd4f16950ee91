//! Per-project state shared by both repositories.

use chronicler_core::{
    ArcPlan, ArcSummary, ChapterCommit, CharacterLedger, PlotThread, Project, RepetitionLedger,
    StoryGraphNode, Twist, VolumeSummary,
};
use chronicler_error::{ChroniclerResult, StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::warn;

/// Everything stored for a project except chapter bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ProjectArchive {
    pub project: Project,
    /// Highest committed chapter number
    #[serde(default)]
    pub committed: u32,
    #[serde(default)]
    pub nodes: Vec<StoryGraphNode>,
    #[serde(default)]
    pub arcs: Vec<ArcPlan>,
    #[serde(default)]
    pub arc_summaries: Vec<ArcSummary>,
    #[serde(default)]
    pub volume_summaries: Vec<VolumeSummary>,
    #[serde(default)]
    pub threads: Vec<PlotThread>,
    #[serde(default)]
    pub twists: Vec<Twist>,
    #[serde(default)]
    pub characters: CharacterLedger,
    #[serde(default)]
    pub repetition: RepetitionLedger,
}

impl ProjectArchive {
    pub fn new(project: Project) -> Self {
        Self {
            committed: project.current_chapter,
            project,
            nodes: Vec::new(),
            arcs: Vec::new(),
            arc_summaries: Vec::new(),
            volume_summaries: Vec::new(),
            threads: Vec::new(),
            twists: Vec::new(),
            characters: CharacterLedger::default(),
            repetition: RepetitionLedger::default(),
        }
    }

    pub fn nodes_in(&self, range: RangeInclusive<u32>) -> Vec<StoryGraphNode> {
        self.nodes
            .iter()
            .filter(|n| range.contains(&n.chapter))
            .cloned()
            .collect()
    }

    /// Reject a commit that would duplicate or skip a chapter.
    pub fn validate(&self, commit: &ChapterCommit) -> ChroniclerResult<()> {
        let number = commit.chapter.number;
        if commit.project.id != self.project.id || commit.chapter.project_id != self.project.id {
            return Err(StorageError::new(StorageErrorKind::Write(format!(
                "commit for chapter {} names project '{}', expected '{}'",
                number, commit.chapter.project_id, self.project.id
            )))
            .into());
        }
        if number <= self.committed {
            return Err(StorageError::new(StorageErrorKind::DuplicateCommit {
                project_id: self.project.id.clone(),
                chapter: number,
            })
            .into());
        }
        if number != self.committed + 1 {
            return Err(StorageError::new(StorageErrorKind::NonContiguous {
                project_id: self.project.id.clone(),
                chapter: number,
                latest: self.committed,
            })
            .into());
        }
        Ok(())
    }

    /// Apply a validated commit. Infallible so a commit never half-applies.
    pub fn apply(&mut self, commit: &ChapterCommit) {
        let number = commit.chapter.number;
        let mut project = commit.project.clone();
        project.current_chapter = number;
        self.project = project;
        self.committed = number;

        self.nodes.push(commit.node.clone());
        self.arcs = commit.arcs.clone();
        self.threads = commit.threads.clone();
        self.twists = commit.twists.clone();
        for snapshot in &commit.character_snapshots {
            self.characters.record(snapshot.clone());
        }
        self.repetition = commit.repetition.clone();

        if let Some(summary) = &commit.arc_summary {
            if self.arc_summaries.iter().any(|a| a.arc_number == summary.arc_number) {
                warn!(arc = summary.arc_number, "Arc summary already stored; keeping the original");
            } else {
                self.arc_summaries.push(summary.clone());
                self.arc_summaries.sort_by_key(|a| a.arc_number);
            }
        }
        if let Some(summary) = &commit.volume_summary {
            if self.volume_summaries.iter().any(|v| v.volume_number == summary.volume_number) {
                warn!(volume = summary.volume_number, "Volume summary already stored; keeping the original");
            } else {
                self.volume_summaries.push(summary.clone());
                self.volume_summaries.sort_by_key(|v| v.volume_number);
            }
        }
    }
}

pub(crate) fn not_found(project_id: &str) -> StorageError {
    StorageError::new(StorageErrorKind::NotFound(format!("project {}", project_id)))
}
