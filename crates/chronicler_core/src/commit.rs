//! Everything an accepted chapter changes, applied as one unit.

use crate::{
    ArcPlan, ArcSummary, ChapterRecord, CharacterState, PlotThread, Project, RepetitionLedger,
    StoryGraphNode, Twist, VolumeSummary,
};
use serde::{Deserialize, Serialize};

/// Mutations caused by one accepted chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterCommit {
    /// Project with its chapter counter advanced
    pub project: Project,
    /// The chapter to insert
    pub chapter: ChapterRecord,
    /// Memory node for the chapter
    pub node: StoryGraphNode,
    /// Full arc plan list after the chapter
    pub arcs: Vec<ArcPlan>,
    /// Full thread list after the chapter
    pub threads: Vec<PlotThread>,
    /// Full twist list after the chapter
    pub twists: Vec<Twist>,
    /// Character snapshots appended by the chapter
    pub character_snapshots: Vec<CharacterState>,
    /// Summary of the arc this chapter closed
    pub arc_summary: Option<ArcSummary>,
    /// Summary of the volume this chapter closed
    pub volume_summary: Option<VolumeSummary>,
    /// Repetition lists including this chapter's entries
    pub repetition: RepetitionLedger,
}
