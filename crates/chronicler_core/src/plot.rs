//! Plot threads, twists and arc plans.

use serde::{Deserialize, Serialize};

/// Lifecycle of a plot thread.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ThreadStatus {
    /// Introduced, not yet advanced
    Open,
    /// Advanced at least once
    Developing,
    /// Closed by an explicit resolution signal
    Resolved,
}

/// An unresolved narrative tension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotThread {
    /// Stable identifier
    pub id: String,
    /// What is unresolved
    pub description: String,
    /// Priority 1-10
    pub priority: u8,
    /// Lifecycle state
    pub status: ThreadStatus,
    /// Chapter that introduced the thread
    pub origin_chapter: u32,
    /// Chapter that resolved the thread
    #[serde(default)]
    pub resolution_chapter: Option<u32>,
    /// Chapter that last advanced the thread
    #[serde(default)]
    pub last_advanced: Option<u32>,
}

impl PlotThread {
    /// New open thread with a generated id.
    pub fn open(description: impl Into<String>, priority: u8, origin_chapter: u32) -> Self {
        Self {
            id: format!("thread-{}", uuid::Uuid::new_v4().simple()),
            description: description.into(),
            priority: priority.clamp(1, 10),
            status: ThreadStatus::Open,
            origin_chapter,
            resolution_chapter: None,
            last_advanced: None,
        }
    }

    /// Whether the thread is still unresolved.
    pub fn is_active(&self) -> bool {
        self.status != ThreadStatus::Resolved
    }
}

/// Category of a planned revelation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TwistKind {
    /// An ally turns out to be working against the protagonist
    Betrayal,
    /// Someone is not who they seemed
    Identity,
    /// Hidden information comes to light
    Revelation,
    /// The situation flips
    Reversal,
    /// A significant character dies
    Death,
    /// The balance of power changes
    PowerShift,
    /// Anything else
    Other,
}

/// Whether a twist has been revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TwistStatus {
    /// Not yet revealed
    Pending,
    /// Revealed in `Twist::revealed_chapter`
    Revealed,
}

/// A planned future revelation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Twist {
    /// Stable identifier
    pub id: String,
    /// What is revealed
    pub description: String,
    /// Chapter the reveal is scheduled for
    pub target_chapter: u32,
    /// Category
    pub kind: TwistKind,
    /// Reveal status
    pub status: TwistStatus,
    /// Chapters that should plant hints
    #[serde(default)]
    pub foreshadow_chapters: Vec<u32>,
    /// Chapter the reveal happened in
    #[serde(default)]
    pub revealed_chapter: Option<u32>,
}

impl Twist {
    /// New pending twist with a generated id.
    pub fn planned(
        description: impl Into<String>,
        kind: TwistKind,
        target_chapter: u32,
        foreshadow_chapters: Vec<u32>,
    ) -> Self {
        Self {
            id: format!("twist-{}", uuid::Uuid::new_v4().simple()),
            description: description.into(),
            target_chapter,
            kind,
            status: TwistStatus::Pending,
            foreshadow_chapters,
            revealed_chapter: None,
        }
    }
}

/// Lifecycle of an arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArcStatus {
    /// Created but no chapter written yet
    Planned,
    /// At least one chapter written
    Active,
    /// Nominal end reached and summarized
    Completed,
}

/// Planning record for one arc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcPlan {
    /// Arc number, from 1
    pub number: u32,
    /// First chapter
    pub start_chapter: u32,
    /// Nominal last chapter
    pub end_chapter: u32,
    /// Working title
    pub title: String,
    /// What the arc is about
    pub brief: String,
    /// Lifecycle state
    pub status: ArcStatus,
}

impl ArcPlan {
    /// Whether `chapter` falls inside the nominal range.
    pub fn covers(&self, chapter: u32) -> bool {
        chapter >= self.start_chapter && chapter <= self.end_chapter
    }

    /// Position of `chapter` inside the arc, 0.0 at the start to 1.0 at the end.
    pub fn progress(&self, chapter: u32) -> f64 {
        let span = (self.end_chapter - self.start_chapter).max(1) as f64;
        (chapter.saturating_sub(self.start_chapter) as f64 / span).clamp(0.0, 1.0)
    }
}
