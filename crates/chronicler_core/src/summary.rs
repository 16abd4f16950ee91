//! Roll-up summaries over closed chapter ranges.

use serde::{Deserialize, Serialize};

/// How one character changed across a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDelta {
    /// Character name
    pub name: String,
    /// What changed
    pub change: String,
}

/// Compression of a closed arc. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcSummary {
    /// Arc number
    pub arc_number: u32,
    /// First chapter covered
    pub start_chapter: u32,
    /// Last chapter covered
    pub end_chapter: u32,
    /// Arc title
    pub title: String,
    /// Prose summary
    pub summary: String,
    /// Notable moments
    #[serde(default)]
    pub milestones: Vec<String>,
    /// Threads opened inside the range
    #[serde(default)]
    pub threads_introduced: Vec<String>,
    /// Threads resolved inside the range
    #[serde(default)]
    pub threads_resolved: Vec<String>,
    /// Character changes across the range
    #[serde(default)]
    pub character_deltas: Vec<CharacterDelta>,
}

/// Compression of a closed volume. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSummary {
    /// Volume number
    pub volume_number: u32,
    /// First chapter covered
    pub start_chapter: u32,
    /// Last chapter covered
    pub end_chapter: u32,
    /// Prose summary
    pub summary: String,
    /// Notable moments
    #[serde(default)]
    pub milestones: Vec<String>,
    /// Threads opened inside the range
    #[serde(default)]
    pub threads_introduced: Vec<String>,
    /// Threads resolved inside the range
    #[serde(default)]
    pub threads_resolved: Vec<String>,
    /// Character changes across the range
    #[serde(default)]
    pub character_deltas: Vec<CharacterDelta>,
}

impl VolumeSummary {
    /// Ids of every thread the volume touched.
    pub fn thread_ids(&self) -> impl Iterator<Item = &str> {
        self.threads_introduced
            .iter()
            .chain(self.threads_resolved.iter())
            .map(String::as_str)
    }

    /// Names of every character the volume changed.
    pub fn character_names(&self) -> impl Iterator<Item = &str> {
        self.character_deltas.iter().map(|d| d.name.as_str())
    }
}
