//! Persisted anti-repetition lists.

use serde::{Deserialize, Serialize};

/// Which list a candidate is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RepetitionKind {
    /// Chapter titles
    Title,
    /// First sentence of a chapter
    Opening,
    /// Closing hook of a chapter
    Cliffhanger,
}

/// Append-only lists of everything already used by a project.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepetitionLedger {
    /// Used chapter titles, oldest first
    pub titles: Vec<String>,
    /// Used opening sentences, oldest first
    pub openings: Vec<String>,
    /// Used cliffhanger lines, oldest first
    pub cliffhangers: Vec<String>,
}

impl RepetitionLedger {
    /// Entries of one kind.
    pub fn entries(&self, kind: RepetitionKind) -> &[String] {
        match kind {
            RepetitionKind::Title => &self.titles,
            RepetitionKind::Opening => &self.openings,
            RepetitionKind::Cliffhanger => &self.cliffhangers,
        }
    }

    /// Append an entry of one kind.
    pub fn push(&mut self, kind: RepetitionKind, entry: impl Into<String>) {
        let list = match kind {
            RepetitionKind::Title => &mut self.titles,
            RepetitionKind::Opening => &mut self.openings,
            RepetitionKind::Cliffhanger => &mut self.cliffhangers,
        };
        list.push(entry.into());
    }
}
