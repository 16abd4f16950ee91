//! Committed chapters and their compressed memory.

use crate::CharacterState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A committed installment. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterRecord {
    /// Owning project
    pub project_id: String,
    /// Chapter number, contiguous from 1
    pub number: u32,
    /// Chapter title
    pub title: String,
    /// Chapter prose
    pub body: String,
    /// Words in `body`
    pub word_count: usize,
    /// Score the Critic gave the accepted draft
    pub critic_score: u32,
    /// Problems the Critic or the quality gate still saw in the accepted draft
    #[serde(default)]
    pub critic_issues: Vec<String>,
    /// Writer invocations the run needed
    pub attempts: u32,
    /// Commit timestamp
    pub created_at: DateTime<Utc>,
}

/// Per-chapter memory node used instead of re-reading the chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryGraphNode {
    /// Owning project
    pub project_id: String,
    /// Chapter this node summarizes
    pub chapter: u32,
    /// Chapter title
    pub title: String,
    /// Short prose summary
    pub summary: String,
    /// Events later chapters may need to reference
    #[serde(default)]
    pub key_events: Vec<String>,
    /// Character snapshots as of the end of the chapter
    #[serde(default)]
    pub characters: Vec<CharacterState>,
    /// Ids of threads still open at the end of the chapter
    #[serde(default)]
    pub open_threads: Vec<String>,
    /// Closing hook
    #[serde(default)]
    pub cliffhanger: String,
}

/// A thread introduced by a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewThread {
    /// What is unresolved
    pub description: String,
    /// Priority 1-10
    #[serde(default = "default_priority")]
    pub priority: u8,
}

fn default_priority() -> u8 {
    5
}

/// Observed change to one character.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterUpdate {
    /// Character name
    pub name: String,
    /// New power or level descriptor
    pub power_level: Option<String>,
    /// New health descriptor
    pub health: Option<String>,
    /// New emotional descriptor
    pub emotional_state: Option<String>,
    /// Relationship changes, keyed by the other character
    pub relationships: BTreeMap<String, String>,
    /// Abilities gained
    pub new_abilities: Vec<String>,
}

/// Structured analysis of an accepted chapter.
///
/// Plot state changes only through these explicit fields; nothing is
/// inferred from the prose.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterAnalysis {
    /// Short prose summary
    pub summary: String,
    /// Events later chapters may need to reference
    pub key_events: Vec<String>,
    /// Ids of threads this chapter resolved
    pub resolved_threads: Vec<String>,
    /// Ids of threads this chapter moved forward
    pub advanced_threads: Vec<String>,
    /// Threads this chapter opened
    pub new_threads: Vec<NewThread>,
    /// Character changes
    pub character_updates: Vec<CharacterUpdate>,
}
