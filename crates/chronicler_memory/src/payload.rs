//! The bounded context handed to the agents for one chapter.

use chronicler_core::{ArcSummary, CharacterState, PlotThread, StoryGraphNode, text};
use chronicler_plot::ChapterObjectives;
use serde::{Deserialize, Serialize};

/// A memory level that can fail to load independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContextLayer {
    /// Closed volume summaries
    Volumes,
    /// Closed arc summaries
    ArcSummaries,
    /// Recent story graph nodes
    RecentChapters,
    /// Character snapshots
    Characters,
    /// Plot threads
    Threads,
    /// Used titles
    TitleHistory,
}

/// One volume-level entry in a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeEntry {
    /// Volume number
    pub volume_number: u32,
    /// First chapter covered
    pub start_chapter: u32,
    /// Last chapter covered so far
    pub end_chapter: u32,
    /// Summary text, or a digest of closed arcs for the current volume
    pub summary: String,
    /// Relevance score; 1.0 for the current volume
    pub relevance: f64,
    /// Whether this is the in-progress volume
    pub current: bool,
}

/// Everything the agents know about the story when writing one chapter.
///
/// Each level is capped independently so the payload stays roughly the same
/// size at chapter 10 and chapter 1000.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPayload {
    /// Chapter being written
    pub chapter: u32,
    /// Premise, voice and world rules
    pub story_essence: String,
    /// Relevant closed volumes followed by the current-volume digest
    pub volumes: Vec<VolumeEntry>,
    /// Arc plan, phase and objectives
    pub objectives: ChapterObjectives,
    /// Closed arcs ending inside the current volume
    pub earlier_arcs: Vec<ArcSummary>,
    /// Most recent chapter nodes, oldest first
    pub recent_chapters: Vec<StoryGraphNode>,
    /// Character snapshots, protagonist first
    pub characters: Vec<CharacterState>,
    /// Open threads, highest priority first
    pub threads: Vec<PlotThread>,
    /// Recently used titles, newest first
    pub recent_titles: Vec<String>,
    /// Whether any layer failed to load
    pub degraded: bool,
    /// Layers that failed to load
    pub failed_layers: Vec<ContextLayer>,
}

impl ContextPayload {
    /// The payload as a prompt block, one section per level.
    ///
    /// Empty levels are left out.
    pub fn render(&self) -> String {
        let mut sections = Vec::new();

        if !self.story_essence.trim().is_empty() {
            sections.push(format!("## Story essence\n{}", self.story_essence.trim()));
        }

        if !self.volumes.is_empty() {
            let lines: Vec<String> = self
                .volumes
                .iter()
                .map(|v| {
                    let label = if v.current { " (in progress)" } else { "" };
                    format!(
                        "### Volume {}{}, chapters {}-{}\n{}",
                        v.volume_number, label, v.start_chapter, v.end_chapter, v.summary
                    )
                })
                .collect();
            sections.push(format!("## Story so far\n{}", lines.join("\n\n")));
        }

        let arc = &self.objectives.arc;
        let mut arc_section = format!(
            "## Current arc: {} (arc {}, chapters {}-{})\nPhase: {}",
            arc.title, arc.number, arc.start_chapter, arc.end_chapter, self.objectives.phase
        );
        if !arc.brief.trim().is_empty() {
            arc_section.push_str(&format!("\nBrief: {}", arc.brief.trim()));
        }
        arc_section.push_str(&format!(
            "\n\n### Objectives for chapter {}\n{}",
            self.chapter,
            self.objectives.render()
        ));
        sections.push(arc_section);

        if !self.earlier_arcs.is_empty() {
            let lines: Vec<String> = self
                .earlier_arcs
                .iter()
                .map(|a| format!("- Arc {} \"{}\": {}", a.arc_number, a.title, a.summary))
                .collect();
            sections.push(format!("## Earlier arcs this volume\n{}", lines.join("\n")));
        }

        if !self.recent_chapters.is_empty() {
            let lines: Vec<String> = self
                .recent_chapters
                .iter()
                .map(|n| {
                    let mut line = format!("### Chapter {}: {}\n{}", n.chapter, n.title, n.summary);
                    if !n.cliffhanger.trim().is_empty() {
                        line.push_str(&format!("\nEnded on: {}", n.cliffhanger.trim()));
                    }
                    line
                })
                .collect();
            sections.push(format!("## Recent chapters\n{}", lines.join("\n\n")));
        }

        if !self.characters.is_empty() {
            let lines: Vec<String> = self
                .characters
                .iter()
                .map(|c| format!("- {}", c.describe()))
                .collect();
            sections.push(format!("## Characters\n{}", lines.join("\n")));
        }

        if !self.threads.is_empty() {
            let lines: Vec<String> = self
                .threads
                .iter()
                .map(|t| format!("- [{}] (priority {}) {}", t.id, t.priority, t.description))
                .collect();
            sections.push(format!("## Open threads\n{}", lines.join("\n")));
        }

        if !self.recent_titles.is_empty() {
            sections.push(format!(
                "## Titles already used (do not reuse or imitate)\n{}",
                self.recent_titles.join("; ")
            ));
        }

        sections.join("\n\n")
    }

    /// Rough token count of [`render`](Self::render).
    pub fn approx_tokens(&self) -> u64 {
        text::estimate_tokens(&self.render())
    }
}
