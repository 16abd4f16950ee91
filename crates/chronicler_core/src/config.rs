//! Per-project configuration.
//!
//! Every parameter has a documented default so a project can be created from
//! nothing but a genre tag. Nothing here reads the environment; layering files
//! and environment variables on top is the facade crate's job.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Generation parameters for one project.
///
/// # Examples
///
/// ```
/// use chronicler_core::ProjectConfig;
///
/// let config = ProjectConfig::default()
///     .with_genre("fantasy".to_string())
///     .with_target_word_count(2800);
/// assert_eq!(*config.max_retries(), 3);
/// assert_eq!(config.min_word_count(), 2240);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct ProjectConfig {
    /// Model identifier; `None` uses the client default
    #[serde(default)]
    model: Option<String>,

    /// Genre tag resolved through the genre registry
    #[serde(default = "default_genre")]
    genre: String,

    /// Base sampling temperature for prose generation
    #[serde(default = "default_temperature")]
    temperature: f32,

    /// Target words per chapter
    #[serde(default = "default_target_word_count")]
    target_word_count: u32,

    /// Minimum critic score (0-100) for acceptance
    #[serde(default = "default_min_score")]
    min_score: u32,

    /// Maximum Writer invocations per chapter run
    #[serde(default = "default_max_retries")]
    max_retries: u32,

    /// Context assembly parameters
    #[serde(default)]
    memory: MemoryConfig,

    /// Arc planning parameters
    #[serde(default)]
    plot: PlotConfig,

    /// Quality gate and repair parameters
    #[serde(default)]
    refinement: RefinementConfig,

    /// Near-duplicate thresholds
    #[serde(default)]
    repetition: RepetitionConfig,
}

fn default_genre() -> String {
    "general".to_string()
}

fn default_temperature() -> f32 {
    0.8
}

fn default_target_word_count() -> u32 {
    2800
}

fn default_min_score() -> u32 {
    75
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            model: None,
            genre: default_genre(),
            temperature: default_temperature(),
            target_word_count: default_target_word_count(),
            min_score: default_min_score(),
            max_retries: default_max_retries(),
            memory: MemoryConfig::default(),
            plot: PlotConfig::default(),
            refinement: RefinementConfig::default(),
            repetition: RepetitionConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Word count a draft must reach before the expand pass is skipped.
    pub fn min_word_count(&self) -> usize {
        (self.target_word_count as f64 * self.refinement.min_word_ratio).ceil() as usize
    }
}

/// Weights for scoring how relevant a closed volume is to the next chapter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RelevanceWeights {
    /// Weight of overlap between volume threads and active threads
    #[serde(default = "default_thread_weight")]
    thread_overlap: f64,
    /// Weight of overlap between volume characters and active characters
    #[serde(default = "default_character_weight")]
    character_overlap: f64,
    /// Weight of closeness to the current volume
    #[serde(default = "default_proximity_weight")]
    proximity: f64,
    /// Fixed bonus granted to the first volume
    #[serde(default = "default_first_volume_weight")]
    first_volume: f64,
}

fn default_thread_weight() -> f64 {
    0.4
}

fn default_character_weight() -> f64 {
    0.3
}

fn default_proximity_weight() -> f64 {
    0.2
}

fn default_first_volume_weight() -> f64 {
    0.1
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            thread_overlap: default_thread_weight(),
            character_overlap: default_character_weight(),
            proximity: default_proximity_weight(),
            first_volume: default_first_volume_weight(),
        }
    }
}

/// Context assembly parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct MemoryConfig {
    /// Chapters per volume
    #[serde(default = "default_chapters_per_volume")]
    chapters_per_volume: u32,
    /// Hard cap on volume-level entries in a context payload
    #[serde(default = "default_max_volumes")]
    max_volumes_in_context: usize,
    /// Minimum relevance score for a closed volume to be included
    #[serde(default = "default_relevance_threshold")]
    volume_relevance_threshold: f64,
    /// Whether the in-progress volume is always represented
    #[serde(default = "default_true")]
    include_current_volume: bool,
    /// Relevance scoring weights
    #[serde(default)]
    relevance_weights: RelevanceWeights,
    /// Recent chapter nodes included while no volume summaries exist
    #[serde(default = "default_recent_max")]
    recent_chapters_max: usize,
    /// Floor for recent chapter nodes once volume summaries take over
    #[serde(default = "default_recent_min")]
    recent_chapters_min: usize,
    /// Character snapshots included
    #[serde(default = "default_max_characters")]
    max_characters: usize,
    /// Open threads included
    #[serde(default = "default_max_threads")]
    max_threads: usize,
    /// Recent titles listed as a negative constraint in prompts
    #[serde(default = "default_title_history")]
    title_history: usize,
}

fn default_chapters_per_volume() -> u32 {
    100
}

fn default_max_volumes() -> usize {
    3
}

fn default_relevance_threshold() -> f64 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_recent_max() -> usize {
    5
}

fn default_recent_min() -> usize {
    2
}

fn default_max_characters() -> usize {
    8
}

fn default_max_threads() -> usize {
    6
}

fn default_title_history() -> usize {
    50
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            chapters_per_volume: default_chapters_per_volume(),
            max_volumes_in_context: default_max_volumes(),
            volume_relevance_threshold: default_relevance_threshold(),
            include_current_volume: default_true(),
            relevance_weights: RelevanceWeights::default(),
            recent_chapters_max: default_recent_max(),
            recent_chapters_min: default_recent_min(),
            max_characters: default_max_characters(),
            max_threads: default_max_threads(),
            title_history: default_title_history(),
        }
    }
}

impl MemoryConfig {
    /// Volume number (1-based) that contains `chapter`.
    pub fn volume_of(&self, chapter: u32) -> u32 {
        let size = self.chapters_per_volume.max(1);
        (chapter.saturating_sub(1)) / size + 1
    }

    /// Inclusive chapter range covered by `volume`.
    pub fn volume_range(&self, volume: u32) -> (u32, u32) {
        let size = self.chapters_per_volume.max(1);
        let start = (volume.saturating_sub(1)) * size + 1;
        (start, start + size - 1)
    }
}

/// Arc planning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct PlotConfig {
    /// Nominal chapters per arc
    #[serde(default = "default_arc_length")]
    arc_length: u32,
    /// Chapters between unconditional character milestones
    #[serde(default = "default_milestone_cadence")]
    milestone_cadence: u32,
    /// Thread priority at or above which a thread must be advanced
    #[serde(default = "default_high_priority")]
    high_priority_threshold: u8,
    /// Maximum objectives handed to the Architect per chapter
    #[serde(default = "default_max_objectives")]
    max_objectives: usize,
}

fn default_arc_length() -> u32 {
    25
}

fn default_milestone_cadence() -> u32 {
    10
}

fn default_high_priority() -> u8 {
    7
}

fn default_max_objectives() -> usize {
    5
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            arc_length: default_arc_length(),
            milestone_cadence: default_milestone_cadence(),
            high_priority_threshold: default_high_priority(),
            max_objectives: default_max_objectives(),
        }
    }
}

impl PlotConfig {
    /// Arc number (1-based) that contains `chapter`.
    pub fn arc_of(&self, chapter: u32) -> u32 {
        let size = self.arc_length.max(1);
        (chapter.saturating_sub(1)) / size + 1
    }

    /// Inclusive nominal chapter range of `arc`.
    pub fn arc_range(&self, arc: u32) -> (u32, u32) {
        let size = self.arc_length.max(1);
        let start = (arc.saturating_sub(1)) * size + 1;
        (start, start + size - 1)
    }
}

/// Quality gate and repair parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RefinementConfig {
    /// Fraction of the target word count a draft must reach
    #[serde(default = "default_min_word_ratio")]
    min_word_ratio: f64,
    /// Repair cycles allowed after the first full pass
    #[serde(default = "default_extra_cycles")]
    extra_repair_cycles: u32,
    /// Temperature used for repair passes
    #[serde(default = "default_repair_temperature")]
    repair_temperature: f32,
}

fn default_min_word_ratio() -> f64 {
    0.8
}

fn default_extra_cycles() -> u32 {
    1
}

fn default_repair_temperature() -> f32 {
    0.6
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            min_word_ratio: default_min_word_ratio(),
            extra_repair_cycles: default_extra_cycles(),
            repair_temperature: default_repair_temperature(),
        }
    }
}

/// Similarity thresholds above which a candidate counts as a near-duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RepetitionConfig {
    /// Threshold for chapter titles
    #[serde(default = "default_title_similarity")]
    title_similarity: f64,
    /// Threshold for opening sentences
    #[serde(default = "default_line_similarity")]
    opening_similarity: f64,
    /// Threshold for cliffhanger lines
    #[serde(default = "default_line_similarity")]
    cliffhanger_similarity: f64,
}

fn default_title_similarity() -> f64 {
    0.8
}

fn default_line_similarity() -> f64 {
    0.7
}

impl Default for RepetitionConfig {
    fn default() -> Self {
        Self {
            title_similarity: default_title_similarity(),
            opening_similarity: default_line_similarity(),
            cliffhanger_similarity: default_line_similarity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_and_arc_ranges_tile() {
        let memory = MemoryConfig::default();
        assert_eq!(memory.volume_of(1), 1);
        assert_eq!(memory.volume_of(100), 1);
        assert_eq!(memory.volume_of(101), 2);
        assert_eq!(memory.volume_range(2), (101, 200));

        let plot = PlotConfig::default();
        assert_eq!(plot.arc_of(25), 1);
        assert_eq!(plot.arc_of(26), 2);
        assert_eq!(plot.arc_range(3), (51, 75));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ProjectConfig = toml::from_str(
            r#"
            genre = "fantasy"
            target_word_count = 3000

            [memory]
            max_volumes_in_context = 1
            "#,
        )
        .expect("valid config");

        assert_eq!(config.genre(), "fantasy");
        assert_eq!(*config.max_retries(), 3);
        assert_eq!(*config.memory().max_volumes_in_context(), 1);
        assert_eq!(*config.memory().recent_chapters_max(), 5);
        assert_eq!(*config.memory().relevance_weights().thread_overlap(), 0.4);
    }
}
