//! Style report types.

use serde::{Deserialize, Serialize};

/// One independently scored dimension of style.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StyleAxis {
    /// Density of low-information verbs
    WeakVerbs,
    /// Density of intensifiers and filler adverbs
    OverusedModifiers,
    /// Emotions named instead of dramatized
    TellNotShow,
    /// Ornate stock imagery
    PurpleProse,
    /// Share of sentences in the passive voice
    PassiveVoice,
    /// Spread of sentence lengths
    SentenceVariety,
    /// Long undramatized background passages
    ExpositionDump,
}

/// Byte range of an offending passage plus its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// The offending text, shortened for prompts
    pub excerpt: String,
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleIssue {
    /// Axis the issue belongs to
    pub axis: StyleAxis,
    /// What is wrong
    pub message: String,
    /// Where it is, when it has a location
    pub span: Option<TextSpan>,
}

impl StyleIssue {
    /// Issue text suitable for citing in a rewrite prompt.
    pub fn cite(&self) -> String {
        match &self.span {
            Some(span) => format!("{} (\"{}\")", self.message, span.excerpt),
            None => self.message.clone(),
        }
    }
}

/// Score and findings for one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisScore {
    /// Axis scored
    pub axis: StyleAxis,
    /// 0-100, higher is better
    pub score: f64,
    /// Findings, most significant first
    pub issues: Vec<StyleIssue>,
}

/// Full analysis of a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleReport {
    /// Mean of the axis scores, 0-100
    pub score: f64,
    /// Per-axis results
    pub axes: Vec<AxisScore>,
}

impl StyleReport {
    /// Result for one axis.
    pub fn axis(&self, axis: StyleAxis) -> Option<&AxisScore> {
        self.axes.iter().find(|a| a.axis == axis)
    }

    /// Lowest-scoring axis.
    pub fn weakest(&self) -> Option<&AxisScore> {
        self.axes
            .iter()
            .min_by(|a, b| a.score.total_cmp(&b.score))
    }

    /// Up to `limit` issues, taken from the weakest axes first.
    pub fn top_issues(&self, limit: usize) -> Vec<&StyleIssue> {
        let mut axes: Vec<&AxisScore> = self.axes.iter().collect();
        axes.sort_by(|a, b| a.score.total_cmp(&b.score));
        axes.into_iter()
            .filter(|a| a.score < 100.0)
            .flat_map(|a| a.issues.iter())
            .take(limit)
            .collect()
    }
}

/// Outcome of the cheap pre-check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickCheck {
    /// Whether every checked axis cleared its threshold
    pub passed: bool,
    /// The most significant finding, if any
    pub headline: Option<StyleIssue>,
}
