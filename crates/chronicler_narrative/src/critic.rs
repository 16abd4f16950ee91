//! Critic reviews.

use chronicler_core::extraction;
use chronicler_style::StyleReport;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// The Critic's verdict on one draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticReport {
    /// Overall score, 0-100
    #[serde(deserialize_with = "rounded_score")]
    pub score: u32,
    /// Problems found
    #[serde(default)]
    pub issues: Vec<String>,
    /// Whether the Critic demands a rewrite regardless of score
    #[serde(default)]
    pub rewrite_required: bool,
    /// What the next draft must change
    #[serde(default)]
    pub rewrite_instructions: String,
    /// Whether the report came from the style analyzer instead of the Critic
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl CriticReport {
    /// Parse a Critic response, clamping the score to 0-100.
    pub fn parse(response: &str) -> Option<Self> {
        match extraction::parse_json::<CriticReport>(response) {
            Ok(mut report) => {
                report.issues.retain(|i| !i.trim().is_empty());
                report.fallback = false;
                Some(report)
            }
            Err(e) => {
                warn!(error = %e, "Critic response was not usable");
                None
            }
        }
    }

    /// Report derived from the style analyzer when the Critic is unavailable.
    ///
    /// Never demands a rewrite on its own.
    pub fn from_style(style: &StyleReport) -> Self {
        Self {
            score: style.score.round().clamp(0.0, 100.0) as u32,
            issues: style.top_issues(5).iter().map(|i| i.cite()).collect(),
            rewrite_required: false,
            rewrite_instructions: String::new(),
            fallback: true,
        }
    }

    /// Whether the draft clears `min_score` without a forced rewrite.
    pub fn approves(&self, min_score: u32) -> bool {
        self.score >= min_score && !self.rewrite_required
    }
}

/// Accepts integer or fractional scores, rounded and clamped to 0-100.
fn rounded_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let score = f64::deserialize(deserializer)?;
    if score.is_nan() {
        return Ok(0);
    }
    Ok(score.round().clamp(0.0, 100.0) as u32)
}
