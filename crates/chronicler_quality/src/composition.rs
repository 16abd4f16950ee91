//! Estimating the dialogue / description / interior split of a draft.

use chronicler_core::{CompositionTargets, PercentRange, text};
use chronicler_error::{ChroniclerResult, ConfigError};
use regex::Regex;
use serde::{Deserialize, Serialize};

const DEFAULT_INTERIOR_MARKERS: &[&str] = &[
    "thought",
    "wondered",
    "realized",
    "remembered",
    "felt",
    "knew",
    "wished",
    "hoped",
    "feared",
    "suspected",
    "imagined",
    "decided",
    "worried",
    "doubted",
    "considered",
    "recalled",
];

/// One compositional axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CompositionAxis {
    /// Quoted speech
    Dialogue,
    /// Narration that is neither speech nor interiority
    Description,
    /// Thoughts and feelings
    Interior,
}

impl CompositionAxis {
    /// Target range for this axis.
    pub fn range(&self, targets: &CompositionTargets) -> PercentRange {
        match self {
            Self::Dialogue => targets.dialogue,
            Self::Description => targets.description,
            Self::Interior => targets.interior,
        }
    }
}

/// Estimated composition of a draft, as percentages of its words.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Composition {
    /// Words counted
    pub words: usize,
    /// Quoted-speech segments
    pub dialogue_segments: usize,
    /// Percentage of words inside quotes
    pub dialogue: f64,
    /// Percentage of words in plain narration
    pub description: f64,
    /// Percentage of words in sentences carrying thought markers
    pub interior: f64,
}

impl Composition {
    /// Percentage on one axis.
    pub fn share(&self, axis: CompositionAxis) -> f64 {
        match axis {
            CompositionAxis::Dialogue => self.dialogue,
            CompositionAxis::Description => self.description,
            CompositionAxis::Interior => self.interior,
        }
    }
}

/// Regex-based composition estimator.
///
/// Speech is any straight- or curly-quoted span. Narration sentences
/// containing a thought marker count as interior; the rest is description.
#[derive(Debug, Clone)]
pub struct CompositionEstimator {
    dialogue: Regex,
    interior: Regex,
}

impl CompositionEstimator {
    /// Estimator with the default English thought markers.
    pub fn new() -> ChroniclerResult<Self> {
        let markers: Vec<String> = DEFAULT_INTERIOR_MARKERS
            .iter()
            .map(|m| m.to_string())
            .collect();
        Self::with_interior_markers(&markers)
    }

    /// Estimator with custom thought markers.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `markers` is empty.
    pub fn with_interior_markers(markers: &[String]) -> ChroniclerResult<Self> {
        let alternation = markers
            .iter()
            .map(|m| regex::escape(m.trim()))
            .filter(|m| !m.is_empty())
            .collect::<Vec<_>>()
            .join("|");
        if alternation.is_empty() {
            return Err(ConfigError::new("interior markers must not be empty").into());
        }
        Ok(Self {
            dialogue: compile("\"[^\"]*\"|\u{201C}[^\u{201D}]*\u{201D}")?,
            interior: compile(&format!(r"(?i)\b(?:{alternation})\b"))?,
        })
    }

    /// Estimate the composition of `draft`.
    pub fn estimate(&self, draft: &str) -> Composition {
        let mut dialogue_words = 0;
        let mut dialogue_segments = 0;
        for quoted in self.dialogue.find_iter(draft) {
            let words = text::word_count(quoted.as_str().trim_matches(['"', '\u{201C}', '\u{201D}']));
            if words > 0 {
                dialogue_words += words;
                dialogue_segments += 1;
            }
        }

        let narration = self.dialogue.replace_all(draft, " ");
        let mut interior_words = 0;
        let mut narration_words = 0;
        for sentence in text::sentences(&narration) {
            let words = text::word_count(sentence);
            narration_words += words;
            if self.interior.is_match(sentence) {
                interior_words += words;
            }
        }

        let words = dialogue_words + narration_words;
        if words == 0 {
            return Composition::default();
        }
        let percent = |n: usize| n as f64 * 100.0 / words as f64;
        Composition {
            words,
            dialogue_segments,
            dialogue: percent(dialogue_words),
            description: percent(narration_words - interior_words),
            interior: percent(interior_words),
        }
    }
}

fn compile(pattern: &str) -> ChroniclerResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| ConfigError::new(format!("invalid composition pattern: {}", e)).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_by_speech_and_thought() {
        let estimator = CompositionEstimator::new().expect("default markers");
        let draft = "\"Hold the gate until dawn,\" Mira said. She wondered if the wall would hold. Rain drummed on the roofs.";
        let composition = estimator.estimate(draft);

        // 5 quoted, 7 interior, "Mira said." plus 5 words of description
        assert_eq!(composition.words, 19);
        assert_eq!(composition.dialogue_segments, 1);
        assert!((composition.dialogue - 5.0 * 100.0 / 19.0).abs() < 1e-9);
        assert!((composition.interior - 7.0 * 100.0 / 19.0).abs() < 1e-9);
        assert!((composition.description - 7.0 * 100.0 / 19.0).abs() < 1e-9);
    }

    #[test]
    fn test_curly_quotes_and_empty_text() {
        let estimator = CompositionEstimator::new().expect("default markers");
        let composition = estimator.estimate("\u{201C}Run,\u{201D} he said. \"\" The end.");
        assert_eq!(composition.dialogue_segments, 1);
        assert_eq!(estimator.estimate("   ").words, 0);
    }

    #[test]
    fn test_empty_markers_rejected() {
        assert!(CompositionEstimator::with_interior_markers(&[]).is_err());
    }
}
