//! Ordered structural checks on a draft.

use crate::{Composition, CompositionAxis, CompositionEstimator};
use chronicler_core::{GenreProfile, PercentRange};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// One failed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::Display)]
pub enum GateViolation {
    /// Fewer words than the floor
    #[display("draft has {} words, at least {} required", words, required)]
    TooShort {
        /// Words in the draft
        words: usize,
        /// Required minimum
        required: usize,
    },
    /// Fewer quoted-speech segments than the genre minimum
    #[display("draft has {} dialogue segments, at least {} required", segments, required)]
    TooLittleDialogue {
        /// Segments found
        segments: usize,
        /// Genre minimum
        required: usize,
    },
    /// A composition share outside the genre range
    #[display("{} is {:.0}% of the text, target {}", axis, actual, range)]
    CompositionOutOfRange {
        /// Axis out of range
        axis: CompositionAxis,
        /// Measured share
        actual: f64,
        /// Genre range
        range: PercentRange,
    },
}

/// Outcome of evaluating one draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateReport {
    /// Word floor applied
    pub required_words: usize,
    /// Estimated composition
    pub composition: Composition,
    /// Failed checks in check order
    pub violations: Vec<GateViolation>,
}

impl GateReport {
    /// Whether every check passed.
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Words in the evaluated draft.
    pub fn words(&self) -> usize {
        self.composition.words
    }

    /// Whether the draft is below the word floor.
    pub fn is_short(&self) -> bool {
        self.violations
            .iter()
            .any(|v| matches!(v, GateViolation::TooShort { .. }))
    }

    /// Whether the draft lacks dialogue segments.
    pub fn lacks_dialogue(&self) -> bool {
        self.violations
            .iter()
            .any(|v| matches!(v, GateViolation::TooLittleDialogue { .. }))
    }

    /// Composition violation furthest outside its range.
    pub fn worst_composition(&self) -> Option<&GateViolation> {
        self.violations
            .iter()
            .filter_map(|v| match v {
                GateViolation::CompositionOutOfRange { actual, range, .. } => {
                    Some((v, range.deviation(*actual).abs()))
                }
                _ => None,
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(v, _)| v)
    }

    /// Violations as human-readable lines.
    pub fn issues(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

/// Runs the length, dialogue and composition checks.
#[derive(Debug, Clone)]
pub struct QualityGate {
    estimator: CompositionEstimator,
    min_word_ratio: f64,
}

impl QualityGate {
    /// Gate requiring `min_word_ratio` of the target word count.
    pub fn new(estimator: CompositionEstimator, min_word_ratio: f64) -> Self {
        Self {
            estimator,
            min_word_ratio,
        }
    }

    /// Word floor for a target.
    pub fn required_words(&self, target_words: u32) -> usize {
        (target_words as f64 * self.min_word_ratio).ceil() as usize
    }

    /// Evaluate `draft` against a word target and a genre profile.
    #[instrument(skip(self, draft, genre), fields(genre = %genre.name()))]
    pub fn evaluate(&self, draft: &str, target_words: u32, genre: &GenreProfile) -> GateReport {
        let composition = self.estimator.estimate(draft);
        let required_words = self.required_words(target_words);
        let mut violations = Vec::new();

        if composition.words < required_words {
            violations.push(GateViolation::TooShort {
                words: composition.words,
                required: required_words,
            });
        }

        if composition.dialogue_segments < *genre.min_dialogue_segments() {
            violations.push(GateViolation::TooLittleDialogue {
                segments: composition.dialogue_segments,
                required: *genre.min_dialogue_segments(),
            });
        }

        for axis in [
            CompositionAxis::Dialogue,
            CompositionAxis::Description,
            CompositionAxis::Interior,
        ] {
            let range = axis.range(genre.composition());
            let actual = composition.share(axis);
            if !range.contains(actual) {
                violations.push(GateViolation::CompositionOutOfRange {
                    axis,
                    actual,
                    range,
                });
            }
        }

        debug!(
            words = composition.words,
            dialogue = composition.dialogue,
            interior = composition.interior,
            violations = violations.len(),
            "Quality gate evaluated"
        );
        GateReport {
            required_words,
            composition,
            violations,
        }
    }
}
