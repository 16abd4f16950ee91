//! Heuristic style scoring.

use crate::{AxisScore, QuickCheck, StyleAxis, StyleIssue, StyleLexicon, StyleReport, TextSpan};
use chronicler_core::text;
use chronicler_error::{ChroniclerResult, ConfigError};
use regex::Regex;
use tracing::{debug, instrument};

const MAX_ISSUES_PER_AXIS: usize = 5;
const EXCERPT_WORDS: usize = 12;
const EXPOSITION_MIN_WORDS: usize = 120;
const EXPOSITION_MIN_MARKERS: usize = 2;
const VARIETY_MIN_SENTENCES: usize = 4;
const VARIETY_LOW: f64 = 0.25;
const VARIETY_HIGH: f64 = 1.0;
const PASSIVE_TOLERANCE: f64 = 0.1;
const DEFAULT_QUICK_CHECK_THRESHOLD: f64 = 60.0;

/// Scores prose on independent style axes.
///
/// Regexes are compiled once from a [`StyleLexicon`]; analysis itself is pure
/// and synchronous.
///
/// # Examples
///
/// ```
/// use chronicler_style::{StyleAnalyzer, StyleAxis};
///
/// let analyzer = StyleAnalyzer::english()?;
/// let report = analyzer.analyze("She felt very angry. He was so sad.");
/// let tell = report.axis(StyleAxis::TellNotShow).unwrap();
/// assert!(tell.score < 50.0);
/// assert!(!tell.issues.is_empty());
/// # Ok::<(), chronicler_error::ChroniclerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct StyleAnalyzer {
    weak_verbs: Option<Regex>,
    modifiers: Option<Regex>,
    telling: Option<Regex>,
    purple: Option<Regex>,
    exposition: Option<Regex>,
    passive: Option<Regex>,
    quick_check_threshold: f64,
}

impl StyleAnalyzer {
    /// Compile an analyzer from a lexicon.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a lexicon entry produces an invalid
    /// pattern.
    pub fn new(lexicon: &StyleLexicon) -> ChroniclerResult<Self> {
        let telling = match (
            alternation(lexicon.telling_verbs()),
            alternation(lexicon.emotion_words()),
        ) {
            (Some(verbs), Some(emotions)) => Some(compile(&format!(
                r"(?i)\b(?:{verbs})\s+(?:(?:very|so|really|quite|deeply|more|a\s+little)\s+)?(?:{emotions})\b"
            ))?),
            _ => None,
        };
        let passive = match alternation(lexicon.passive_auxiliaries()) {
            Some(aux) => {
                let irregular = alternation(lexicon.irregular_participles())
                    .map(|p| format!("|{p}"))
                    .unwrap_or_default();
                Some(compile(&format!(
                    r"(?i)\b(?:{aux})\s+(?:\w+ly\s+)?(?:\w{{2,}}ed|\w{{3,}}en{irregular})\b"
                ))?)
            }
            None => None,
        };

        Ok(Self {
            weak_verbs: word_list(lexicon.weak_verbs())?,
            modifiers: word_list(lexicon.modifiers())?,
            telling,
            purple: word_list(lexicon.purple_phrases())?,
            exposition: word_list(lexicon.exposition_markers())?,
            passive,
            quick_check_threshold: DEFAULT_QUICK_CHECK_THRESHOLD,
        })
    }

    /// Analyzer over the default English lexicon.
    pub fn english() -> ChroniclerResult<Self> {
        Self::new(&StyleLexicon::default())
    }

    /// Minimum axis score `quick_check` accepts.
    pub fn with_quick_check_threshold(mut self, threshold: f64) -> Self {
        self.quick_check_threshold = threshold.clamp(0.0, 100.0);
        self
    }

    /// Score every axis and average them.
    #[instrument(skip_all, fields(words = text::word_count(draft)))]
    pub fn analyze(&self, draft: &str) -> StyleReport {
        let words = text::word_count(draft);
        let sentences = text::sentences(draft);

        let axes = vec![
            self.density_axis(
                draft,
                words,
                StyleAxis::WeakVerbs,
                self.weak_verbs.as_ref(),
                Density::new(40.0, 1.5),
                "weak verb",
            ),
            self.density_axis(
                draft,
                words,
                StyleAxis::OverusedModifiers,
                self.modifiers.as_ref(),
                Density::new(8.0, 4.0),
                "filler modifier",
            ),
            self.tell_not_show(draft, words),
            self.purple_prose(draft, words),
            self.passive_voice(draft, &sentences),
            sentence_variety(&sentences),
            self.exposition_dump(draft),
        ];

        let score = axes.iter().map(|a| a.score).sum::<f64>() / axes.len() as f64;
        debug!(score, "Style analysis complete");
        StyleReport { score, axes }
    }

    /// Cheap gate over tell-not-show, purple prose and exposition only.
    ///
    /// `passed` is true when every checked axis reaches the threshold; the
    /// headline is the first issue of the weakest checked axis.
    pub fn quick_check(&self, draft: &str) -> QuickCheck {
        let words = text::word_count(draft);
        let mut axes = [
            self.tell_not_show(draft, words),
            self.purple_prose(draft, words),
            self.exposition_dump(draft),
        ];
        let passed = axes.iter().all(|a| a.score >= self.quick_check_threshold);
        axes.sort_by(|a, b| a.score.total_cmp(&b.score));
        let headline = axes
            .iter_mut()
            .find(|a| !a.issues.is_empty())
            .map(|a| a.issues.remove(0));
        QuickCheck { passed, headline }
    }

    fn tell_not_show(&self, draft: &str, words: usize) -> AxisScore {
        self.density_axis(
            draft,
            words,
            StyleAxis::TellNotShow,
            self.telling.as_ref(),
            Density::new(1.0, 12.0),
            "emotion named rather than shown",
        )
    }

    fn purple_prose(&self, draft: &str, words: usize) -> AxisScore {
        self.density_axis(
            draft,
            words,
            StyleAxis::PurpleProse,
            self.purple.as_ref(),
            Density::new(0.5, 15.0),
            "stock ornate phrase",
        )
    }

    fn density_axis(
        &self,
        draft: &str,
        words: usize,
        axis: StyleAxis,
        pattern: Option<&Regex>,
        density: Density,
        label: &str,
    ) -> AxisScore {
        let Some(pattern) = pattern else {
            return AxisScore::clean(axis);
        };
        let hits: Vec<_> = pattern.find_iter(draft).collect();
        let score = density.score(hits.len(), words);
        let issues = if score < 100.0 {
            hits.iter()
                .take(MAX_ISSUES_PER_AXIS)
                .map(|m| StyleIssue {
                    axis,
                    message: label.to_string(),
                    span: Some(span(draft, m.start(), m.end())),
                })
                .collect()
        } else {
            Vec::new()
        };
        AxisScore { axis, score, issues }
    }

    fn passive_voice(&self, draft: &str, sentences: &[&str]) -> AxisScore {
        let axis = StyleAxis::PassiveVoice;
        let Some(pattern) = &self.passive else {
            return AxisScore::clean(axis);
        };
        if sentences.is_empty() {
            return AxisScore::clean(axis);
        }
        let passive: Vec<&str> = sentences
            .iter()
            .copied()
            .filter(|s| pattern.is_match(s))
            .collect();
        let ratio = passive.len() as f64 / sentences.len() as f64;
        let score = (100.0 - (ratio - PASSIVE_TOLERANCE).max(0.0) * 150.0).clamp(0.0, 100.0);
        let issues = if score < 100.0 {
            passive
                .iter()
                .take(MAX_ISSUES_PER_AXIS)
                .map(|s| {
                    let start = offset_in(draft, s);
                    StyleIssue {
                        axis,
                        message: "passive construction".to_string(),
                        span: Some(span(draft, start, start + s.len())),
                    }
                })
                .collect()
        } else {
            Vec::new()
        };
        AxisScore { axis, score, issues }
    }

    fn exposition_dump(&self, draft: &str) -> AxisScore {
        let axis = StyleAxis::ExpositionDump;
        let Some(markers) = &self.exposition else {
            return AxisScore::clean(axis);
        };
        let issues: Vec<StyleIssue> = text::paragraphs(draft)
            .into_iter()
            .filter(|p| text::word_count(p) >= EXPOSITION_MIN_WORDS)
            .filter(|p| !has_dialogue(p))
            .filter(|p| markers.find_iter(p).count() >= EXPOSITION_MIN_MARKERS)
            .map(|p| {
                let start = offset_in(draft, p);
                StyleIssue {
                    axis,
                    message: format!(
                        "{}-word background passage without dialogue or action",
                        text::word_count(p)
                    ),
                    span: Some(span(draft, start, start + p.len())),
                }
            })
            .collect();
        let score = (100.0 - 30.0 * issues.len() as f64).max(0.0);
        AxisScore {
            axis,
            score,
            issues: issues.into_iter().take(MAX_ISSUES_PER_AXIS).collect(),
        }
    }
}

impl AxisScore {
    fn clean(axis: StyleAxis) -> Self {
        Self {
            axis,
            score: 100.0,
            issues: Vec::new(),
        }
    }
}

/// Hits per thousand words tolerated before the score drops, and the points
/// lost per extra hit per thousand.
#[derive(Debug, Clone, Copy)]
struct Density {
    tolerance: f64,
    penalty: f64,
}

impl Density {
    fn new(tolerance: f64, penalty: f64) -> Self {
        Self { tolerance, penalty }
    }

    fn score(&self, hits: usize, words: usize) -> f64 {
        if words == 0 {
            return 100.0;
        }
        let per_thousand = hits as f64 * 1000.0 / words as f64;
        (100.0 - (per_thousand - self.tolerance).max(0.0) * self.penalty).clamp(0.0, 100.0)
    }
}

fn sentence_variety(sentences: &[&str]) -> AxisScore {
    let axis = StyleAxis::SentenceVariety;
    if sentences.len() < VARIETY_MIN_SENTENCES {
        return AxisScore::clean(axis);
    }
    let lengths: Vec<f64> = sentences
        .iter()
        .map(|s| text::word_count(s) as f64)
        .collect();
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    if mean == 0.0 {
        return AxisScore::clean(axis);
    }
    let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
    let variation = variance.sqrt() / mean;

    let (score, message) = if variation < VARIETY_LOW {
        (
            100.0 - (VARIETY_LOW - variation) * 300.0,
            Some(format!(
                "sentence lengths too uniform (variation {variation:.2}, mean {mean:.1} words)"
            )),
        )
    } else if variation > VARIETY_HIGH {
        (
            100.0 - (variation - VARIETY_HIGH) * 120.0,
            Some(format!(
                "sentence lengths too erratic (variation {variation:.2}, mean {mean:.1} words)"
            )),
        )
    } else {
        (100.0, None)
    };

    AxisScore {
        axis,
        score: score.clamp(0.0, 100.0),
        issues: message
            .map(|message| StyleIssue {
                axis,
                message,
                span: None,
            })
            .into_iter()
            .collect(),
    }
}

fn has_dialogue(paragraph: &str) -> bool {
    paragraph.contains('"') || paragraph.contains('\u{201C}') || paragraph.contains('\u{201D}')
}

fn span(draft: &str, start: usize, end: usize) -> TextSpan {
    TextSpan {
        start,
        end,
        excerpt: text::truncate_words(&draft[start..end], EXCERPT_WORDS),
    }
}

/// Byte offset of `part`, a subslice of `whole`.
fn offset_in(whole: &str, part: &str) -> usize {
    (part.as_ptr() as usize).saturating_sub(whole.as_ptr() as usize)
}

fn alternation(items: &[String]) -> Option<String> {
    let escaped: Vec<String> = items
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(|w| {
            w.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect();
    if escaped.is_empty() {
        None
    } else {
        Some(escaped.join("|"))
    }
}

fn word_list(items: &[String]) -> ChroniclerResult<Option<Regex>> {
    alternation(items)
        .map(|alt| compile(&format!(r"(?i)\b(?:{alt})\b")))
        .transpose()
}

fn compile(pattern: &str) -> ChroniclerResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| ConfigError::new(format!("invalid style lexicon pattern: {}", e)).into())
}
