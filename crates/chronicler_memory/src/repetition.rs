//! Near-duplicate detection for titles, openings and cliffhangers.

use chronicler_core::{RepetitionConfig, RepetitionKind, RepetitionLedger};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Outcome of checking one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionVerdict {
    /// Whether the candidate is sufficiently new
    pub accepted: bool,
    /// The most similar earlier entry when rejected
    pub near_duplicate_of: Option<String>,
    /// Similarity to the closest earlier entry, 0.0-1.0
    pub similarity: f64,
}

/// Token-set similarity of two strings after normalization.
///
/// Case and punctuation are ignored; the result is the Jaccard index of the
/// word sets. Strings equal after trimming and lowercasing always score 1.0,
/// even without words; blank strings score 0.0.
///
/// # Examples
///
/// ```
/// use chronicler_memory::similarity;
///
/// assert_eq!(similarity("The Iron Gate", "the iron gate!"), 1.0);
/// assert_eq!(similarity("...?!", " ...?! "), 1.0);
/// assert_eq!(similarity("Ashes", "Embers"), 0.0);
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (a.trim().to_lowercase(), b.trim().to_lowercase());
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    let left = tokens(&a);
    let right = tokens(&b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let union = left.union(&right).count();
    shared as f64 / union as f64
}

fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Append-only lists of used titles, openings and cliffhangers.
///
/// # Examples
///
/// ```
/// use chronicler_core::{RepetitionConfig, RepetitionKind, RepetitionLedger};
/// use chronicler_memory::RepetitionTracker;
///
/// let mut tracker = RepetitionTracker::new(RepetitionConfig::default(), RepetitionLedger::default());
/// assert!(tracker.check_and_record(RepetitionKind::Title, "The Salt Road").accepted);
/// assert!(!tracker.check_and_record(RepetitionKind::Title, "the salt road").accepted);
/// ```
#[derive(Debug, Clone)]
pub struct RepetitionTracker {
    config: RepetitionConfig,
    ledger: RepetitionLedger,
}

impl RepetitionTracker {
    /// Tracker over a persisted ledger.
    pub fn new(config: RepetitionConfig, ledger: RepetitionLedger) -> Self {
        Self { config, ledger }
    }

    /// The lists as they stand.
    pub fn ledger(&self) -> &RepetitionLedger {
        &self.ledger
    }

    /// Give up the tracker and keep its ledger.
    pub fn into_ledger(self) -> RepetitionLedger {
        self.ledger
    }

    fn threshold(&self, kind: RepetitionKind) -> f64 {
        match kind {
            RepetitionKind::Title => *self.config.title_similarity(),
            RepetitionKind::Opening => *self.config.opening_similarity(),
            RepetitionKind::Cliffhanger => *self.config.cliffhanger_similarity(),
        }
    }

    /// Compare `candidate` with every earlier entry without recording it.
    pub fn check(&self, kind: RepetitionKind, candidate: &str) -> RepetitionVerdict {
        let closest = self
            .ledger
            .entries(kind)
            .iter()
            .map(|entry| (entry, similarity(candidate, entry)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match closest {
            Some((entry, score)) if score >= self.threshold(kind) => {
                debug!(kind = %kind, candidate, duplicate_of = %entry, score, "Near-duplicate rejected");
                RepetitionVerdict {
                    accepted: false,
                    near_duplicate_of: Some(entry.clone()),
                    similarity: score,
                }
            }
            Some((_, score)) => RepetitionVerdict {
                accepted: true,
                near_duplicate_of: None,
                similarity: score,
            },
            None => RepetitionVerdict {
                accepted: true,
                near_duplicate_of: None,
                similarity: 0.0,
            },
        }
    }

    /// Check `candidate` and record it when accepted.
    pub fn check_and_record(&mut self, kind: RepetitionKind, candidate: &str) -> RepetitionVerdict {
        let verdict = self.check(kind, candidate);
        if verdict.accepted {
            self.record(kind, candidate);
        }
        verdict
    }

    /// Record an entry unconditionally; blank entries are ignored.
    pub fn record(&mut self, kind: RepetitionKind, entry: &str) {
        let entry = entry.trim();
        if !entry.is_empty() {
            self.ledger.push(kind, entry);
        }
    }

    /// Up to `limit` most recent titles, newest first.
    pub fn recent_titles(&self, limit: usize) -> Vec<String> {
        self.ledger
            .titles
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }
}
