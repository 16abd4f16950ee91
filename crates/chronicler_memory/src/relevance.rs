//! Relevance scoring of closed volumes.

use chronicler_core::{RelevanceWeights, VolumeSummary};
use std::collections::HashSet;

/// Score how much a closed volume matters to a chapter in `current_volume`.
///
/// The score is a weighted sum of four terms:
///
/// - the share of the volume's threads that are still active;
/// - the share of the volume's changed characters that are still on stage;
/// - proximity, `1 / (current_volume - volume_number)`;
/// - a fixed bonus for the first volume, where the premise was laid down.
///
/// Volumes that are not closed yet (at or after `current_volume`) score 0.
///
/// # Examples
///
/// ```
/// use chronicler_core::{RelevanceWeights, VolumeSummary};
/// use chronicler_memory::volume_relevance;
/// use std::collections::HashSet;
///
/// let volume = VolumeSummary {
///     volume_number: 1,
///     start_chapter: 1,
///     end_chapter: 100,
///     summary: "The siege.".into(),
///     milestones: vec![],
///     threads_introduced: vec!["t1".into()],
///     threads_resolved: vec![],
///     character_deltas: vec![],
/// };
/// let active: HashSet<&str> = ["t1"].into_iter().collect();
/// let score = volume_relevance(&volume, 2, &active, &HashSet::new(), &RelevanceWeights::default());
/// assert!((score - 0.7).abs() < 1e-9);
/// ```
pub fn volume_relevance(
    volume: &VolumeSummary,
    current_volume: u32,
    active_threads: &HashSet<&str>,
    active_characters: &HashSet<&str>,
    weights: &RelevanceWeights,
) -> f64 {
    if volume.volume_number >= current_volume {
        return 0.0;
    }
    let threads: HashSet<&str> = volume.thread_ids().collect();
    let characters: HashSet<&str> = volume.character_names().collect();
    let distance = f64::from(current_volume - volume.volume_number);

    let mut score = weights.thread_overlap() * overlap(&threads, active_threads)
        + weights.character_overlap() * overlap(&characters, active_characters)
        + weights.proximity() / distance;
    if volume.volume_number == 1 {
        score += weights.first_volume();
    }
    score
}

fn overlap(own: &HashSet<&str>, active: &HashSet<&str>) -> f64 {
    if own.is_empty() {
        return 0.0;
    }
    own.intersection(active).count() as f64 / own.len() as f64
}
