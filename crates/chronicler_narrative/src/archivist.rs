//! Structured analysis of accepted chapters.

use chronicler_core::{ChapterAnalysis, extraction, text};
use tracing::warn;

/// Parse an Archivist response.
///
/// Blank entries are dropped; `None` when the response is not usable.
pub(crate) fn parse(response: &str) -> Option<ChapterAnalysis> {
    match extraction::parse_json::<ChapterAnalysis>(response) {
        Ok(mut analysis) => {
            analysis.summary = analysis.summary.trim().to_string();
            analysis.key_events.retain(|e| !e.trim().is_empty());
            analysis.resolved_threads.retain(|t| !t.trim().is_empty());
            analysis.advanced_threads.retain(|t| !t.trim().is_empty());
            analysis.character_updates.retain(|c| !c.name.trim().is_empty());
            if analysis.summary.is_empty() {
                warn!("Archivist returned an empty summary");
                return None;
            }
            Some(analysis)
        }
        Err(e) => {
            warn!(error = %e, "Archivist response was not usable");
            None
        }
    }
}

/// Extractive analysis with no thread or character changes.
pub(crate) fn fallback(draft: &str) -> ChapterAnalysis {
    let gist = text::paragraphs(draft)
        .into_iter()
        .filter_map(text::first_sentence)
        .take(3)
        .collect::<Vec<_>>()
        .join(" ");
    ChapterAnalysis {
        summary: text::truncate_words(&gist, 80),
        ..ChapterAnalysis::default()
    }
}
