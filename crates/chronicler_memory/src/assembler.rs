//! Assembly of the bounded per-chapter context.

use crate::{ContextLayer, ContextPayload, RepetitionTracker, VolumeEntry, volume_relevance};
use chronicler_core::{
    ArcSummary, CharacterLedger, CharacterState, MemoryConfig, PlotThread, Project, VolumeSummary,
    text,
};
use chronicler_error::ChroniclerResult;
use chronicler_interface::StoryRepository;
use chronicler_plot::ChapterObjectives;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Builds a [`ContextPayload`] from persisted memory.
///
/// Layers load concurrently. A layer that fails to load is logged, left empty
/// and named in the payload's `failed_layers`; the payload is still returned.
pub struct ContextAssembler<R> {
    repository: Arc<R>,
}

impl<R> Clone for ContextAssembler<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R> std::fmt::Debug for ContextAssembler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextAssembler").finish_non_exhaustive()
    }
}

impl<R: StoryRepository> ContextAssembler<R> {
    /// Assembler reading from `repository`.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Context for the chapter `objectives` were computed for.
    #[instrument(skip_all, fields(project_id = %project.id, chapter = objectives.chapter))]
    pub async fn assemble(&self, project: &Project, objectives: &ChapterObjectives) -> ContextPayload {
        let config = project.config.memory();
        let chapter = objectives.chapter;
        let current_volume = config.volume_of(chapter);
        let (volume_start, _) = config.volume_range(current_volume);
        let repo = &self.repository;

        // Nodes for the widest window; trimmed once the volume count is known.
        let widest = *config.recent_chapters_max() as u32;
        let recent_start = chapter.saturating_sub(widest).max(1);
        let recent_end = chapter.saturating_sub(1);

        let (volumes, arc_summaries, nodes, characters, threads, repetition) = tokio::join!(
            repo.list_volume_summaries(&project.id),
            repo.list_arc_summaries(&project.id),
            async {
                if recent_end == 0 {
                    Ok(Vec::new())
                } else {
                    repo.list_story_nodes(&project.id, recent_start..=recent_end).await
                }
            },
            repo.load_characters(&project.id),
            repo.list_threads(&project.id),
            repo.load_repetition(&project.id),
        );

        let mut failed = Vec::new();
        let volumes = loaded(volumes, ContextLayer::Volumes, &mut failed);
        let arc_summaries = loaded(arc_summaries, ContextLayer::ArcSummaries, &mut failed);
        let mut nodes = loaded(nodes, ContextLayer::RecentChapters, &mut failed);
        let ledger = loaded(characters, ContextLayer::Characters, &mut failed);
        let threads = loaded(threads, ContextLayer::Threads, &mut failed);
        let repetition = loaded(repetition, ContextLayer::TitleHistory, &mut failed);

        let characters = select_characters(&ledger, &project.protagonist, *config.max_characters());
        let active_ids: HashSet<&str> = threads
            .iter()
            .filter(|t| t.is_active())
            .map(|t| t.id.as_str())
            .collect();
        let threads = select_threads(&threads, *config.max_threads());

        let earlier_arcs: Vec<ArcSummary> = arc_summaries
            .into_iter()
            .filter(|a| a.end_chapter >= volume_start && a.end_chapter < chapter)
            .collect();

        let character_names: HashSet<&str> = characters.iter().map(|c| c.name.as_str()).collect();
        let mut entries = select_volumes(config, current_volume, &volumes, &active_ids, &character_names);
        let closed_included = entries.len();
        if *config.include_current_volume() && *config.max_volumes_in_context() > 0 {
            entries.push(VolumeEntry {
                volume_number: current_volume,
                start_chapter: volume_start,
                end_chapter: chapter.saturating_sub(1).max(volume_start),
                summary: volume_digest(&earlier_arcs, volume_start),
                relevance: 1.0,
                current: true,
            });
        }

        let keep = recent_window(config, closed_included);
        if nodes.len() > keep {
            nodes.drain(..nodes.len() - keep);
        }

        let payload = ContextPayload {
            chapter,
            story_essence: project.story_essence.clone(),
            volumes: entries,
            objectives: objectives.clone(),
            earlier_arcs,
            recent_chapters: nodes,
            characters,
            threads,
            recent_titles: RepetitionTracker::new(project.config.repetition().clone(), repetition)
                .recent_titles(*config.title_history()),
            degraded: !failed.is_empty(),
            failed_layers: failed,
        };
        debug!(
            volumes = payload.volumes.len(),
            recent = payload.recent_chapters.len(),
            degraded = payload.degraded,
            approx_tokens = payload.approx_tokens(),
            "Context assembled"
        );
        payload
    }
}

fn loaded<T: Default>(result: ChroniclerResult<T>, layer: ContextLayer, failed: &mut Vec<ContextLayer>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(layer = %layer, error = %e, "Context layer failed to load; continuing without it");
            failed.push(layer);
            T::default()
        }
    }
}

/// Number of recent chapter nodes to keep once `closed_volumes` summaries are
/// in the payload.
fn recent_window(config: &MemoryConfig, closed_volumes: usize) -> usize {
    let max = *config.recent_chapters_max();
    let min = (*config.recent_chapters_min()).min(max);
    max - closed_volumes.min(max - min)
}

fn select_volumes(
    config: &MemoryConfig,
    current_volume: u32,
    volumes: &[VolumeSummary],
    active_threads: &HashSet<&str>,
    active_characters: &HashSet<&str>,
) -> Vec<VolumeEntry> {
    let mut slots = *config.max_volumes_in_context();
    if *config.include_current_volume() {
        slots = slots.saturating_sub(1);
    }
    let threshold = *config.volume_relevance_threshold();

    let mut scored: Vec<VolumeEntry> = volumes
        .iter()
        .filter(|v| v.volume_number < current_volume)
        .map(|v| VolumeEntry {
            volume_number: v.volume_number,
            start_chapter: v.start_chapter,
            end_chapter: v.end_chapter,
            summary: v.summary.clone(),
            relevance: volume_relevance(
                v,
                current_volume,
                active_threads,
                active_characters,
                config.relevance_weights(),
            ),
            current: false,
        })
        .filter(|e| e.relevance >= threshold)
        .collect();
    scored.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    scored.truncate(slots);
    scored.sort_by_key(|e| e.volume_number);
    scored
}

fn select_characters(ledger: &CharacterLedger, protagonist: &str, limit: usize) -> Vec<CharacterState> {
    let mut current = ledger.current();
    if let Some(index) = current.iter().position(|c| c.name == protagonist) {
        let hero = current.remove(index);
        current.insert(0, hero);
    }
    current.into_iter().take(limit).cloned().collect()
}

fn select_threads(threads: &[PlotThread], limit: usize) -> Vec<PlotThread> {
    let mut active: Vec<&PlotThread> = threads.iter().filter(|t| t.is_active()).collect();
    active.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.origin_chapter.cmp(&b.origin_chapter))
    });
    active.into_iter().take(limit).cloned().collect()
}

fn volume_digest(arcs: &[ArcSummary], volume_start: u32) -> String {
    if arcs.is_empty() {
        return format!("Volume under way since chapter {}; no arc has closed yet.", volume_start);
    }
    arcs.iter()
        .map(|a| {
            let gist = text::first_sentence(&a.summary).unwrap_or(a.summary.as_str());
            format!("Arc {} \"{}\": {}", a.arc_number, a.title, text::truncate_words(gist, 40))
        })
        .collect::<Vec<_>>()
        .join(" ")
}
