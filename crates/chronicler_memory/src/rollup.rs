//! Compression of closed arcs and volumes.

use chronicler_core::{
    ArcPlan, ArcSummary, CharacterDelta, CharacterLedger, GenerateRequest, StoryGraphNode,
    VolumeSummary, extraction, text,
};
use chronicler_interface::GenerationDriver;
use chronicler_models::GenerationClient;
use chronicler_plot::PlotState;
use serde::Deserialize;
use tracing::{info, instrument, warn};

const SUMMARIZER_SYSTEM: &str = "You are the archivist of a long-running serialized novel. \
You compress stretches of the story into summaries later chapters can rely on. \
Keep names, places and unresolved questions exact. Never invent events.";

const SUMMARY_WORDS: usize = 150;
const MAX_MILESTONES: usize = 8;

#[derive(Debug, Deserialize)]
struct RollupDraft {
    summary: String,
    #[serde(default)]
    milestones: Vec<String>,
}

/// Writes [`ArcSummary`] and [`VolumeSummary`] records.
///
/// Summarization never fails: when generation errors or returns something
/// unusable, the summary is built extractively from the material instead,
/// so closed ranges are always covered.
pub struct RollupSummarizer<D> {
    client: GenerationClient<D>,
    model: Option<String>,
}

impl<D> std::fmt::Debug for RollupSummarizer<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollupSummarizer")
            .field("model", &self.model)
            .finish()
    }
}

impl<D: GenerationDriver> RollupSummarizer<D> {
    /// Summarizer sharing `client`.
    pub fn new(client: GenerationClient<D>) -> Self {
        Self {
            client,
            model: None,
        }
    }

    /// Model override for summary calls.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Summarize a closed arc from the nodes of its chapters.
    ///
    /// Thread and character bookkeeping comes from `state`, not from the
    /// generated text.
    #[instrument(skip(self, nodes, state), fields(arc = arc.number, nodes = nodes.len()))]
    pub async fn summarize_arc(
        &self,
        arc: &ArcPlan,
        nodes: &[StoryGraphNode],
        state: &PlotState,
    ) -> ArcSummary {
        let material = nodes.iter().map(node_line).collect::<Vec<_>>().join("\n");
        let prompt = format!(
            "Summarize arc {} \"{}\" (chapters {}-{}).\nArc brief: {}\n\nChapter summaries:\n{}\n\n{}",
            arc.number,
            arc.title,
            arc.start_chapter,
            arc.end_chapter,
            if arc.brief.is_empty() { "(none)" } else { arc.brief.as_str() },
            material,
            RESPONSE_FORMAT
        );

        let (summary, milestones) = match self.generate(prompt).await {
            Some(draft) => draft,
            None => {
                warn!(arc = arc.number, "Arc summary generation failed; using extractive summary");
                extractive(
                    nodes.iter().map(|n| n.summary.as_str()),
                    nodes.iter().flat_map(|n| n.key_events.first()),
                )
            }
        };

        info!(arc = arc.number, "Arc summarized");
        ArcSummary {
            arc_number: arc.number,
            start_chapter: arc.start_chapter,
            end_chapter: arc.end_chapter,
            title: arc.title.clone(),
            summary,
            milestones,
            threads_introduced: state.introduced_between(arc.start_chapter, arc.end_chapter),
            threads_resolved: state.resolved_between(arc.start_chapter, arc.end_chapter),
            character_deltas: character_deltas(&state.characters, arc.start_chapter, arc.end_chapter),
        }
    }

    /// Summarize a closed volume.
    ///
    /// `arcs` are the arc summaries that lie inside the volume; `loose` holds
    /// nodes for the volume's chapters no arc in `arcs` covers. Material is
    /// presented in chapter order.
    #[instrument(skip(self, arcs, loose, state), fields(arcs = arcs.len(), loose = loose.len()))]
    pub async fn summarize_volume(
        &self,
        volume_number: u32,
        start_chapter: u32,
        end_chapter: u32,
        arcs: &[ArcSummary],
        loose: &[StoryGraphNode],
        state: &PlotState,
    ) -> VolumeSummary {
        let mut pieces: Vec<(u32, String, &str)> = arcs
            .iter()
            .map(|a| {
                (
                    a.start_chapter,
                    format!(
                        "Arc {} \"{}\" (chapters {}-{}): {}",
                        a.arc_number, a.title, a.start_chapter, a.end_chapter, a.summary
                    ),
                    a.summary.as_str(),
                )
            })
            .chain(loose.iter().map(|n| (n.chapter, node_line(n), n.summary.as_str())))
            .collect();
        pieces.sort_by_key(|(chapter, _, _)| *chapter);

        let material: Vec<&str> = pieces.iter().map(|(_, line, _)| line.as_str()).collect();
        let prompt = format!(
            "Summarize volume {} (chapters {}-{}).\n\nMaterial:\n{}\n\n{}",
            volume_number,
            start_chapter,
            end_chapter,
            material.join("\n"),
            RESPONSE_FORMAT
        );

        let (summary, milestones) = match self.generate(prompt).await {
            Some(draft) => draft,
            None => {
                warn!(volume = volume_number, "Volume summary generation failed; using extractive summary");
                extractive(
                    pieces.iter().map(|(_, _, summary)| *summary),
                    arcs.iter().flat_map(|a| a.milestones.first()),
                )
            }
        };

        info!(volume = volume_number, "Volume summarized");
        VolumeSummary {
            volume_number,
            start_chapter,
            end_chapter,
            summary,
            milestones,
            threads_introduced: state.introduced_between(start_chapter, end_chapter),
            threads_resolved: state.resolved_between(start_chapter, end_chapter),
            character_deltas: character_deltas(&state.characters, start_chapter, end_chapter),
        }
    }

    async fn generate(&self, prompt: String) -> Option<(String, Vec<String>)> {
        let request = GenerateRequest::new(SUMMARIZER_SYSTEM, prompt)
            .with_temperature(0.2)
            .with_max_output_tokens(1024)
            .with_model(self.model.clone());
        let response = match self.client.generate(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Summary call failed");
                return None;
            }
        };
        match extraction::parse_json::<RollupDraft>(&response.text) {
            Ok(draft) if !draft.summary.trim().is_empty() => Some((
                draft.summary.trim().to_string(),
                draft
                    .milestones
                    .into_iter()
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .take(MAX_MILESTONES)
                    .collect(),
            )),
            Ok(_) => {
                warn!("Summary response had an empty summary");
                None
            }
            Err(e) => {
                warn!(error = %e, "Summary response was not usable");
                None
            }
        }
    }
}

const RESPONSE_FORMAT: &str = "Respond with JSON only:\n\
{\"summary\": \"<at most 150 words>\", \"milestones\": [\"<turning point>\", ...]}";

fn node_line(node: &StoryGraphNode) -> String {
    format!("Chapter {} \"{}\": {}", node.chapter, node.title, node.summary)
}

fn extractive<'a>(
    summaries: impl Iterator<Item = &'a str>,
    events: impl Iterator<Item = &'a String>,
) -> (String, Vec<String>) {
    let gist = summaries
        .filter_map(text::first_sentence)
        .collect::<Vec<_>>()
        .join(" ");
    let milestones = events.take(MAX_MILESTONES).cloned().collect();
    (text::truncate_words(&gist, SUMMARY_WORDS), milestones)
}

/// Latest description of every character updated inside `start..=end`.
fn character_deltas(ledger: &CharacterLedger, start: u32, end: u32) -> Vec<CharacterDelta> {
    let mut deltas: Vec<CharacterDelta> = ledger
        .current()
        .into_iter()
        .filter_map(|latest| {
            let last_in_range = ledger
                .history(&latest.name)
                .filter(|s| s.chapter >= start && s.chapter <= end)
                .last()?;
            let described = last_in_range.describe();
            let change = described
                .strip_prefix(last_in_range.name.as_str())
                .unwrap_or(described.as_str())
                .trim_start_matches("; ")
                .to_string();
            Some(CharacterDelta {
                name: last_in_range.name.clone(),
                change: if change.is_empty() { "appears".to_string() } else { change },
            })
        })
        .collect();
    deltas.sort_by(|a, b| a.name.cmp(&b.name));
    deltas
}
