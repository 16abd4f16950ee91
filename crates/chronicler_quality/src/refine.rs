//! Bounded self-repair of drafts that fail the quality gate.

use crate::{CompositionAxis, GateReport, GateViolation, QualityGate, prompts};
use chronicler_core::{GenerateRequest, GenreProfile, RefinementConfig, text};
use chronicler_error::ChroniclerResult;
use chronicler_interface::GenerationDriver;
use chronicler_models::GenerationClient;
use chronicler_style::StyleAnalyzer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// A single rewrite pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::Display)]
pub enum RepairPass {
    /// Lengthen a short draft
    #[display("expand")]
    Expand,
    /// Add quoted speech
    #[display("add dialogue")]
    AddDialogue,
    /// Move one composition axis back into range
    #[display("rebalance {}", axis)]
    Rebalance {
        /// Axis named in the prompt
        axis: CompositionAxis,
    },
    /// Unconditional rhythm and phrasing pass
    #[display("fluency")]
    Fluency,
}

/// Bookkeeping for one pass that ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassRecord {
    /// Repair cycle, starting at 1
    pub cycle: u32,
    /// Pass that ran
    pub pass: RepairPass,
    /// Words before the pass
    pub words_before: usize,
    /// Words after the pass
    pub words_after: usize,
}

/// Result of refining one draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementOutcome {
    /// Final draft
    pub draft: String,
    /// Passes in the order they ran
    pub passes: Vec<PassRecord>,
    /// Gate report for the final draft
    pub report: GateReport,
}

impl RefinementOutcome {
    /// Whether the final draft passes the gate.
    pub fn passed(&self) -> bool {
        self.report.passed()
    }

    /// Whether an expand pass ran.
    pub fn expanded(&self) -> bool {
        self.passes.iter().any(|p| p.pass == RepairPass::Expand)
    }
}

/// Drives repair passes until the gate passes or the cycle cap is reached.
///
/// The first cycle walks the checks in order: expand when short, add
/// dialogue when speech is scarce, rebalance the worst composition axis,
/// then one fluency pass regardless. Each later cycle (up to
/// `extra_cycles`) runs only while the gate still fails: expand if still
/// short, otherwise rebalance, then fluency. The draft is accepted after the
/// last cycle whatever the gate says; the caller decides what a failing
/// report means.
pub struct RefinementLoop<D> {
    client: GenerationClient<D>,
    gate: QualityGate,
    style: StyleAnalyzer,
    extra_cycles: u32,
    temperature: f32,
    model: Option<String>,
}

impl<D> std::fmt::Debug for RefinementLoop<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefinementLoop")
            .field("gate", &self.gate)
            .field("extra_cycles", &self.extra_cycles)
            .field("temperature", &self.temperature)
            .field("model", &self.model)
            .finish()
    }
}

impl<D: GenerationDriver> RefinementLoop<D> {
    /// Create a loop with one extra cycle and temperature 0.6.
    pub fn new(client: GenerationClient<D>, gate: QualityGate, style: StyleAnalyzer) -> Self {
        let defaults = RefinementConfig::default();
        Self {
            client,
            gate,
            style,
            extra_cycles: *defaults.extra_repair_cycles(),
            temperature: *defaults.repair_temperature(),
            model: None,
        }
    }

    /// Apply cycle cap and temperature from a project's refinement config.
    pub fn configured(mut self, config: &RefinementConfig) -> Self {
        self.extra_cycles = *config.extra_repair_cycles();
        self.temperature = *config.repair_temperature();
        self
    }

    /// Model override for repair passes.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// The gate used for evaluation.
    pub fn gate(&self) -> &QualityGate {
        &self.gate
    }

    /// Refine `draft` toward `target_words` and the genre's composition.
    ///
    /// # Errors
    ///
    /// Propagates generation failures from any pass.
    #[instrument(skip(self, draft, genre), fields(genre = %genre.name(), words = text::word_count(&draft)))]
    pub async fn refine(
        &self,
        mut draft: String,
        target_words: u32,
        genre: &GenreProfile,
    ) -> ChroniclerResult<RefinementOutcome> {
        let mut passes = Vec::new();

        let mut report = self.gate.evaluate(&draft, target_words, genre);
        if report.is_short() {
            draft = self
                .run_pass(
                    &mut passes,
                    1,
                    RepairPass::Expand,
                    &draft,
                    &report,
                    target_words,
                    genre,
                )
                .await?;
            report = self.gate.evaluate(&draft, target_words, genre);
        }
        if report.lacks_dialogue() {
            draft = self
                .run_pass(
                    &mut passes,
                    1,
                    RepairPass::AddDialogue,
                    &draft,
                    &report,
                    target_words,
                    genre,
                )
                .await?;
            report = self.gate.evaluate(&draft, target_words, genre);
        }
        if let Some(axis) = worst_axis(&report) {
            draft = self
                .run_pass(
                    &mut passes,
                    1,
                    RepairPass::Rebalance { axis },
                    &draft,
                    &report,
                    target_words,
                    genre,
                )
                .await?;
            report = self.gate.evaluate(&draft, target_words, genre);
        }
        draft = self
            .run_pass(
                &mut passes,
                1,
                RepairPass::Fluency,
                &draft,
                &report,
                target_words,
                genre,
            )
            .await?;
        report = self.gate.evaluate(&draft, target_words, genre);

        for cycle in 2..=self.extra_cycles + 1 {
            if report.passed() {
                break;
            }
            let repair = if report.is_short() {
                Some(RepairPass::Expand)
            } else if let Some(axis) = worst_axis(&report) {
                Some(RepairPass::Rebalance { axis })
            } else if report.lacks_dialogue() {
                Some(RepairPass::AddDialogue)
            } else {
                None
            };
            if let Some(repair) = repair {
                draft = self
                    .run_pass(
                        &mut passes,
                        cycle,
                        repair,
                        &draft,
                        &report,
                        target_words,
                        genre,
                    )
                    .await?;
                report = self.gate.evaluate(&draft, target_words, genre);
            }
            draft = self
                .run_pass(
                    &mut passes,
                    cycle,
                    RepairPass::Fluency,
                    &draft,
                    &report,
                    target_words,
                    genre,
                )
                .await?;
            report = self.gate.evaluate(&draft, target_words, genre);
        }

        info!(
            passes = passes.len(),
            passed = report.passed(),
            words = report.words(),
            "Refinement finished"
        );
        Ok(RefinementOutcome {
            draft,
            passes,
            report,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_pass(
        &self,
        passes: &mut Vec<PassRecord>,
        cycle: u32,
        pass: RepairPass,
        draft: &str,
        report: &GateReport,
        target_words: u32,
        genre: &GenreProfile,
    ) -> ChroniclerResult<String> {
        let prompt = match &pass {
            RepairPass::Expand => prompts::expand(draft, report.words(), target_words, genre),
            RepairPass::AddDialogue => prompts::add_dialogue(
                draft,
                report.composition.dialogue_segments,
                *genre.min_dialogue_segments(),
                genre,
            ),
            RepairPass::Rebalance { .. } => {
                let violation = report
                    .worst_composition()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                prompts::rebalance(draft, &violation, &report.issues(), genre)
            }
            RepairPass::Fluency => {
                let headline = self.style.quick_check(draft).headline.map(|i| i.cite());
                prompts::fluency(draft, headline.as_deref())
            }
        };

        debug!(cycle, pass = %pass, "Running repair pass");
        let request = GenerateRequest::new(prompts::EDITOR_SYSTEM, prompt)
            .with_temperature(self.temperature)
            .with_max_output_tokens(output_budget(target_words))
            .with_model(self.model.clone());
        let response = self.client.generate(&request).await?;
        let revised = text::strip_fences(&response.text).to_string();

        passes.push(PassRecord {
            cycle,
            pass,
            words_before: report.words(),
            words_after: text::word_count(&revised),
        });
        Ok(revised)
    }
}

fn worst_axis(report: &GateReport) -> Option<CompositionAxis> {
    match report.worst_composition() {
        Some(GateViolation::CompositionOutOfRange { axis, .. }) => Some(*axis),
        _ => None,
    }
}

/// Output tokens allowed for a full chapter rewrite.
pub(crate) fn output_budget(target_words: u32) -> u32 {
    target_words.saturating_mul(2).max(1024)
}
