//! The chapter state machine.

use crate::{AgentRole, ChapterOutline, CriticReport, ProjectLeases, StatusReporter, archivist, prompts};
use chronicler_core::{
    ArcPlan, ArcSummary, ChapterAnalysis, ChapterCommit, ChapterRecord, GenreProfile,
    GenreRegistry, Project, ProjectConfig, RepetitionKind, RunState, StoryGraphNode,
    TerminalStatus, VolumeSummary, extraction, text,
};
use chronicler_error::{ChroniclerError, ChroniclerResult, PipelineError, PipelineErrorKind};
use chronicler_interface::{GenerationDriver, StoryRepository};
use chronicler_memory::{ContextAssembler, ContextPayload, RepetitionTracker, RollupSummarizer};
use chronicler_models::GenerationClient;
use chronicler_plot::{ChapterObjectives, PlotManager, PlotState};
use chronicler_quality::{CompositionEstimator, QualityGate, RefinementLoop};
use chronicler_style::StyleAnalyzer;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Deserialize)]
struct ArcPlanDraft {
    title: String,
    #[serde(default)]
    brief: String,
}

/// A draft that cleared review.
struct Accepted {
    title: String,
    body: String,
    review: CriticReport,
    attempts: u32,
}

/// Produces chapters one run at a time.
///
/// A run walks Planning, Drafting, Validating and Reviewing, looping back to
/// Drafting on rejection, and either commits one chapter or fails. Nothing
/// but the run status is written before the final commit, so a failed or
/// cancelled run leaves no trace of the chapter.
///
/// Generation calls per run are bounded: at most two Architect calls for the
/// arc and one per outline, and per attempt one Writer call, the refinement
/// passes and one Critic call, then one Archivist call and up to two roll-up
/// calls.
pub struct ChapterOrchestrator<D, R> {
    client: GenerationClient<D>,
    repository: Arc<R>,
    assembler: ContextAssembler<R>,
    genres: GenreRegistry,
    style: StyleAnalyzer,
    estimator: CompositionEstimator,
    leases: ProjectLeases,
}

impl<D, R> std::fmt::Debug for ChapterOrchestrator<D, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChapterOrchestrator")
            .field("client", &self.client)
            .field("genres", &self.genres.tags().collect::<Vec<_>>())
            .field("leases", &self.leases)
            .finish_non_exhaustive()
    }
}

impl<D, R> ChapterOrchestrator<D, R>
where
    D: GenerationDriver,
    R: StoryRepository,
{
    /// Orchestrator with the bundled genres and the English style lexicon.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a bundled profile or lexicon fails
    /// to load.
    pub fn new(client: GenerationClient<D>, repository: Arc<R>) -> ChroniclerResult<Self> {
        Ok(Self {
            client,
            assembler: ContextAssembler::new(Arc::clone(&repository)),
            repository,
            genres: GenreRegistry::builtin()?,
            style: StyleAnalyzer::english()?,
            estimator: CompositionEstimator::new()?,
            leases: ProjectLeases::new(),
        })
    }

    /// Replace the genre registry.
    pub fn with_genres(mut self, genres: GenreRegistry) -> Self {
        self.genres = genres;
        self
    }

    /// Replace the style analyzer.
    pub fn with_style(mut self, style: StyleAnalyzer) -> Self {
        self.style = style;
        self
    }

    /// Share a lease registry with other orchestrators.
    pub fn with_leases(mut self, leases: ProjectLeases) -> Self {
        self.leases = leases;
        self
    }

    /// The lease registry in use.
    pub fn leases(&self) -> &ProjectLeases {
        &self.leases
    }

    /// The generation client in use.
    pub fn client(&self) -> &GenerationClient<D> {
        &self.client
    }

    /// Produce and commit the next chapter of a project.
    ///
    /// # Errors
    ///
    /// - `PipelineErrorKind::ProjectBusy` when another run holds the project
    /// - `PipelineErrorKind::TargetReached` when the project is complete
    /// - `PipelineErrorKind::QualityRejection` after `max_retries` rejected drafts
    /// - `PipelineErrorKind::InvalidOutline` when outlining fails twice
    /// - `PipelineErrorKind::Cancelled` when `cancel` fires
    /// - `StorageErrorKind::DuplicateCommit` when the chapter already exists
    /// - any generation or storage error that could not be recovered
    ///
    /// Every outcome except a busy lease ends with a terminal run status.
    #[instrument(skip(self, cancel))]
    pub async fn produce_next_chapter(
        &self,
        project_id: &str,
        cancel: &CancellationToken,
    ) -> ChroniclerResult<ChapterRecord> {
        let _lease = self.leases.acquire(project_id)?;
        let project = self.repository.load_project(project_id).await?;
        if project.is_complete() {
            return Err(PipelineError::new(PipelineErrorKind::TargetReached {
                project_id: project.id.clone(),
                target: project.target_chapters,
            })
            .into());
        }

        let chapter = project.next_chapter();
        let mut status = StatusReporter::new(Arc::clone(&self.repository), project_id, chapter);
        let result = self.run(&project, &mut status, cancel).await;

        match &result {
            Ok(record) => {
                info!(
                    chapter = record.number,
                    words = record.word_count,
                    score = record.critic_score,
                    attempts = record.attempts,
                    "Chapter accepted"
                );
                status.finish(TerminalStatus::Completed, None).await;
            }
            Err(e) if is_cancelled(e) => {
                info!(chapter, "Chapter run stopped");
                status.finish(TerminalStatus::Stopped, Some(e.to_string())).await;
            }
            Err(e) => {
                error!(chapter, error = %e, "Chapter run failed");
                status.finish(TerminalStatus::Failed, Some(e.to_string())).await;
            }
        }
        result
    }

    /// Produce up to `count` chapters in sequence.
    ///
    /// Stops early, without error, once the project reaches its target
    /// chapter count.
    ///
    /// # Errors
    ///
    /// Returns the first failure; chapters committed before it stay committed.
    #[instrument(skip(self, cancel))]
    pub async fn produce_chapters(
        &self,
        project_id: &str,
        count: u32,
        cancel: &CancellationToken,
    ) -> ChroniclerResult<Vec<ChapterRecord>> {
        let mut produced = Vec::new();
        for _ in 0..count {
            match self.produce_next_chapter(project_id, cancel).await {
                Ok(record) => produced.push(record),
                Err(e) if matches!(e.pipeline_kind(), Some(PipelineErrorKind::TargetReached { .. })) => {
                    info!(produced = produced.len(), "Target chapter count reached");
                    break;
                }
                Err(e) => {
                    warn!(produced = produced.len(), error = %e, "Batch stopped");
                    return Err(e);
                }
            }
        }
        Ok(produced)
    }

    async fn run(
        &self,
        project: &Project,
        status: &mut StatusReporter<R>,
        cancel: &CancellationToken,
    ) -> ChroniclerResult<ChapterRecord> {
        let config = &project.config;
        let chapter = project.next_chapter();
        let genre = self.genres.profile(project.genre())?;

        checkpoint(cancel, "planning")?;
        status.enter(RunState::Planning, "loading story state").await;
        let id = project.id.as_str();
        let repo = self.repository.as_ref();
        let (arcs, threads, twists, characters, repetition) = futures::try_join!(
            repo.list_arcs(id),
            repo.list_threads(id),
            repo.list_twists(id),
            repo.load_characters(id),
            repo.load_repetition(id),
        )?;
        let mut manager = PlotManager::new(
            config.plot().clone(),
            PlotState::new(arcs, threads, twists, characters),
        );
        let tracker = RepetitionTracker::new(config.repetition().clone(), repetition);

        let (arc, created) = manager.ensure_arc(chapter);
        if created {
            status.advance(8, "planning arc").await;
            if let Some(plan) = self.plan_arc(project, &arc).await {
                manager.update_arc_plan(arc.number, plan.title, plan.brief);
            }
        }
        let objectives = manager.chapter_objectives(chapter);

        status.advance(10, "assembling context").await;
        let payload = self.assembler.assemble(project, &objectives).await;
        if payload.degraded {
            warn!(failed = ?payload.failed_layers, "Writing with degraded context");
        }

        let accepted = self
            .draft_until_accepted(project, genre, &payload, &objectives, &tracker, status, cancel)
            .await?;

        checkpoint(cancel, "committing")?;
        status.advance(90, "archiving").await;
        let analysis = self
            .analyze(config, chapter, &accepted.title, &accepted.body, manager.state())
            .await;
        let update = manager.apply_chapter(chapter, &analysis);
        for rejected in &update.rejected {
            warn!(thread_id = %rejected.thread_id, reason = %rejected.reason, "Thread resolution refused");
        }

        let node = StoryGraphNode {
            project_id: project.id.clone(),
            chapter,
            title: accepted.title.clone(),
            summary: analysis.summary.clone(),
            key_events: analysis.key_events.clone(),
            characters: update.character_snapshots.clone(),
            open_threads: manager
                .state()
                .active_threads()
                .into_iter()
                .map(|t| t.id.clone())
                .collect(),
            cliffhanger: text::last_sentence(&accepted.body)
                .unwrap_or_default()
                .to_string(),
        };

        status.advance(95, "summarizing").await;
        let summarizer = RollupSummarizer::new(self.client.clone()).with_model(config.model().clone());
        let arc_summary = match &update.closed_arc {
            Some(arc) => Some(self.roll_up_arc(&summarizer, project, arc, &node, manager.state()).await),
            None => None,
        };
        let volume_summary = self
            .roll_up_volume(&summarizer, project, &node, arc_summary.as_ref(), manager.state())
            .await;

        let mut tracker = tracker;
        tracker.record(RepetitionKind::Title, &accepted.title);
        if let Some(opening) = text::first_sentence(&accepted.body) {
            tracker.record(RepetitionKind::Opening, opening);
        }
        tracker.record(RepetitionKind::Cliffhanger, &node.cliffhanger);

        let record = ChapterRecord {
            project_id: project.id.clone(),
            number: chapter,
            title: accepted.title,
            word_count: text::word_count(&accepted.body),
            body: accepted.body,
            critic_score: accepted.review.score,
            critic_issues: accepted.review.issues,
            attempts: accepted.attempts,
            created_at: Utc::now(),
        };

        let mut next = project.clone();
        next.current_chapter = chapter;
        next.status = status.status().clone();
        let state = manager.into_state();
        let commit = ChapterCommit {
            project: next,
            chapter: record.clone(),
            node,
            arcs: state.arcs,
            threads: state.threads,
            twists: state.twists,
            character_snapshots: update.character_snapshots,
            arc_summary,
            volume_summary,
            repetition: tracker.into_ledger(),
        };
        self.repository.commit_chapter(&commit).await?;
        Ok(record)
    }

    #[allow(clippy::too_many_arguments)]
    async fn draft_until_accepted(
        &self,
        project: &Project,
        genre: &GenreProfile,
        payload: &ContextPayload,
        objectives: &ChapterObjectives,
        tracker: &RepetitionTracker,
        status: &mut StatusReporter<R>,
        cancel: &CancellationToken,
    ) -> ChroniclerResult<Accepted> {
        let config = &project.config;
        let chapter = payload.chapter;
        let target = *config.target_word_count();
        let min_score = *config.min_score();
        let max_attempts = (*config.max_retries()).max(1);
        let gate = QualityGate::new(self.estimator.clone(), *config.refinement().min_word_ratio());
        let required_words = gate.required_words(target);

        let mut outline_failures = 0;
        let mut outline: Option<ChapterOutline> = None;
        let mut rejected_titles: Vec<String> = Vec::new();
        let mut notes: Vec<String> = Vec::new();
        let mut last_score = 0;

        for attempt in 1..=max_attempts {
            let plan = match outline.take() {
                Some(plan) => plan,
                None => {
                    checkpoint(cancel, "planning")?;
                    status.advance(15, "outlining").await;
                    self.plan_outline(config, payload, objectives, genre, &rejected_titles, &mut outline_failures)
                        .await?
                }
            };

            checkpoint(cancel, "drafting")?;
            status
                .enter(RunState::Drafting, format!("drafting attempt {}", attempt))
                .await;
            let request = AgentRole::Writer.request(
                config,
                prompts::writer(payload, &plan, genre, plan.target_word_count, &notes),
            );
            let response = self.client.generate(&request).await?;
            let draft = clean_draft(&response.text);

            checkpoint(cancel, "validating")?;
            status.enter(RunState::Validating, "quality gate").await;
            let refinement = RefinementLoop::new(self.client.clone(), gate.clone(), self.style.clone())
                .configured(config.refinement())
                .with_model(config.model().clone());
            let outcome = refinement.refine(draft, target, genre).await?;

            checkpoint(cancel, "reviewing")?;
            status.enter(RunState::Reviewing, "critic review").await;
            let mut findings = outcome.report.issues();
            findings.extend(
                self.style
                    .analyze(&outcome.draft)
                    .top_issues(3)
                    .iter()
                    .map(|i| i.cite()),
            );
            let mut review = self
                .review(config, chapter, &plan, &outcome.draft, genre, &findings)
                .await;
            if !outcome.passed() {
                for issue in outcome.report.issues() {
                    if !review.issues.contains(&issue) {
                        review.issues.push(issue);
                    }
                }
            }
            last_score = review.score;

            let mut reasons = Vec::new();
            if outcome.report.words() < required_words {
                reasons.push(format!(
                    "The chapter has only {} words; it must have at least {}.",
                    outcome.report.words(),
                    required_words
                ));
            }
            if !review.approves(min_score) {
                reasons.push(format!(
                    "The editor scored the chapter {} (minimum {}).",
                    review.score, min_score
                ));
                reasons.extend(review.issues.iter().cloned());
                if !review.rewrite_instructions.trim().is_empty() {
                    reasons.push(review.rewrite_instructions.trim().to_string());
                }
            }
            if let Some(opening) = text::first_sentence(&outcome.draft) {
                let verdict = tracker.check(RepetitionKind::Opening, opening);
                if let Some(earlier) = verdict.near_duplicate_of {
                    reasons.push(format!(
                        "Open the chapter differently; \"{}\" is too close to an earlier opening (\"{}\").",
                        opening, earlier
                    ));
                }
            }
            if let Some(ending) = text::last_sentence(&outcome.draft) {
                let verdict = tracker.check(RepetitionKind::Cliffhanger, ending);
                if let Some(earlier) = verdict.near_duplicate_of {
                    reasons.push(format!(
                        "End on a different hook; \"{}\" repeats an earlier ending (\"{}\").",
                        ending, earlier
                    ));
                }
            }
            let title_verdict = tracker.check(RepetitionKind::Title, &plan.title);

            if reasons.is_empty() && title_verdict.accepted {
                return Ok(Accepted {
                    title: plan.title,
                    body: outcome.draft,
                    review,
                    attempts: attempt,
                });
            }

            if let Some(earlier) = title_verdict.near_duplicate_of {
                info!(title = %plan.title, earlier = %earlier, "Title too close to an earlier one; replanning");
                rejected_titles.push(plan.title.clone());
                reasons.push(format!("The title \"{}\" repeats an earlier title.", plan.title));
            } else {
                outline = Some(plan);
            }
            warn!(attempt, score = review.score, reasons = reasons.len(), "Draft rejected");
            debug!(?reasons, "Rewrite notes");
            notes = reasons;
        }

        Err(PipelineError::new(PipelineErrorKind::QualityRejection {
            attempts: max_attempts,
            score: last_score,
            issues: notes,
        })
        .into())
    }

    async fn plan_arc(&self, project: &Project, arc: &ArcPlan) -> Option<ArcPlanDraft> {
        let earlier = match self.repository.list_arc_summaries(&project.id).await {
            Ok(summaries) => summaries,
            Err(e) => {
                warn!(error = %e, "Could not load earlier arcs for arc planning");
                Vec::new()
            }
        };
        let request = AgentRole::Architect.request(&project.config, prompts::arc_plan(project, arc, &earlier));
        let response = match self.client.generate(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(arc = arc.number, error = %e, "Arc planning failed; keeping the default plan");
                return None;
            }
        };
        match extraction::parse_json::<ArcPlanDraft>(&response.text) {
            Ok(plan) if !plan.title.trim().is_empty() => {
                info!(arc = arc.number, title = %plan.title, "Arc planned");
                Some(plan)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(arc = arc.number, error = %e, "Arc plan was not usable; keeping the default plan");
                None
            }
        }
    }

    async fn plan_outline(
        &self,
        config: &ProjectConfig,
        payload: &ContextPayload,
        objectives: &ChapterObjectives,
        genre: &GenreProfile,
        rejected_titles: &[String],
        failures: &mut u32,
    ) -> ChroniclerResult<ChapterOutline> {
        let target = *config.target_word_count();
        let mut prompt = prompts::outline(payload, genre, target);
        if !rejected_titles.is_empty() {
            prompt.push_str(&format!(
                "\nThese titles were rejected as repeats; choose something new: {}.",
                rejected_titles.join("; ")
            ));
        }
        let response = self
            .client
            .generate(&AgentRole::Architect.request(config, prompt))
            .await?;

        match ChapterOutline::parse(&response.text, target) {
            Ok(outline) => {
                debug!(title = %outline.title, scenes = outline.scenes.len(), "Outline ready");
                Ok(outline)
            }
            Err(e) if *failures == 0 => {
                *failures += 1;
                warn!(error = %e, "Outline unparseable; using the objective-based outline");
                let mut fallback = ChapterOutline::fallback(objectives, target);
                if !rejected_titles.is_empty() {
                    fallback.title = format!("{} ({})", fallback.title, rejected_titles.len() + 1);
                }
                Ok(fallback)
            }
            Err(e) => Err(e),
        }
    }

    async fn review(
        &self,
        config: &ProjectConfig,
        chapter: u32,
        outline: &ChapterOutline,
        draft: &str,
        genre: &GenreProfile,
        findings: &[String],
    ) -> CriticReport {
        let prompt = prompts::critic(chapter, outline, &outline.title, draft, genre, findings);
        let review = match self.client.generate(&AgentRole::Critic.request(config, prompt)).await {
            Ok(response) => CriticReport::parse(&response.text),
            Err(e) => {
                warn!(error = %e, "Critic call failed");
                None
            }
        };
        review.unwrap_or_else(|| {
            warn!("Scoring with the style analyzer instead of the Critic");
            CriticReport::from_style(&self.style.analyze(draft))
        })
    }

    async fn analyze(
        &self,
        config: &ProjectConfig,
        chapter: u32,
        title: &str,
        body: &str,
        state: &PlotState,
    ) -> ChapterAnalysis {
        let threads = state.active_threads();
        let prompt = prompts::archivist(chapter, title, body, &threads);
        let analysis = match self.client.generate(&AgentRole::Archivist.request(config, prompt)).await {
            Ok(response) => archivist::parse(&response.text),
            Err(e) => {
                warn!(error = %e, "Archivist call failed");
                None
            }
        };
        analysis.unwrap_or_else(|| {
            warn!(chapter, "Using extractive chapter analysis");
            archivist::fallback(body)
        })
    }

    async fn roll_up_arc(
        &self,
        summarizer: &RollupSummarizer<D>,
        project: &Project,
        arc: &ArcPlan,
        node: &StoryGraphNode,
        state: &PlotState,
    ) -> ArcSummary {
        let mut nodes = self
            .earlier_nodes(&project.id, arc.start_chapter, node.chapter)
            .await;
        nodes.push(node.clone());
        summarizer.summarize_arc(arc, &nodes, state).await
    }

    async fn roll_up_volume(
        &self,
        summarizer: &RollupSummarizer<D>,
        project: &Project,
        node: &StoryGraphNode,
        new_arc: Option<&ArcSummary>,
        state: &PlotState,
    ) -> Option<VolumeSummary> {
        let memory = project.config.memory();
        let chapter = node.chapter;
        let volume = memory.volume_of(chapter);
        let (start, end) = memory.volume_range(volume);
        if chapter != end {
            return None;
        }

        let mut arcs = match self.repository.list_arc_summaries(&project.id).await {
            Ok(arcs) => arcs,
            Err(e) => {
                warn!(error = %e, "Could not load arc summaries for the volume roll-up");
                Vec::new()
            }
        };
        arcs.extend(new_arc.cloned());
        arcs.retain(|a| a.start_chapter >= start && a.end_chapter <= chapter);

        // Chapters outside every kept arc: the tail of an arc begun in the
        // previous volume, and anything after the last arc to close.
        let covered = |n: u32| arcs.iter().any(|a| (a.start_chapter..=a.end_chapter).contains(&n));
        let mut loose = Vec::new();
        if (start..=chapter).any(|n| !covered(n)) {
            loose = self.earlier_nodes(&project.id, start, chapter).await;
            loose.push(node.clone());
            loose.retain(|n| !covered(n.chapter));
        }

        Some(
            summarizer
                .summarize_volume(volume, start, chapter, &arcs, &loose, state)
                .await,
        )
    }

    /// Nodes for `start..chapter`, empty when they cannot be loaded.
    async fn earlier_nodes(&self, project_id: &str, start: u32, chapter: u32) -> Vec<StoryGraphNode> {
        if start >= chapter {
            return Vec::new();
        }
        match self
            .repository
            .list_story_nodes(project_id, start..=chapter - 1)
            .await
        {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!(error = %e, "Could not load chapter nodes for a roll-up");
                Vec::new()
            }
        }
    }
}

fn checkpoint(cancel: &CancellationToken, phase: &str) -> ChroniclerResult<()> {
    if cancel.is_cancelled() {
        return Err(PipelineError::new(PipelineErrorKind::Cancelled(phase.to_string())).into());
    }
    Ok(())
}

fn is_cancelled(error: &ChroniclerError) -> bool {
    matches!(error.pipeline_kind(), Some(PipelineErrorKind::Cancelled(_)))
}

/// Writer output with fences and a leading markdown title removed.
fn clean_draft(output: &str) -> String {
    let body = text::strip_fences(output);
    let mut lines = body.lines().skip_while(|l| l.trim().is_empty()).peekable();
    if lines.peek().is_some_and(|l| l.trim_start().starts_with('#')) {
        lines.next();
    }
    lines.collect::<Vec<_>>().join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_draft_drops_heading() {
        assert_eq!(
            clean_draft("```\n# The Ferry\n\nMira waited.\n\nThe boat came.\n```"),
            "Mira waited.\n\nThe boat came."
        );
        assert_eq!(clean_draft("Mira waited."), "Mira waited.");
    }

    #[test]
    fn test_checkpoint_reports_phase() {
        let cancel = CancellationToken::new();
        assert!(checkpoint(&cancel, "drafting").is_ok());
        cancel.cancel();
        let err = checkpoint(&cancel, "drafting").unwrap_err();
        assert!(is_cancelled(&err));
        assert_eq!(
            err.pipeline_kind(),
            Some(&PipelineErrorKind::Cancelled("drafting".into()))
        );
    }
}
