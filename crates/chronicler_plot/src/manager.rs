//! The plot state machine.

use crate::{ArcPhase, ChapterObjectives, Objective, PlotState};
use chronicler_core::{
    ArcPlan, ArcStatus, ChapterAnalysis, CharacterState, PlotConfig, PlotThread, ThreadStatus,
    Twist, TwistKind, TwistStatus,
};
use chronicler_error::{ChroniclerResult, ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// A thread resolution that was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedResolution {
    /// Thread id named by the analysis
    pub thread_id: String,
    /// Why it was refused
    pub reason: String,
}

/// What applying one chapter changed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotUpdate {
    /// Threads resolved
    pub resolved: Vec<String>,
    /// Threads advanced
    pub advanced: Vec<String>,
    /// Threads opened
    pub opened: Vec<String>,
    /// Resolutions refused
    pub rejected: Vec<RejectedResolution>,
    /// Twists revealed
    pub revealed: Vec<String>,
    /// Character snapshots appended
    pub character_snapshots: Vec<CharacterState>,
    /// Arc closed by this chapter
    pub closed_arc: Option<ArcPlan>,
}

/// Owns and advances the plot state of one project.
///
/// Single writer: the orchestrator holds the project lease while a manager
/// is alive, and the resulting state is persisted only as part of a chapter
/// commit.
///
/// # Examples
///
/// ```
/// use chronicler_core::{ArcStatus, PlotConfig};
/// use chronicler_plot::{PlotManager, PlotState};
///
/// let mut manager = PlotManager::new(PlotConfig::default(), PlotState::default());
/// let objectives = manager.chapter_objectives(1);
///
/// assert_eq!(objectives.arc.number, 1);
/// assert_eq!(objectives.arc.end_chapter, 25);
/// assert_eq!(manager.state().arcs[0].status, ArcStatus::Active);
/// ```
#[derive(Debug, Clone)]
pub struct PlotManager {
    config: PlotConfig,
    state: PlotState,
}

impl PlotManager {
    /// Manager over existing state.
    pub fn new(config: PlotConfig, state: PlotState) -> Self {
        Self { config, state }
    }

    /// Current state.
    pub fn state(&self) -> &PlotState {
        &self.state
    }

    /// Give up the manager and keep its state.
    pub fn into_state(self) -> PlotState {
        self.state
    }

    /// Arc covering `chapter`, creating and activating it on first request.
    ///
    /// Returns the plan and whether it was just created.
    #[instrument(skip(self))]
    pub fn ensure_arc(&mut self, chapter: u32) -> (ArcPlan, bool) {
        let number = self.config.arc_of(chapter);
        let (index, created) = match self.state.arcs.iter().position(|a| a.number == number) {
            Some(index) => (index, false),
            None => {
                let (start_chapter, end_chapter) = self.config.arc_range(number);
                info!(arc = number, start_chapter, end_chapter, "Planning new arc");
                let index = self.state.arcs.partition_point(|a| a.number < number);
                self.state.arcs.insert(
                    index,
                    ArcPlan {
                        number,
                        start_chapter,
                        end_chapter,
                        title: format!("Arc {}", number),
                        brief: String::new(),
                        status: ArcStatus::Planned,
                    },
                );
                (index, true)
            }
        };

        let arc = &mut self.state.arcs[index];
        if arc.status == ArcStatus::Planned {
            debug!(arc = number, "Arc activated");
            arc.status = ArcStatus::Active;
        }
        (arc.clone(), created)
    }

    /// Replace the working title and brief of an arc.
    pub fn update_arc_plan(&mut self, number: u32, title: impl Into<String>, brief: impl Into<String>) {
        if let Some(arc) = self.state.arcs.iter_mut().find(|a| a.number == number) {
            arc.title = title.into();
            arc.brief = brief.into();
        }
    }

    /// Objectives for `chapter`, activating its arc if needed.
    ///
    /// Scheduled reveals always come first and are never truncated; the
    /// phase directive and foreshadowing follow, then high-priority threads
    /// fill the remaining `max_objectives` slots.
    #[instrument(skip(self))]
    pub fn chapter_objectives(&mut self, chapter: u32) -> ChapterObjectives {
        let (arc, _) = self.ensure_arc(chapter);
        let phase = ArcPhase::at(arc.progress(chapter));
        let mut objectives = Vec::new();

        for twist in self.state.pending_twists() {
            if twist.target_chapter == chapter {
                objectives.push(Objective::RevealTwist {
                    twist_id: twist.id.clone(),
                    description: twist.description.clone(),
                });
            }
        }
        objectives.push(Objective::Phase {
            phase,
            directive: phase.directive().to_string(),
        });
        for twist in self.state.pending_twists() {
            if twist.foreshadow_chapters.contains(&chapter) {
                objectives.push(Objective::Foreshadow {
                    twist_id: twist.id.clone(),
                    description: twist.description.clone(),
                });
            }
        }

        let room = self
            .config
            .max_objectives()
            .saturating_sub(objectives.len());
        let threshold = *self.config.high_priority_threshold();
        objectives.extend(
            self.state
                .active_threads()
                .into_iter()
                .filter(|t| t.priority >= threshold)
                .take(room)
                .map(|t| Objective::AdvanceThread {
                    thread_id: t.id.clone(),
                    description: t.description.clone(),
                    priority: t.priority,
                }),
        );

        ChapterObjectives {
            chapter,
            arc,
            phase,
            objectives,
        }
    }

    /// Apply the structured analysis of accepted `chapter`.
    #[instrument(skip(self, analysis), fields(resolved = analysis.resolved_threads.len(), new = analysis.new_threads.len()))]
    pub fn apply_chapter(&mut self, chapter: u32, analysis: &ChapterAnalysis) -> PlotUpdate {
        self.ensure_arc(chapter);
        let mut update = PlotUpdate::default();
        self.apply_threads(chapter, analysis, &mut update);
        self.reveal_twists(chapter, &mut update);
        self.apply_characters(chapter, analysis, &mut update);

        if let Some(arc) = self
            .state
            .arcs
            .iter_mut()
            .find(|a| a.end_chapter == chapter && a.status != ArcStatus::Completed)
        {
            info!(arc = arc.number, chapter, "Arc completed");
            arc.status = ArcStatus::Completed;
            update.closed_arc = Some(arc.clone());
        }
        update
    }

    fn apply_threads(&mut self, chapter: u32, analysis: &ChapterAnalysis, update: &mut PlotUpdate) {
        for id in &analysis.resolved_threads {
            let Some(thread) = self.state.threads.iter_mut().find(|t| &t.id == id) else {
                warn!(thread_id = %id, chapter, "Ignoring resolution of unknown thread");
                update.rejected.push(RejectedResolution {
                    thread_id: id.clone(),
                    reason: "unknown thread".to_string(),
                });
                continue;
            };
            if thread.origin_chapter > chapter {
                warn!(
                    thread_id = %id,
                    chapter,
                    origin = thread.origin_chapter,
                    "Ignoring resolution before the thread was introduced"
                );
                update.rejected.push(RejectedResolution {
                    thread_id: id.clone(),
                    reason: format!("introduced in chapter {}", thread.origin_chapter),
                });
                continue;
            }
            if thread.status == ThreadStatus::Resolved {
                update.rejected.push(RejectedResolution {
                    thread_id: id.clone(),
                    reason: "already resolved".to_string(),
                });
                continue;
            }
            thread.status = ThreadStatus::Resolved;
            thread.resolution_chapter = Some(chapter);
            update.resolved.push(id.clone());
        }

        for id in &analysis.advanced_threads {
            match self.state.threads.iter_mut().find(|t| &t.id == id) {
                Some(thread) if thread.is_active() && thread.origin_chapter <= chapter => {
                    thread.status = ThreadStatus::Developing;
                    thread.last_advanced = Some(chapter);
                    update.advanced.push(id.clone());
                }
                Some(_) => debug!(thread_id = %id, "Ignoring advance of inactive thread"),
                None => warn!(thread_id = %id, "Ignoring advance of unknown thread"),
            }
        }

        for new in &analysis.new_threads {
            if new.description.trim().is_empty() {
                continue;
            }
            let thread = PlotThread::open(new.description.trim(), new.priority, chapter);
            update.opened.push(thread.id.clone());
            self.state.threads.push(thread);
        }
    }

    fn reveal_twists(&mut self, chapter: u32, update: &mut PlotUpdate) {
        for twist in self
            .state
            .twists
            .iter_mut()
            .filter(|t| t.status == TwistStatus::Pending && t.target_chapter == chapter)
        {
            twist.status = TwistStatus::Revealed;
            twist.revealed_chapter = Some(chapter);
            update.revealed.push(twist.id.clone());
        }
    }

    fn apply_characters(&mut self, chapter: u32, analysis: &ChapterAnalysis, update: &mut PlotUpdate) {
        let cadence = *self.config.milestone_cadence();
        let on_cadence = cadence > 0 && chapter % cadence == 0;
        let mut touched = HashSet::new();

        for change in &analysis.character_updates {
            let name = change.name.trim();
            if name.is_empty() {
                continue;
            }
            let snapshot = match self.state.characters.latest(name) {
                Some(previous) => {
                    let mut next = previous.apply(change, chapter);
                    next.milestone = on_cadence || next.tracked_change_from(previous);
                    next
                }
                None => {
                    let mut first = CharacterState::new(name, chapter).apply(change, chapter);
                    first.milestone = on_cadence;
                    first
                }
            };
            touched.insert(name.to_string());
            update.character_snapshots.push(snapshot);
        }

        if on_cadence {
            let untouched: Vec<CharacterState> = self
                .state
                .characters
                .current()
                .into_iter()
                .filter(|s| !touched.contains(&s.name))
                .map(|s| CharacterState {
                    chapter,
                    milestone: true,
                    ..s.clone()
                })
                .collect();
            update.character_snapshots.extend(untouched);
        }

        for snapshot in &update.character_snapshots {
            self.state.characters.record(snapshot.clone());
        }
    }

    /// Register a thread outside the chapter flow.
    pub fn open_thread(&mut self, description: impl Into<String>, priority: u8, chapter: u32) -> PlotThread {
        let thread = PlotThread::open(description, priority, chapter);
        self.state.threads.push(thread.clone());
        thread
    }

    /// Schedule a twist for a future chapter.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the target chapter is not after
    /// `current_chapter` or a foreshadowing chapter is not before the target.
    pub fn schedule_twist(
        &mut self,
        description: impl Into<String>,
        kind: TwistKind,
        target_chapter: u32,
        mut foreshadow_chapters: Vec<u32>,
        current_chapter: u32,
    ) -> ChroniclerResult<Twist> {
        if target_chapter <= current_chapter {
            return Err(ConfigError::new(format!(
                "twist target chapter {} must come after chapter {}",
                target_chapter, current_chapter
            ))
            .into());
        }
        if let Some(bad) = foreshadow_chapters
            .iter()
            .find(|&&c| c >= target_chapter || c <= current_chapter)
        {
            return Err(ConfigError::new(format!(
                "foreshadowing chapter {} must fall between chapter {} and the reveal in chapter {}",
                bad, current_chapter, target_chapter
            ))
            .into());
        }
        foreshadow_chapters.sort_unstable();
        foreshadow_chapters.dedup();

        let twist = Twist::planned(description, kind, target_chapter, foreshadow_chapters);
        info!(twist_id = %twist.id, target_chapter, "Twist scheduled");
        self.state.twists.push(twist.clone());
        Ok(twist)
    }
}
