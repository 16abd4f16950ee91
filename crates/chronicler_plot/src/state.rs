//! Snapshot of a project's plot state.

use chronicler_core::{ArcPlan, CharacterLedger, PlotThread, ThreadStatus, Twist, TwistStatus};
use serde::{Deserialize, Serialize};

/// Arcs, threads, twists and characters of one project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotState {
    /// Arc plans in arc order
    pub arcs: Vec<ArcPlan>,
    /// Every thread, resolved ones included
    pub threads: Vec<PlotThread>,
    /// Every twist, revealed ones included
    pub twists: Vec<Twist>,
    /// Character snapshot history
    pub characters: CharacterLedger,
}

impl PlotState {
    /// State assembled from persisted parts.
    pub fn new(
        arcs: Vec<ArcPlan>,
        threads: Vec<PlotThread>,
        twists: Vec<Twist>,
        characters: CharacterLedger,
    ) -> Self {
        Self {
            arcs,
            threads,
            twists,
            characters,
        }
    }

    /// Unresolved threads, highest priority first, least recently advanced
    /// first among equals.
    pub fn active_threads(&self) -> Vec<&PlotThread> {
        let mut active: Vec<&PlotThread> = self.threads.iter().filter(|t| t.is_active()).collect();
        active.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| staleness(a).cmp(&staleness(b)))
                .then_with(|| a.origin_chapter.cmp(&b.origin_chapter))
        });
        active
    }

    /// Thread by id.
    pub fn thread(&self, id: &str) -> Option<&PlotThread> {
        self.threads.iter().find(|t| t.id == id)
    }

    /// Ids of threads resolved inside `start..=end`.
    pub fn resolved_between(&self, start: u32, end: u32) -> Vec<String> {
        self.threads
            .iter()
            .filter(|t| t.status == ThreadStatus::Resolved)
            .filter(|t| t.resolution_chapter.is_some_and(|c| c >= start && c <= end))
            .map(|t| t.id.clone())
            .collect()
    }

    /// Ids of threads introduced inside `start..=end`.
    pub fn introduced_between(&self, start: u32, end: u32) -> Vec<String> {
        self.threads
            .iter()
            .filter(|t| t.origin_chapter >= start && t.origin_chapter <= end)
            .map(|t| t.id.clone())
            .collect()
    }

    /// Twists still waiting to be revealed.
    pub fn pending_twists(&self) -> impl Iterator<Item = &Twist> {
        self.twists.iter().filter(|t| t.status == TwistStatus::Pending)
    }
}

fn staleness(thread: &PlotThread) -> u32 {
    thread.last_advanced.unwrap_or(thread.origin_chapter)
}
