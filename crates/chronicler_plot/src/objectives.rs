//! Per-chapter objectives handed to the Architect.

use chronicler_core::ArcPlan;
use serde::{Deserialize, Serialize};

/// Position of a chapter inside its arc.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "title_case")]
pub enum ArcPhase {
    /// First fifth: establish stakes
    Setup,
    /// Up to 60%: escalate
    RisingAction,
    /// Up to 85%: force a turning point
    Crisis,
    /// Up to 95%: peak confrontation
    Climax,
    /// Remainder: consequences and the hook into the next arc
    Resolution,
}

impl ArcPhase {
    /// Phase for a position between 0.0 and 1.0.
    pub fn at(progress: f64) -> Self {
        if progress < 0.2 {
            Self::Setup
        } else if progress < 0.6 {
            Self::RisingAction
        } else if progress < 0.85 {
            Self::Crisis
        } else if progress < 0.95 {
            Self::Climax
        } else {
            Self::Resolution
        }
    }

    /// Standing instruction for chapters in this phase.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Setup => {
                "Establish the arc's central conflict and stakes; introduce or reintroduce the key players."
            }
            Self::RisingAction => {
                "Escalate the conflict: raise obstacles, complicate relationships, deny easy wins."
            }
            Self::Crisis => {
                "Force a turning point: a costly choice, a reversal, or a plan that fails."
            }
            Self::Climax => {
                "Stage the decisive confrontation of the arc; pay off what was set up."
            }
            Self::Resolution => {
                "Show the consequences of the climax and plant the hook for the next arc."
            }
        }
    }
}

/// One thing the next chapter must accomplish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum Objective {
    /// Reveal a scheduled twist
    #[display("Reveal: {}", description)]
    RevealTwist {
        /// Twist id
        twist_id: String,
        /// What is revealed
        description: String,
    },
    /// Follow the arc template
    #[display("{} phase: {}", phase, directive)]
    Phase {
        /// Current phase
        phase: ArcPhase,
        /// What the phase asks for
        directive: String,
    },
    /// Plant a hint for a later twist
    #[display("Foreshadow (subtly, without revealing): {}", description)]
    Foreshadow {
        /// Twist id
        twist_id: String,
        /// What will eventually be revealed
        description: String,
    },
    /// Move a high-priority thread forward
    #[display("Advance thread [{}] (priority {}): {}", thread_id, priority, description)]
    AdvanceThread {
        /// Thread id
        thread_id: String,
        /// What is unresolved
        description: String,
        /// Priority 1-10
        priority: u8,
    },
}

/// Everything the Architect is told about where the chapter sits in the plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterObjectives {
    /// Chapter being planned
    pub chapter: u32,
    /// Arc the chapter belongs to
    pub arc: ArcPlan,
    /// Phase inside the arc
    pub phase: ArcPhase,
    /// Objectives in priority order
    pub objectives: Vec<Objective>,
}

impl ChapterObjectives {
    /// Whether the chapter is the nominal end of its arc.
    pub fn closes_arc(&self) -> bool {
        self.chapter == self.arc.end_chapter
    }

    /// Objectives as a numbered list for prompts.
    pub fn render(&self) -> String {
        self.objectives
            .iter()
            .enumerate()
            .map(|(i, o)| format!("{}. {}", i + 1, o))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_boundaries() {
        assert_eq!(ArcPhase::at(0.0), ArcPhase::Setup);
        assert_eq!(ArcPhase::at(0.2), ArcPhase::RisingAction);
        assert_eq!(ArcPhase::at(0.6), ArcPhase::Crisis);
        assert_eq!(ArcPhase::at(0.9), ArcPhase::Climax);
        assert_eq!(ArcPhase::at(1.0), ArcPhase::Resolution);
    }

    #[test]
    fn test_objective_display() {
        let objective = Objective::AdvanceThread {
            thread_id: "thread-1".into(),
            description: "Who poisoned the well?".into(),
            priority: 8,
        };
        assert_eq!(
            objective.to_string(),
            "Advance thread [thread-1] (priority 8): Who poisoned the well?"
        );
        assert_eq!(ArcPhase::RisingAction.to_string(), "Rising Action");
    }
}
