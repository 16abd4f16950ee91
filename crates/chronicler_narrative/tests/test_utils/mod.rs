//! Role-aware scripted driver and fixtures for orchestrator tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chronicler_core::{
    ArcPlan, ArcStatus, ChapterCommit, ChapterRecord, GenerateRequest, GenerateResponse, Project,
    ProjectConfig, RepetitionLedger, StoryGraphNode, Usage,
};
use chronicler_error::{ChroniclerResult, GenerationError, GenerationErrorKind};
use chronicler_interface::{GenerationDriver, StoryRepository};
use chronicler_models::GenerationClient;
use chronicler_narrative::AgentRole;
use chronicler_rate_limit::{RateLimitConfig, RateLimiter, RetryPolicy};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

const DIALOGUE_LINE: &str = "\"Hold the gate until the bells ring again,\" Mira said.";
const INTERIOR_LINE: &str = "She wondered whether the old wall would hold through the night.";
const DESCRIPTION_LINE: &str = "Rain drummed on the slate roofs of the lower town below.";

const OPENINGS: &[&str] = &[
    "Fog swallowed the northern quay before anyone woke.",
    "Three lanterns burned above the customs hall until dawn.",
    "Snow buried every road leading toward Karth.",
    "The ferryman counted coins beside a cracked brazier.",
    "Gulls screamed over the flooded market square.",
    "Wind tore the sails from the last fishing boat.",
    "Bread smoke drifted through the tannery lanes at noon.",
    "Ice cracked along the canal walls overnight.",
    "A bishop knelt alone inside the ruined chapel.",
    "Horns sounded twice from the watchtower on Copper Hill.",
];

const ENDINGS: &[&str] = &[
    "Then the harbor bell began to toll.",
    "Somewhere below, a door slammed shut.",
    "A rider appeared on the eastern ridge.",
    "Nobody noticed the seal was already broken.",
    "Across the water, every light went out.",
    "Her brother's name was carved into the stone.",
    "The letter had been opened after all.",
    "Far off, drums answered from the marsh.",
    "Only a stranger knew which road she took.",
    "At midnight the river began to rise.",
];

const TITLES: &[&str] = &[
    "The Drowned Gate",
    "Salt in the Wound",
    "Lanterns Over Karth",
    "A Ferry for Ghosts",
    "Market of Gulls",
    "Copper Hill",
    "The Bishop's Silence",
    "Tanners and Thieves",
    "Ice on the Canal",
    "Drums in the Marsh",
];

pub const ARC_PLAN: &str = r#"{"title": "The Drowned Road", "brief": "Mira crosses the marsh to the capital."}"#;

/// A fantasy chapter of about 2300 words that passes the composition gate,
/// with an opening and ending unique to `variant`.
pub fn draft(variant: usize) -> String {
    let mut lines = vec![OPENINGS[variant % OPENINGS.len()]];
    lines.extend(std::iter::repeat_n(DIALOGUE_LINE, 110));
    lines.extend(std::iter::repeat_n(INTERIOR_LINE, 44));
    lines.extend(std::iter::repeat_n(DESCRIPTION_LINE, 64));
    lines.push(ENDINGS[variant % ENDINGS.len()]);
    lines.join("\n\n")
}

/// A chapter long enough to pass the word floor but made only of
/// description, so no repair pass can satisfy the composition gate.
pub fn flat_draft(variant: usize) -> String {
    let mut lines = vec![OPENINGS[variant % OPENINGS.len()]];
    lines.extend(std::iter::repeat_n(DESCRIPTION_LINE, 215));
    lines.push(ENDINGS[variant % ENDINGS.len()]);
    lines.join("\n\n")
}

pub fn outline(variant: usize) -> String {
    format!(
        r#"{{"title": "{}", "scenes": ["Mira reaches the quay", "The ferry will not sail"], "beats": ["Raise the stakes"], "cliffhanger": "The bell tolls."}}"#,
        TITLES[variant % TITLES.len()]
    )
}

pub fn critic(score: u32, issues: &[&str]) -> String {
    serde_json::json!({
        "score": score,
        "issues": issues,
        "rewrite_required": false,
        "rewrite_instructions": if issues.is_empty() { "" } else { "Tighten the middle scenes." },
    })
    .to_string()
}

pub const ARCHIVE: &str = r#"{"summary": "Mira reached the flooded quay and found the ferry gone.", "key_events": ["The ferry left without Mira"], "new_threads": [{"description": "Who ordered the ferry away?", "priority": 8}], "character_updates": [{"name": "Mira", "emotional_state": "uneasy"}]}"#;

/// Which caller a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Caller {
    ArcPlanner,
    Architect,
    Writer,
    Critic,
    Archivist,
    Editor,
    Summarizer,
}

fn caller_of(req: &GenerateRequest) -> Caller {
    let system = req.system_prompt.as_str();
    if system == AgentRole::Architect.system_prompt() {
        if req.prompt.contains("## Task\nPlan arc") {
            Caller::ArcPlanner
        } else {
            Caller::Architect
        }
    } else if system == AgentRole::Writer.system_prompt() {
        Caller::Writer
    } else if system == AgentRole::Critic.system_prompt() {
        Caller::Critic
    } else if system == AgentRole::Archivist.system_prompt() {
        Caller::Archivist
    } else if system.contains("revising one chapter") {
        Caller::Editor
    } else {
        Caller::Summarizer
    }
}

/// Driver with one reply queue per caller and sensible defaults once a
/// queue runs dry. The editor returns the latest Writer draft unchanged.
#[derive(Default)]
pub struct StoryDriver {
    scripts: Mutex<HashMap<Caller, VecDeque<String>>>,
    calls: Mutex<Vec<(Caller, String)>>,
    last_draft: Mutex<String>,
    counters: Mutex<HashMap<Caller, usize>>,
    cancel_after_writer: Option<CancellationToken>,
    failing: Vec<Caller>,
}

impl StoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue scripted replies for `caller`.
    pub fn script(self, caller: Caller, replies: Vec<String>) -> Self {
        self.scripts
            .lock()
            .expect("lock")
            .entry(caller)
            .or_default()
            .extend(replies);
        self
    }

    /// Cancel `token` as soon as the Writer has replied.
    pub fn cancel_after_writer(mut self, token: CancellationToken) -> Self {
        self.cancel_after_writer = Some(token);
        self
    }

    /// Fail every call from `caller`.
    pub fn failing(mut self, caller: Caller) -> Self {
        self.failing.push(caller);
        self
    }

    pub fn prompts(&self, caller: Caller) -> Vec<String> {
        self.calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|(c, _)| *c == caller)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn count(&self, caller: Caller) -> usize {
        self.prompts(caller).len()
    }

    fn default_reply(&self, caller: Caller, index: usize) -> String {
        match caller {
            Caller::ArcPlanner => ARC_PLAN.to_string(),
            Caller::Architect => outline(index),
            Caller::Writer => draft(index),
            Caller::Critic => critic(85, &[]),
            Caller::Archivist => ARCHIVE.to_string(),
            Caller::Editor => self.last_draft.lock().expect("lock").clone(),
            Caller::Summarizer => {
                r#"{"summary": "Mira crossed the marsh.", "milestones": ["The marsh crossed"]}"#.to_string()
            }
        }
    }
}

#[async_trait]
impl GenerationDriver for StoryDriver {
    async fn generate(&self, req: &GenerateRequest) -> ChroniclerResult<GenerateResponse> {
        let caller = caller_of(req);
        self.calls
            .lock()
            .expect("lock")
            .push((caller, req.prompt.clone()));
        if self.failing.contains(&caller) {
            return Err(GenerationError::new(GenerationErrorKind::InvalidInput(format!(
                "{:?} disabled",
                caller
            )))
            .into());
        }

        let index = {
            let mut counters = self.counters.lock().expect("lock");
            let counter = counters.entry(caller).or_default();
            *counter += 1;
            *counter - 1
        };
        let scripted = self
            .scripts
            .lock()
            .expect("lock")
            .get_mut(&caller)
            .and_then(VecDeque::pop_front);
        let text = scripted.unwrap_or_else(|| self.default_reply(caller, index));

        if caller == Caller::Writer {
            *self.last_draft.lock().expect("lock") = text.clone();
            if let Some(token) = &self.cancel_after_writer {
                token.cancel();
            }
        }
        Ok(GenerateResponse {
            text,
            usage: Usage::default(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "story"
    }

    fn model_name(&self) -> &str {
        "story-model"
    }
}

pub fn client(driver: StoryDriver) -> GenerationClient<StoryDriver> {
    let limiter = RateLimiter::new(&RateLimitConfig::default()).expect("valid limiter");
    GenerationClient::new(driver, limiter, RetryPolicy::default())
}

pub fn fantasy() -> ProjectConfig {
    ProjectConfig::default().with_genre("fantasy".to_string())
}

pub fn project(config: ProjectConfig) -> Project {
    Project::builder()
        .id("p1")
        .title("The Salt Road")
        .protagonist("Mira")
        .story_essence("A courier crosses a drowned empire carrying a letter no one may read.")
        .target_chapters(300u32)
        .config(config)
        .build()
        .expect("valid project")
}

/// Commit a placeholder chapter 1 carrying `arcs` and `repetition`.
pub async fn seed_first_chapter<R: StoryRepository>(
    repo: &R,
    project: &Project,
    repetition: RepetitionLedger,
) -> ChroniclerResult<Project> {
    repo.save_project(project).await?;
    let mut next = project.clone();
    next.current_chapter = 1;
    let commit = ChapterCommit {
        project: next.clone(),
        chapter: ChapterRecord {
            project_id: project.id.clone(),
            number: 1,
            title: "The First Crossing".into(),
            body: draft(4),
            word_count: 2300,
            critic_score: 80,
            critic_issues: vec![],
            attempts: 1,
            created_at: chrono::Utc::now(),
        },
        node: StoryGraphNode {
            project_id: project.id.clone(),
            chapter: 1,
            title: "The First Crossing".into(),
            summary: "Mira set out across the marsh.".into(),
            key_events: vec!["Mira left the capital".into()],
            characters: vec![],
            open_threads: vec![],
            cliffhanger: ENDINGS[4].into(),
        },
        arcs: vec![ArcPlan {
            number: 1,
            start_chapter: 1,
            end_chapter: 25,
            title: "The Drowned Road".into(),
            brief: String::new(),
            status: ArcStatus::Active,
        }],
        threads: vec![],
        twists: vec![],
        character_snapshots: vec![],
        arc_summary: None,
        volume_summary: None,
        repetition,
    };
    repo.commit_chapter(&commit).await?;
    Ok(next)
}
