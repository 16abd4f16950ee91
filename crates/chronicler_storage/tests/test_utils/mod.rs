//! Fixtures shared by the repository tests.

#![allow(dead_code)]

use chronicler_core::{
    ArcSummary, ChapterCommit, ChapterRecord, CharacterState, PlotThread, Project,
    RepetitionLedger, StoryGraphNode,
};
use chronicler_error::ChroniclerResult;
use chronicler_interface::StoryRepository;

pub fn project(id: &str) -> Project {
    Project::builder()
        .id(id)
        .title("The Salt Road")
        .protagonist("Mira")
        .story_essence("A courier crosses a drowned empire.")
        .target_chapters(300u32)
        .build()
        .expect("valid project")
}

/// A commit for chapter `number` following `project`'s current chapter.
pub fn commit(project: &Project, number: u32) -> ChapterCommit {
    let mut next = project.clone();
    next.current_chapter = number;
    let mut repetition = RepetitionLedger::default();
    repetition.titles.push(format!("Title {}", number));
    ChapterCommit {
        project: next,
        chapter: ChapterRecord {
            project_id: project.id.clone(),
            number,
            title: format!("Title {}", number),
            body: format!("Body of chapter {}.", number),
            word_count: 4,
            critic_score: 80,
            critic_issues: vec![],
            attempts: 1,
            created_at: chrono::Utc::now(),
        },
        node: StoryGraphNode {
            project_id: project.id.clone(),
            chapter: number,
            title: format!("Title {}", number),
            summary: format!("Summary {}.", number),
            key_events: vec![],
            characters: vec![],
            open_threads: vec![],
            cliffhanger: String::new(),
        },
        arcs: vec![],
        threads: vec![PlotThread::open(format!("thread from {}", number), 5, number)],
        twists: vec![],
        character_snapshots: vec![CharacterState::new("Mira", number)],
        arc_summary: None,
        volume_summary: None,
        repetition,
    }
}

pub fn arc_summary(number: u32, start: u32, end: u32) -> ArcSummary {
    ArcSummary {
        arc_number: number,
        start_chapter: start,
        end_chapter: end,
        title: format!("Arc {}", number),
        summary: "Things happened.".into(),
        milestones: vec![],
        threads_introduced: vec![],
        threads_resolved: vec![],
        character_deltas: vec![],
    }
}

/// Commit chapters `1..=count` in order.
pub async fn commit_run<R: StoryRepository>(repo: &R, project: &Project, count: u32) -> ChroniclerResult<Project> {
    let mut current = project.clone();
    for number in 1..=count {
        let commit = commit(&current, number);
        repo.commit_chapter(&commit).await?;
        current = commit.project;
    }
    Ok(current)
}
