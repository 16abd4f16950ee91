//! Context assembly over committed story memory.

mod test_utils;

use chronicler_core::{ArcSummary, CharacterState, MemoryConfig, PlotThread, ProjectConfig};
use chronicler_memory::{ContextAssembler, ContextLayer};
use chronicler_plot::{PlotManager, PlotState};
use chronicler_storage::InMemoryStoryRepository;
use std::sync::Arc;
use test_utils::{FlakyRepository, project, seed, volume_summary};

fn objectives(config: &ProjectConfig, chapter: u32) -> chronicler_plot::ChapterObjectives {
    PlotManager::new(config.plot().clone(), PlotState::default()).chapter_objectives(chapter)
}

fn with_memory(memory: MemoryConfig) -> ProjectConfig {
    ProjectConfig::default().with_memory(memory)
}

#[tokio::test]
async fn test_first_chapter_has_essence_and_no_history() -> anyhow::Result<()> {
    let repo = Arc::new(InMemoryStoryRepository::new());
    let config = ProjectConfig::default();
    let p = seed(repo.as_ref(), &project(config.clone()), 0, |_| {}).await?;

    let payload = ContextAssembler::new(repo).assemble(&p, &objectives(&config, 1)).await;

    assert!(!payload.degraded);
    assert!(payload.recent_chapters.is_empty());
    assert_eq!(payload.volumes.len(), 1);
    assert!(payload.volumes[0].current);
    let rendered = payload.render();
    assert!(rendered.starts_with("## Story essence\nA courier crosses"));
    assert!(rendered.contains("### Objectives for chapter 1"));
    Ok(())
}

#[tokio::test]
async fn test_recent_window_at_maximum_before_any_volume_closes() -> anyhow::Result<()> {
    let repo = Arc::new(InMemoryStoryRepository::new());
    let config = ProjectConfig::default();
    let p = seed(repo.as_ref(), &project(config.clone()), 7, |_| {}).await?;

    let payload = ContextAssembler::new(repo).assemble(&p, &objectives(&config, 8)).await;

    let chapters: Vec<u32> = payload.recent_chapters.iter().map(|n| n.chapter).collect();
    assert_eq!(chapters, vec![3, 4, 5, 6, 7]);
    Ok(())
}

#[tokio::test]
async fn test_relevant_volumes_replace_recent_chapters() -> anyhow::Result<()> {
    let repo = Arc::new(InMemoryStoryRepository::new());
    let config = with_memory(
        MemoryConfig::default()
            .with_chapters_per_volume(3)
            .with_volume_relevance_threshold(0.15),
    );
    let p = seed(repo.as_ref(), &project(config.clone()), 9, |commit| {
        let n = commit.chapter.number;
        if n % 3 == 0 {
            commit.volume_summary = Some(volume_summary(n / 3, n - 2, n));
        }
    })
    .await?;

    let payload = ContextAssembler::new(repo).assemble(&p, &objectives(&config, 10)).await;

    // volume 2 scores 0.1, under the threshold; volumes 1 and 3 fill the two
    // closed-volume slots and the in-progress volume takes the third
    let volumes: Vec<(u32, bool)> = payload
        .volumes
        .iter()
        .map(|v| (v.volume_number, v.current))
        .collect();
    assert_eq!(volumes, vec![(1, false), (3, false), (4, true)]);

    let chapters: Vec<u32> = payload.recent_chapters.iter().map(|n| n.chapter).collect();
    assert_eq!(chapters, vec![7, 8, 9]);
    Ok(())
}

#[tokio::test]
async fn test_volume_cap_counts_current_volume() -> anyhow::Result<()> {
    let repo = Arc::new(InMemoryStoryRepository::new());
    let config = with_memory(
        MemoryConfig::default()
            .with_chapters_per_volume(3)
            .with_volume_relevance_threshold(0.0)
            .with_max_volumes_in_context(1),
    );
    let p = seed(repo.as_ref(), &project(config.clone()), 6, |commit| {
        let n = commit.chapter.number;
        if n % 3 == 0 {
            commit.volume_summary = Some(volume_summary(n / 3, n - 2, n));
        }
    })
    .await?;

    let payload = ContextAssembler::new(repo).assemble(&p, &objectives(&config, 7)).await;

    assert_eq!(payload.volumes.len(), 1);
    assert!(payload.volumes[0].current);
    assert_eq!(payload.recent_chapters.len(), 5);
    Ok(())
}

#[tokio::test]
async fn test_arc_straddling_volume_start_stays_in_context() -> anyhow::Result<()> {
    let repo = Arc::new(InMemoryStoryRepository::new());
    let config = with_memory(MemoryConfig::default().with_chapters_per_volume(5));
    let p = seed(repo.as_ref(), &project(config.clone()), 8, |commit| {
        let n = commit.chapter.number;
        if n % 3 == 0 {
            commit.arc_summary = Some(ArcSummary {
                arc_number: n / 3,
                start_chapter: n - 2,
                end_chapter: n,
                title: format!("Arc title {}", n / 3),
                summary: format!("Arc {} closes.", n / 3),
                milestones: vec![],
                threads_introduced: vec![],
                threads_resolved: vec![],
                character_deltas: vec![],
            });
        }
    })
    .await?;

    let payload = ContextAssembler::new(repo).assemble(&p, &objectives(&config, 9)).await;

    // arc 2 spans chapters 4-6 and ends inside volume 2 (chapters 6-10)
    let arcs: Vec<u32> = payload.earlier_arcs.iter().map(|a| a.arc_number).collect();
    assert_eq!(arcs, vec![2]);
    let current = payload.volumes.iter().find(|v| v.current).expect("current volume");
    assert!(current.summary.contains("Arc 2 \"Arc title 2\""));
    Ok(())
}

#[tokio::test]
async fn test_characters_threads_and_titles() -> anyhow::Result<()> {
    let repo = Arc::new(InMemoryStoryRepository::new());
    let config = with_memory(MemoryConfig::default().with_max_characters(2).with_max_threads(2));
    let p = seed(repo.as_ref(), &project(config.clone()), 3, |commit| {
        let n = commit.chapter.number;
        commit.repetition.titles = (1..=n).map(|i| format!("Chapter title {}", i)).collect();
        if n == 3 {
            commit.character_snapshots = vec![
                CharacterState::new("Oren", 3),
                CharacterState::new("Tash", 3),
                CharacterState::new("Mira", 1),
            ];
            commit.threads = vec![
                PlotThread::open("Who flooded the archive?", 4, 1),
                PlotThread::open("What does the letter say?", 9, 1),
                PlotThread::open("Where is the ferryman?", 6, 2),
            ];
        }
    })
    .await?;

    let payload = ContextAssembler::new(repo).assemble(&p, &objectives(&config, 4)).await;

    assert_eq!(payload.characters.len(), 2);
    assert_eq!(payload.characters[0].name, "Mira");
    let threads: Vec<u8> = payload.threads.iter().map(|t| t.priority).collect();
    assert_eq!(threads, vec![9, 6]);
    assert_eq!(payload.recent_titles[0], "Chapter title 3");

    let rendered = payload.render();
    assert!(rendered.contains("## Open threads\n- ["));
    assert!(rendered.contains("(priority 9) What does the letter say?"));
    assert!(rendered.contains("Chapter title 3; Chapter title 2; Chapter title 1"));
    assert!(payload.approx_tokens() > 0);
    Ok(())
}

#[tokio::test]
async fn test_failed_layers_degrade_instead_of_failing() -> anyhow::Result<()> {
    let repo = Arc::new(FlakyRepository::new(&["volumes", "characters"]));
    let config = ProjectConfig::default();
    let p = seed(repo.as_ref(), &project(config.clone()), 2, |_| {}).await?;

    let payload = ContextAssembler::new(repo).assemble(&p, &objectives(&config, 3)).await;

    assert!(payload.degraded);
    assert_eq!(
        payload.failed_layers,
        vec![ContextLayer::Volumes, ContextLayer::Characters]
    );
    assert_eq!(payload.recent_chapters.len(), 2);
    assert!(payload.characters.is_empty());
    Ok(())
}
