//! Tests for the in-memory repository.

mod test_utils;

use chronicler_core::{RunState, RunStatus};
use chronicler_error::{ChroniclerErrorKind, StorageErrorKind};
use chronicler_interface::StoryRepository;
use chronicler_storage::InMemoryStoryRepository;
use std::sync::Arc;
use test_utils::{arc_summary, commit, commit_run, project};

fn storage_kind(err: &chronicler_error::ChroniclerError) -> Option<&StorageErrorKind> {
    match err.kind() {
        ChroniclerErrorKind::Storage(e) => Some(&e.kind),
        _ => None,
    }
}

#[tokio::test]
async fn test_unknown_project_is_not_found() -> anyhow::Result<()> {
    let repo = InMemoryStoryRepository::new();
    let err = repo.load_project("ghost").await.unwrap_err();
    assert!(matches!(storage_kind(&err), Some(StorageErrorKind::NotFound(_))));
    assert!(repo.list_projects().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_commit_applies_every_mutation() -> anyhow::Result<()> {
    let repo = InMemoryStoryRepository::new();
    let p = project("p1");
    repo.save_project(&p).await?;

    let mut first = commit(&p, 1);
    first.arc_summary = Some(arc_summary(1, 1, 1));
    repo.commit_chapter(&first).await?;

    assert_eq!(repo.load_project("p1").await?.current_chapter, 1);
    assert_eq!(repo.load_chapter("p1", 1).await?.map(|c| c.title), Some("Title 1".into()));
    assert_eq!(repo.list_story_nodes("p1", 1..=10).await?.len(), 1);
    assert_eq!(repo.list_threads("p1").await?.len(), 1);
    assert_eq!(repo.list_arc_summaries("p1").await?.len(), 1);
    assert_eq!(repo.load_characters("p1").await?.len(), 1);
    assert_eq!(repo.load_repetition("p1").await?.titles, vec!["Title 1"]);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_commit_rejected_and_nothing_changes() -> anyhow::Result<()> {
    let repo = InMemoryStoryRepository::new();
    let p = project("p1");
    repo.save_project(&p).await?;
    repo.commit_chapter(&commit(&p, 1)).await?;

    let mut again = commit(&p, 1);
    again.chapter.title = "Imposter".into();
    let err = repo.commit_chapter(&again).await.unwrap_err();
    assert!(err.is_duplicate_commit());
    assert_eq!(repo.load_chapter("p1", 1).await?.map(|c| c.title), Some("Title 1".into()));
    assert_eq!(repo.list_story_nodes("p1", 1..=10).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_gap_rejected() -> anyhow::Result<()> {
    let repo = InMemoryStoryRepository::new();
    let p = project("p1");
    repo.save_project(&p).await?;

    let err = repo.commit_chapter(&commit(&p, 2)).await.unwrap_err();
    assert_eq!(
        storage_kind(&err),
        Some(&StorageErrorKind::NonContiguous {
            project_id: "p1".into(),
            chapter: 2,
            latest: 0
        })
    );
    assert!(repo.load_chapter("p1", 2).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_concurrent_commits_of_one_chapter_yield_one_success() -> anyhow::Result<()> {
    let repo = Arc::new(InMemoryStoryRepository::new());
    let p = project("p1");
    repo.save_project(&p).await?;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let commit = commit(&p, 1);
            tokio::spawn(async move { repo.commit_chapter(&commit).await })
        })
        .collect();

    let mut successes = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await? {
            Ok(()) => successes += 1,
            Err(e) if e.is_duplicate_commit() => duplicates += 1,
            Err(e) => return Err(e.into()),
        }
    }
    assert_eq!((successes, duplicates), (1, 3));
    Ok(())
}

#[tokio::test]
async fn test_ranges_and_status() -> anyhow::Result<()> {
    let repo = InMemoryStoryRepository::new();
    let p = project("p1");
    repo.save_project(&p).await?;
    commit_run(&repo, &p, 6).await?;

    let numbers: Vec<u32> = repo
        .list_chapters("p1", 2..=4)
        .await?
        .iter()
        .map(|c| c.number)
        .collect();
    assert_eq!(numbers, vec![2, 3, 4]);
    assert_eq!(repo.list_story_nodes("p1", 5..=99).await?.len(), 2);

    let status = RunStatus {
        state: RunState::Drafting,
        progress: 25,
        step: "drafting".into(),
        ..RunStatus::default()
    };
    repo.update_status("p1", &status).await?;
    assert_eq!(repo.load_project("p1").await?.status.state, RunState::Drafting);
    Ok(())
}
