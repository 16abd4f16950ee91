//! Tests for project management through the application surface.

use chronicler::{
    ChroniclerErrorKind, FileStoryRepository, PipelineErrorKind, Project, ProjectConfig,
    ProjectLeases, Projects, StorageErrorKind, StoryRepository, TwistKind,
};
use std::sync::Arc;
use tempfile::TempDir;

fn projects(dir: &TempDir) -> anyhow::Result<Projects<FileStoryRepository>> {
    let repository = Arc::new(FileStoryRepository::new(dir.path())?);
    Ok(Projects::new(repository, ProjectLeases::new()))
}

fn salt_road(genre: &str) -> Project {
    Project::builder()
        .id("salt-road")
        .title("The Salt Road")
        .protagonist("Mira")
        .story_essence("A ferrywoman carries the dead across a drowned kingdom.")
        .target_chapters(300u32)
        .config(ProjectConfig::default().with_genre(genre.to_string()))
        .build()
        .expect("valid project")
}

#[tokio::test]
async fn test_create_and_list_projects() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let projects = projects(&dir)?;

    projects.create_project(salt_road("fantasy")).await?;

    let all = projects.projects().await?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].genre(), "fantasy");
    assert_eq!(all[0].current_chapter, 0);

    // a fresh handle over the same directory sees the project
    let reopened = self::projects(&dir)?;
    assert_eq!(reopened.project("salt-road").await?.title, "The Salt Road");
    Ok(())
}

#[tokio::test]
async fn test_duplicate_project_refused() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let projects = projects(&dir)?;
    projects.create_project(salt_road("general")).await?;

    let err = projects
        .create_project(salt_road("romance"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        ChroniclerErrorKind::Storage(e) if matches!(e.kind, StorageErrorKind::Write(_))
    ));
    assert_eq!(projects.project("salt-road").await?.genre(), "general");
    Ok(())
}

#[tokio::test]
async fn test_unknown_genre_and_zero_target_refused() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let projects = projects(&dir)?;

    let err = projects.create_project(salt_road("western")).await.unwrap_err();
    assert_eq!(
        err.pipeline_kind(),
        Some(&PipelineErrorKind::UnknownGenre("western".into()))
    );

    let mut empty = salt_road("general");
    empty.target_chapters = 0;
    let err = projects.create_project(empty).await.unwrap_err();
    assert!(matches!(err.kind(), ChroniclerErrorKind::Config(_)));
    assert!(projects.projects().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_chapter_is_not_found() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let projects = projects(&dir)?;
    projects.create_project(salt_road("general")).await?;

    let err = projects.chapter("salt-road", 1).await.unwrap_err();
    assert!(matches!(
        err.kind(),
        ChroniclerErrorKind::Storage(e) if matches!(e.kind, StorageErrorKind::NotFound(_))
    ));
    assert!(projects.project("nowhere").await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_thread_added_and_persisted() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let projects = projects(&dir)?;
    projects.create_project(salt_road("general")).await?;

    let thread = projects
        .add_thread("salt-road", "  Who sank the old capital?  ", 9)
        .await?;
    assert_eq!(thread.description, "Who sank the old capital?");
    assert_eq!(thread.origin_chapter, 0);

    let stored = projects.repository().list_threads("salt-road").await?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, thread.id);
    assert_eq!(stored[0].priority, 9);
    Ok(())
}

#[tokio::test]
async fn test_thread_priority_and_description_validated() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let projects = projects(&dir)?;
    projects.create_project(salt_road("general")).await?;

    assert!(projects.add_thread("salt-road", "A debt", 0).await.is_err());
    assert!(projects.add_thread("salt-road", "A debt", 11).await.is_err());
    assert!(projects.add_thread("salt-road", "   ", 5).await.is_err());
    assert!(projects.repository().list_threads("salt-road").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_twist_scheduled_with_sorted_foreshadowing() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let projects = projects(&dir)?;
    projects.create_project(salt_road("thriller")).await?;

    let twist = projects
        .schedule_twist(
            "salt-road",
            "The ferryman is Mira's father",
            TwistKind::Identity,
            40,
            vec![30, 12, 30],
        )
        .await?;
    assert_eq!(twist.foreshadow_chapters, vec![12, 30]);
    assert_eq!(twist.kind, TwistKind::Identity);

    let stored = projects.repository().list_twists("salt-road").await?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].target_chapter, 40);
    Ok(())
}

#[tokio::test]
async fn test_twist_in_the_past_refused() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let projects = projects(&dir)?;
    projects.create_project(salt_road("general")).await?;

    let err = projects
        .schedule_twist("salt-road", "Late reveal", TwistKind::Reversal, 5, vec![5])
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), ChroniclerErrorKind::Config(_)));
    assert!(projects.repository().list_twists("salt-road").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_plot_edits_refused_during_a_run() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let leases = ProjectLeases::new();
    let repository = Arc::new(FileStoryRepository::new(dir.path())?);
    let projects = Projects::new(repository, leases.clone());
    projects.create_project(salt_road("general")).await?;

    let run = leases.acquire("salt-road")?;
    let err = projects
        .add_thread("salt-road", "Who paid the toll?", 5)
        .await
        .unwrap_err();
    assert_eq!(
        err.pipeline_kind(),
        Some(&PipelineErrorKind::ProjectBusy("salt-road".into()))
    );
    assert!(
        projects
            .schedule_twist("salt-road", "Betrayal", TwistKind::Betrayal, 10, vec![])
            .await
            .is_err()
    );

    drop(run);
    projects.add_thread("salt-road", "Who paid the toll?", 5).await?;
    assert!(!leases.is_held("salt-road"));
    Ok(())
}
