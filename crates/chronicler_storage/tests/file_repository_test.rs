//! Tests for the JSON-file repository.

mod test_utils;

use chronicler_core::{PlotThread, Twist, TwistKind};
use chronicler_interface::StoryRepository;
use chronicler_storage::FileStoryRepository;
use tempfile::TempDir;
use test_utils::{arc_summary, commit, commit_run, project};

#[tokio::test]
async fn test_state_survives_reopen() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let p = project("salt-road");
    {
        let repo = FileStoryRepository::new(temp_dir.path())?;
        repo.save_project(&p).await?;
        let mut first = commit(&p, 1);
        first.arc_summary = Some(arc_summary(1, 1, 1));
        repo.commit_chapter(&first).await?;
    }

    let repo = FileStoryRepository::new(temp_dir.path())?;
    let loaded = repo.load_project("salt-road").await?;
    assert_eq!(loaded.current_chapter, 1);
    assert_eq!(loaded.story_essence, p.story_essence);
    let chapter = repo.load_chapter("salt-road", 1).await?;
    assert_eq!(chapter.map(|c| c.body), Some("Body of chapter 1.".into()));
    assert_eq!(repo.list_arc_summaries("salt-road").await?[0].arc_number, 1);
    assert_eq!(repo.load_characters("salt-road").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_commit_rejected() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let repo = FileStoryRepository::new(temp_dir.path())?;
    let p = project("p1");
    repo.save_project(&p).await?;
    repo.commit_chapter(&commit(&p, 1)).await?;

    let mut again = commit(&p, 1);
    again.chapter.body = "rewritten".into();
    assert!(repo.commit_chapter(&again).await.unwrap_err().is_duplicate_commit());
    let stored = repo.load_chapter("p1", 1).await?;
    assert_eq!(stored.map(|c| c.body), Some("Body of chapter 1.".into()));
    Ok(())
}

#[tokio::test]
async fn test_orphan_chapter_file_is_invisible_and_overwritten() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let repo = FileStoryRepository::new(temp_dir.path())?;
    let p = project("p1");
    repo.save_project(&p).await?;

    // a chapter file written before a crash, without its archive update
    let orphan = temp_dir.path().join("p1").join("chapters").join("00001.json");
    std::fs::create_dir_all(orphan.parent().expect("parent"))?;
    std::fs::write(&orphan, "{}")?;

    assert!(repo.load_chapter("p1", 1).await?.is_none());
    repo.commit_chapter(&commit(&p, 1)).await?;
    assert_eq!(repo.load_chapter("p1", 1).await?.map(|c| c.number), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_lists_and_updates() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let repo = FileStoryRepository::new(temp_dir.path())?;
    let p = project("p1");
    repo.save_project(&p).await?;
    repo.save_project(&project("p2")).await?;
    commit_run(&repo, &p, 3).await?;

    let ids: Vec<String> = repo.list_projects().await?.into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
    assert_eq!(repo.list_chapters("p1", 1..=10).await?.len(), 3);
    assert!(repo.list_chapters("p2", 1..=10).await?.is_empty());

    let threads = vec![PlotThread::open("Who sank the fleet?", 8, 3)];
    repo.save_threads("p1", &threads).await?;
    assert_eq!(repo.list_threads("p1").await?, threads);

    let twists = vec![Twist::planned("The courier is the heir", TwistKind::Identity, 10, vec![6])];
    repo.save_twists("p1", &twists).await?;
    assert_eq!(repo.list_twists("p1").await?, twists);
    Ok(())
}

#[tokio::test]
async fn test_invalid_project_id_rejected() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let repo = FileStoryRepository::new(temp_dir.path())?;
    assert!(repo.save_project(&project("../escape")).await.is_err());
    assert!(repo.load_project("ghost").await.is_err());
    Ok(())
}
