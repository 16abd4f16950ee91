//! Command handlers.

use super::commands::{Commands, OutputFormat};
use chronicler::{
    ChapterRecord, Chronicler, ChroniclerResult, ConfigError, GenerationDriver, JsonError, Project,
    ProjectConfig, Projects, StoryRepository,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Handle every command that does not generate text.
pub async fn handle_project_command<R: StoryRepository>(
    command: Commands,
    projects: &Projects<R>,
    defaults: &ProjectConfig,
) -> ChroniclerResult<()> {
    match command {
        Commands::Init {
            id,
            title,
            protagonist,
            essence,
            chapters,
            genre,
            words,
            model,
        } => {
            let mut config = defaults.clone();
            if let Some(genre) = genre {
                config = config.with_genre(genre);
            }
            if let Some(words) = words {
                config = config.with_target_word_count(words);
            }
            if model.is_some() {
                config = config.with_model(model);
            }
            let project = Project::builder()
                .id(id)
                .title(title)
                .protagonist(protagonist)
                .story_essence(essence)
                .target_chapters(chapters)
                .config(config)
                .build()?;
            let project = projects.create_project(project).await?;
            println!(
                "Created '{}' ({}, {} chapters of ~{} words)",
                project.id,
                project.genre(),
                project.target_chapters,
                project.config.target_word_count()
            );
        }

        Commands::Status {
            project: Some(id),
            format,
        } => {
            let project = projects.project(&id).await?;
            match format {
                OutputFormat::Json => println!("{}", to_json(&project)?),
                OutputFormat::Human => println!("{}", describe_project(&project)),
            }
        }

        Commands::Status {
            project: None,
            format,
        } => {
            let all = projects.projects().await?;
            match format {
                OutputFormat::Json => println!("{}", to_json(&all)?),
                OutputFormat::Human => {
                    if all.is_empty() {
                        println!("No projects yet. Create one with `chronicler init`.");
                    }
                    for project in &all {
                        println!("{}", describe_project(project));
                        println!("{:-<60}", "");
                    }
                }
            }
        }

        Commands::Show {
            project,
            chapter,
            format,
        } => {
            let record = projects.chapter(&project, chapter).await?;
            match format {
                OutputFormat::Json => println!("{}", to_json(&record)?),
                OutputFormat::Human => println!("{}", render_chapter(&record)),
            }
        }

        Commands::Thread {
            project,
            description,
            priority,
        } => {
            let thread = projects.add_thread(&project, &description, priority).await?;
            println!("Opened thread {} (priority {})", thread.id, thread.priority);
        }

        Commands::Twist {
            project,
            description,
            chapter,
            kind,
            foreshadow,
        } => {
            let twist = projects
                .schedule_twist(&project, &description, kind, chapter, foreshadow)
                .await?;
            println!(
                "Scheduled {} twist {} for chapter {}",
                twist.kind, twist.id, twist.target_chapter
            );
        }

        Commands::Next { .. } => {
            return Err(ConfigError::new("`next` needs a generation client").into());
        }
    }
    Ok(())
}

/// Produce chapters and report each one.
pub async fn handle_next<D, R>(
    app: &Chronicler<D, R>,
    project_id: &str,
    count: u32,
    cancel: &CancellationToken,
) -> ChroniclerResult<()>
where
    D: GenerationDriver,
    R: StoryRepository,
{
    let records = app.next_chapters(project_id, count, cancel).await?;
    for record in &records {
        println!(
            "Chapter {}: {} ({} words, score {}, {} attempt{})",
            record.number,
            record.title,
            record.word_count,
            record.critic_score,
            record.attempts,
            if record.attempts == 1 { "" } else { "s" }
        );
    }
    if records.len() < count as usize {
        info!(produced = records.len(), requested = count, "Project reached its target");
        println!("'{}' has reached its target chapter count.", project_id);
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> ChroniclerResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| JsonError::new(e.to_string()).into())
}

/// One-paragraph summary of a project and its latest run.
pub(crate) fn describe_project(project: &Project) -> String {
    let status = &project.status;
    let mut out = format!(
        "{} - {}\n  genre: {}  chapters: {}/{}\n  last run: {}",
        project.id,
        project.title,
        project.genre(),
        project.current_chapter,
        project.target_chapters,
        status.state
    );
    if let Some(chapter) = status.chapter {
        out.push_str(&format!(" (chapter {}, {}%", chapter, status.progress));
        if !status.step.is_empty() {
            out.push_str(&format!(", {}", status.step));
        }
        out.push(')');
    }
    if let Some(terminal) = status.terminal {
        out.push_str(&format!("\n  outcome: {}", terminal));
    }
    if let Some(error) = &status.error {
        out.push_str(&format!("\n  error: {}", error));
    }
    out
}

/// A chapter as plain text.
pub(crate) fn render_chapter(record: &ChapterRecord) -> String {
    format!(
        "Chapter {}: {}\n\n{}\n\n({} words, score {})",
        record.number, record.title, record.body, record.word_count, record.critic_score
    )
}
