//! Prompt builders for the four agents.

use crate::ChapterOutline;
use chronicler_core::{ArcPlan, ArcSummary, GenreProfile, PlotThread, Project};
use chronicler_memory::ContextPayload;

fn genre_notes(genre: &GenreProfile) -> String {
    let composition = genre.composition();
    let mut notes = format!(
        "Genre: {}. Composition targets: dialogue {}, description {}, inner thoughts {}. \
         At least {} separate lines of dialogue.",
        genre.name(),
        composition.dialogue,
        composition.description,
        composition.interior,
        genre.min_dialogue_segments()
    );
    if !genre.vocabulary_hints().is_empty() {
        notes.push_str(&format!(
            "\nTexture words for this genre: {}.",
            genre.vocabulary_hints().join(", ")
        ));
    }
    if !genre.forbidden_tropes().is_empty() {
        notes.push_str(&format!(
            "\nAvoid these tropes: {}.",
            genre.forbidden_tropes().join("; ")
        ));
    }
    notes
}

pub(crate) fn arc_plan(project: &Project, arc: &ArcPlan, earlier: &[ArcSummary]) -> String {
    let mut prompt = format!(
        "## Story essence\n{}\n\nProtagonist: {}\n",
        project.story_essence.trim(),
        project.protagonist
    );
    if let Some(last) = earlier.last() {
        prompt.push_str(&format!(
            "\n## Previous arc: {}\n{}\n",
            last.title, last.summary
        ));
    }
    prompt.push_str(&format!(
        "\n## Task\nPlan arc {} of \"{}\", covering chapters {}-{}. Give it a title and a \
         brief of at most 120 words: the central conflict, what changes for {}, and how \
         the arc ends.\nRespond with JSON only: {{\"title\": \"...\", \"brief\": \"...\"}}",
        arc.number, project.title, arc.start_chapter, arc.end_chapter, project.protagonist
    ));
    prompt
}

pub(crate) fn outline(payload: &ContextPayload, genre: &GenreProfile, target_words: u32) -> String {
    format!(
        "{}\n\n## Task\nPlan chapter {} in about {} words.\n{}\n\
         The title must differ clearly from every title already used. Plan 3-6 scenes that \
         accomplish the objectives in order, and end on a hook.\n\
         Respond with JSON only:\n\
         {{\"title\": \"...\", \"scenes\": [\"...\"], \"beats\": [\"...\"], \
         \"target_word_count\": {}, \"cliffhanger\": \"...\"}}",
        payload.render(),
        payload.chapter,
        target_words,
        genre_notes(genre),
        target_words
    )
}

pub(crate) fn writer(
    payload: &ContextPayload,
    outline: &ChapterOutline,
    genre: &GenreProfile,
    target_words: u32,
    rewrite_notes: &[String],
) -> String {
    let mut prompt = format!(
        "{}\n\n## Outline\n{}\n## Task\nWrite chapter {} in full, about {} words.\n{}\n\
         Write only the prose: no title, no notes, no commentary.",
        payload.render(),
        outline.render(),
        payload.chapter,
        target_words,
        genre_notes(genre)
    );
    if !rewrite_notes.is_empty() {
        prompt.push_str("\n\n## The previous draft was rejected. Fix the following:\n");
        for note in rewrite_notes {
            prompt.push_str(&format!("- {}\n", note));
        }
    }
    prompt
}

pub(crate) fn critic(
    chapter: u32,
    outline: &ChapterOutline,
    title: &str,
    draft: &str,
    genre: &GenreProfile,
    findings: &[String],
) -> String {
    let mut prompt = format!(
        "## Outline\n{}\n## Genre\n{}\n\n## Chapter {}: {}\n{}\n",
        outline.render(),
        genre_notes(genre),
        chapter,
        title,
        draft
    );
    if !findings.is_empty() {
        prompt.push_str("\n## Automated findings\n");
        for finding in findings {
            prompt.push_str(&format!("- {}\n", finding));
        }
    }
    prompt.push_str(
        "\n## Task\nScore the chapter from 0 to 100 and list its concrete problems. Set \
         rewrite_required when it breaks continuity, ignores the outline or is unfit to \
         publish whatever its score.\nRespond with JSON only: {\"score\": 0, \"issues\": \
         [\"...\"], \"rewrite_required\": false, \"rewrite_instructions\": \"...\"}",
    );
    prompt
}

pub(crate) fn archivist(chapter: u32, title: &str, draft: &str, threads: &[&PlotThread]) -> String {
    let mut prompt = format!("## Chapter {}: {}\n{}\n", chapter, title, draft);
    if !threads.is_empty() {
        prompt.push_str("\n## Open threads\n");
        for thread in threads {
            prompt.push_str(&format!("- [{}] {}\n", thread.id, thread.description));
        }
    }
    prompt.push_str(
        "\n## Task\nRecord what this chapter established. List a thread id under \
         resolved_threads only if the chapter explicitly settles it, and under \
         advanced_threads if it moves it forward. Use only ids from the list above. \
         Character updates cover only what changed in this chapter.\n\
         Respond with JSON only:\n\
         {\"summary\": \"<at most 80 words>\", \"key_events\": [\"...\"], \
         \"resolved_threads\": [\"<id>\"], \"advanced_threads\": [\"<id>\"], \
         \"new_threads\": [{\"description\": \"...\", \"priority\": 5}], \
         \"character_updates\": [{\"name\": \"...\", \"power_level\": null, \"health\": null, \
         \"emotional_state\": null, \"relationships\": {}, \"new_abilities\": []}]}",
    );
    prompt
}
