//! Prompts for the repair passes.

use chronicler_core::GenreProfile;

pub(crate) const EDITOR_SYSTEM: &str = "You are a meticulous fiction editor revising one chapter of a \
serialized novel. Preserve the plot, the characters, the point of view and every named detail. \
Return only the full revised chapter text, with no commentary, headings or markdown.";

fn genre_notes(genre: &GenreProfile) -> String {
    if genre.forbidden_tropes().is_empty() {
        String::new()
    } else {
        format!(
            "\nAvoid these tropes: {}.",
            genre.forbidden_tropes().join("; ")
        )
    }
}

pub(crate) fn expand(draft: &str, words: usize, target_words: u32, genre: &GenreProfile) -> String {
    format!(
        "The chapter below has {words} words; it must reach about {target_words} words.\n\
         Expand it by dramatizing moments that are currently summarized: add concrete sensory \
         detail, beats of action and exchanges between characters. Do not pad with recap or \
         repetition, and do not add new plot events beyond the existing ending.{notes}\n\n\
         CHAPTER:\n{draft}",
        notes = genre_notes(genre)
    )
}

pub(crate) fn add_dialogue(
    draft: &str,
    segments: usize,
    required: usize,
    genre: &GenreProfile,
) -> String {
    format!(
        "The chapter below contains only {segments} lines of quoted dialogue; it needs at least \
         {required}.\nConvert narrated exchanges and reported speech into spoken dialogue between \
         the characters present. Each line of speech should reveal character or move the scene \
         forward.{notes}\n\nCHAPTER:\n{draft}",
        notes = genre_notes(genre)
    )
}

pub(crate) fn rebalance(draft: &str, violation: &str, all: &[String], genre: &GenreProfile) -> String {
    format!(
        "The chapter below is out of balance: {violation}.\n\
         All measured problems:\n- {all}\n\
         Rewrite so that each proportion lands inside its target range. Trim or convert \
         passages on the over-represented side rather than adding unrelated material.{notes}\n\n\
         CHAPTER:\n{draft}",
        all = all.join("\n- "),
        notes = genre_notes(genre)
    )
}

pub(crate) fn fluency(draft: &str, headline: Option<&str>) -> String {
    let focus = match headline {
        Some(issue) => format!("\nFix this in particular: {issue}."),
        None => String::new(),
    };
    format!(
        "Polish the chapter below for fluency. Vary sentence rhythm, replace stock phrases and \
         filler modifiers with specific language, and show emotion through action and dialogue \
         rather than naming it. Keep the length roughly the same.{focus}\n\n\
         CHAPTER:\n{draft}"
    )
}
