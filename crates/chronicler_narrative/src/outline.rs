//! Chapter outlines produced by the Architect.

use chronicler_core::extraction;
use chronicler_error::{ChroniclerResult, PipelineError, PipelineErrorKind};
use chronicler_plot::ChapterObjectives;
use serde::{Deserialize, Serialize};

/// Plan for one chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterOutline {
    /// Working title
    pub title: String,
    /// Scenes in order
    pub scenes: Vec<String>,
    /// Story beats the chapter must hit
    #[serde(default)]
    pub beats: Vec<String>,
    /// Words the Writer should aim for
    #[serde(default)]
    pub target_word_count: u32,
    /// How the chapter ends
    #[serde(default)]
    pub cliffhanger: String,
}

impl ChapterOutline {
    /// Parse an Architect response.
    ///
    /// The JSON may be fenced or surrounded by prose. A missing word target
    /// falls back to `default_words`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineErrorKind::InvalidOutline` when no JSON object is
    /// found, it does not match the outline shape, or the title or scene list
    /// is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronicler_narrative::ChapterOutline;
    ///
    /// let response = r#"Here you go:
    /// {"title": "Salt and Iron", "scenes": ["Mira reaches the gate"], "cliffhanger": "The gate is already open."}"#;
    /// let outline = ChapterOutline::parse(response, 2800).unwrap();
    ///
    /// assert_eq!(outline.title, "Salt and Iron");
    /// assert_eq!(outline.target_word_count, 2800);
    /// assert!(ChapterOutline::parse("no plan today", 2800).is_err());
    /// ```
    pub fn parse(response: &str, default_words: u32) -> ChroniclerResult<Self> {
        let mut outline: ChapterOutline = extraction::parse_json(response).map_err(|e| {
            PipelineError::new(PipelineErrorKind::InvalidOutline(e.to_string()))
        })?;

        outline.title = outline.title.trim().trim_matches('"').to_string();
        outline.scenes.retain(|s| !s.trim().is_empty());
        if outline.title.is_empty() {
            return Err(invalid("outline has no title"));
        }
        if outline.scenes.is_empty() {
            return Err(invalid("outline has no scenes"));
        }
        if outline.target_word_count == 0 {
            outline.target_word_count = default_words;
        }
        Ok(outline)
    }

    /// Deterministic outline built from the chapter objectives.
    pub fn fallback(objectives: &ChapterObjectives, target_words: u32) -> Self {
        let scenes = objectives
            .objectives
            .iter()
            .map(|o| o.to_string())
            .collect();
        Self {
            title: format!("{}, Chapter {}", objectives.arc.title, objectives.chapter),
            scenes,
            beats: vec![objectives.phase.directive().to_string()],
            target_word_count: target_words,
            cliffhanger: "End on an unanswered question raised by the final scene.".to_string(),
        }
    }

    /// The outline as a prompt block.
    pub fn render(&self) -> String {
        let mut out = format!("Title: {}\n\nScenes:\n", self.title);
        for (i, scene) in self.scenes.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, scene.trim()));
        }
        if !self.beats.is_empty() {
            out.push_str("\nBeats to hit:\n");
            for beat in &self.beats {
                out.push_str(&format!("- {}\n", beat.trim()));
            }
        }
        if !self.cliffhanger.trim().is_empty() {
            out.push_str(&format!("\nEnding hook: {}\n", self.cliffhanger.trim()));
        }
        out
    }
}

fn invalid(message: &str) -> chronicler_error::ChroniclerError {
    PipelineError::new(PipelineErrorKind::InvalidOutline(message.to_string())).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicler_core::PlotConfig;
    use chronicler_plot::{PlotManager, PlotState};

    #[test]
    fn test_blank_scenes_dropped_and_empty_plan_rejected() {
        let outline = ChapterOutline::parse(
            r#"{"title": " Ash ", "scenes": ["", "The ferry"], "target_word_count": 3100}"#,
            2800,
        )
        .expect("valid outline");
        assert_eq!(outline.title, "Ash");
        assert_eq!(outline.scenes, vec!["The ferry"]);
        assert_eq!(outline.target_word_count, 3100);

        assert!(ChapterOutline::parse(r#"{"title": "Ash", "scenes": [" "]}"#, 2800).is_err());
        assert!(ChapterOutline::parse(r#"{"scenes": ["x"]}"#, 2800).is_err());
    }

    #[test]
    fn test_fallback_follows_objectives() {
        let objectives = PlotManager::new(PlotConfig::default(), PlotState::default()).chapter_objectives(3);
        let outline = ChapterOutline::fallback(&objectives, 2800);

        assert_eq!(outline.title, "Arc 1, Chapter 3");
        assert_eq!(outline.scenes.len(), objectives.objectives.len());
        assert!(outline.render().starts_with("Title: Arc 1, Chapter 3\n\nScenes:\n1. Setup phase:"));
    }
}
