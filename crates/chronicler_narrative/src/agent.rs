//! The four agent roles and their sampling settings.

use chronicler_core::{GenerateRequest, ProjectConfig};

/// A role in the chapter pipeline.
///
/// Every role is one call through the shared generation client; roles differ
/// only in standing instructions and sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum AgentRole {
    /// Plans arcs and chapter outlines
    Architect,
    /// Writes chapter prose
    Writer,
    /// Scores drafts and asks for rewrites
    Critic,
    /// Extracts structured memory from accepted chapters
    Archivist,
}

impl AgentRole {
    /// Standing instructions for the role.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            AgentRole::Architect => {
                "You are the story architect of a long-running serialized novel. You plan \
                 chapters that serve the arc, advance open threads and end on a hook. You \
                 never repeat a title or a scene structure the story has already used. \
                 You answer with JSON only."
            }
            AgentRole::Writer => {
                "You are the novelist writing a long-running serialized novel. You write \
                 vivid, concrete scenes in close third person: dialogue that carries \
                 conflict, sensory description, and the point-of-view character's inner \
                 life in balance. Show, do not tell. Keep continuity with everything you \
                 are told about the story so far."
            }
            AgentRole::Critic => {
                "You are a demanding fiction editor reviewing one chapter of a serialized \
                 novel. You judge pacing, continuity, characterization, prose quality and \
                 whether the chapter fulfils its outline. You are specific and terse. You \
                 answer with JSON only."
            }
            AgentRole::Archivist => {
                "You are the archivist of a long-running serialized novel. You record what \
                 actually happened in a chapter so later chapters stay consistent. You \
                 report only what the text states; you never invent events. You answer \
                 with JSON only."
            }
        }
    }

    /// Sampling temperature for the role.
    pub fn temperature(&self, config: &ProjectConfig) -> f32 {
        match self {
            AgentRole::Architect => config.temperature().min(0.7),
            AgentRole::Writer => *config.temperature(),
            AgentRole::Critic | AgentRole::Archivist => 0.2,
        }
    }

    /// Output budget in tokens for the role.
    pub fn max_output_tokens(&self, config: &ProjectConfig) -> u32 {
        match self {
            AgentRole::Architect => 2048,
            AgentRole::Writer => config.target_word_count().saturating_mul(2).max(2048),
            AgentRole::Critic => 1024,
            AgentRole::Archivist => 2048,
        }
    }

    /// A request for this role carrying `prompt`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronicler_core::ProjectConfig;
    /// use chronicler_narrative::AgentRole;
    ///
    /// let config = ProjectConfig::default().with_target_word_count(3000);
    /// let request = AgentRole::Writer.request(&config, "Write chapter 1.");
    ///
    /// assert_eq!(request.temperature, Some(0.8));
    /// assert_eq!(request.max_output_tokens, Some(6000));
    /// assert_eq!(AgentRole::Critic.request(&config, "").temperature, Some(0.2));
    /// ```
    pub fn request(&self, config: &ProjectConfig, prompt: impl Into<String>) -> GenerateRequest {
        GenerateRequest::new(self.system_prompt(), prompt)
            .with_temperature(self.temperature(config))
            .with_max_output_tokens(self.max_output_tokens(config))
            .with_model(config.model().clone())
    }
}
