//! Genre profiles and the registry that resolves genre tags.

use chronicler_error::{ChroniclerResult, ConfigError, PipelineError, PipelineErrorKind};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const BUILTIN_GENRES: &str = include_str!("../genres.toml");

/// Inclusive percentage range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentRange {
    /// Lower bound, 0-100
    pub min: f64,
    /// Upper bound, 0-100
    pub max: f64,
}

impl PercentRange {
    /// Create a range.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies inside the range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Signed distance outside the range: negative below, positive above, zero inside.
    pub fn deviation(&self, value: f64) -> f64 {
        if value < self.min {
            value - self.min
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }

    /// Midpoint of the range.
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

impl std::fmt::Display for PercentRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}-{:.0}%", self.min, self.max)
    }
}

/// Target proportions of dialogue, description and interior monologue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositionTargets {
    /// Share of words inside quoted speech
    pub dialogue: PercentRange,
    /// Share of words in narration that is neither speech nor interiority
    pub description: PercentRange,
    /// Share of words in a character's thoughts and feelings
    pub interior: PercentRange,
}

/// Heuristics tuned for one genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct GenreProfile {
    /// Genre tag
    #[serde(default)]
    name: String,
    /// Composition ranges enforced by the quality gate
    composition: CompositionTargets,
    /// Minimum quoted-speech segments per chapter
    #[serde(default)]
    min_dialogue_segments: usize,
    /// Words that give the genre its texture
    #[serde(default)]
    vocabulary_hints: Vec<String>,
    /// Tropes the Writer is told to avoid
    #[serde(default)]
    forbidden_tropes: Vec<String>,
}

impl GenreProfile {
    /// Create a profile.
    pub fn new(
        name: impl Into<String>,
        composition: CompositionTargets,
        min_dialogue_segments: usize,
    ) -> Self {
        Self {
            name: name.into(),
            composition,
            min_dialogue_segments,
            vocabulary_hints: Vec::new(),
            forbidden_tropes: Vec::new(),
        }
    }
}

/// Lookup from genre tag to profile.
///
/// # Examples
///
/// ```
/// use chronicler_core::GenreRegistry;
///
/// let registry = GenreRegistry::builtin().unwrap();
/// let fantasy = registry.profile("fantasy").unwrap();
/// assert_eq!(fantasy.composition().dialogue.min, 30.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GenreRegistry {
    profiles: BTreeMap<String, GenreProfile>,
}

impl GenreRegistry {
    /// Registry seeded with the bundled profiles.
    pub fn builtin() -> ChroniclerResult<Self> {
        Self::from_toml(BUILTIN_GENRES)
    }

    /// Parse a registry from a TOML table keyed by genre tag.
    pub fn from_toml(source: &str) -> ChroniclerResult<Self> {
        let raw: BTreeMap<String, GenreProfile> = toml::from_str(source)
            .map_err(|e| ConfigError::new(format!("Invalid genre profiles: {}", e)))?;
        let mut registry = Self::default();
        for (name, profile) in raw {
            registry.insert(name, profile);
        }
        Ok(registry)
    }

    /// Add or replace a profile under `name`.
    pub fn insert(&mut self, name: impl Into<String>, mut profile: GenreProfile) {
        let name = name.into();
        profile.name = name.clone();
        self.profiles.insert(name, profile);
    }

    /// Profile for `tag`, case-insensitively.
    pub fn profile(&self, tag: &str) -> ChroniclerResult<&GenreProfile> {
        let key = tag.trim().to_lowercase().replace([' ', '-'], "_");
        self.profiles
            .get(&key)
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::UnknownGenre(tag.to_string())).into())
    }

    /// Registered genre tags.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}
