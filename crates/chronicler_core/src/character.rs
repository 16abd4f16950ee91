//! Character snapshots and the append-only ledger that indexes them.

use crate::CharacterUpdate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A character as of one chapter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterState {
    /// Character name
    pub name: String,
    /// Chapter the snapshot was taken at
    pub chapter: u32,
    /// Power or level descriptor
    pub power_level: Option<String>,
    /// Health descriptor
    pub health: Option<String>,
    /// Emotional descriptor
    pub emotional_state: Option<String>,
    /// Relationships keyed by the other character
    pub relationships: BTreeMap<String, String>,
    /// Known abilities
    pub abilities: Vec<String>,
    /// Whether this snapshot is a milestone
    pub milestone: bool,
}

impl CharacterState {
    /// Snapshot for a character first seen at `chapter`.
    pub fn new(name: impl Into<String>, chapter: u32) -> Self {
        Self {
            name: name.into(),
            chapter,
            ..Self::default()
        }
    }

    /// Successor snapshot with `update` applied at `chapter`.
    pub fn apply(&self, update: &CharacterUpdate, chapter: u32) -> Self {
        let mut next = self.clone();
        next.chapter = chapter;
        next.milestone = false;
        if let Some(power) = &update.power_level {
            next.power_level = Some(power.clone());
        }
        if let Some(health) = &update.health {
            next.health = Some(health.clone());
        }
        if let Some(emotion) = &update.emotional_state {
            next.emotional_state = Some(emotion.clone());
        }
        for (other, relation) in &update.relationships {
            next.relationships.insert(other.clone(), relation.clone());
        }
        for ability in &update.new_abilities {
            if !next.abilities.contains(ability) {
                next.abilities.push(ability.clone());
            }
        }
        next
    }

    /// Whether power level or health differ from `other`.
    pub fn tracked_change_from(&self, other: &CharacterState) -> bool {
        self.power_level != other.power_level || self.health != other.health
    }

    /// One-line description for prompts.
    pub fn describe(&self) -> String {
        let mut parts = vec![self.name.clone()];
        if let Some(power) = &self.power_level {
            parts.push(format!("power: {}", power));
        }
        if let Some(health) = &self.health {
            parts.push(format!("health: {}", health));
        }
        if let Some(emotion) = &self.emotional_state {
            parts.push(format!("mood: {}", emotion));
        }
        if !self.abilities.is_empty() {
            parts.push(format!("abilities: {}", self.abilities.join(", ")));
        }
        if !self.relationships.is_empty() {
            let relations: Vec<String> = self
                .relationships
                .iter()
                .map(|(who, how)| format!("{} ({})", who, how))
                .collect();
            parts.push(format!("relationships: {}", relations.join(", ")));
        }
        parts.join("; ")
    }
}

/// Append-only history of character snapshots with a name → latest index.
///
/// # Examples
///
/// ```
/// use chronicler_core::{CharacterLedger, CharacterState};
///
/// let mut ledger = CharacterLedger::default();
/// ledger.record(CharacterState::new("Mira", 1));
/// ledger.record(CharacterState::new("Mira", 4));
///
/// assert_eq!(ledger.latest("Mira").map(|s| s.chapter), Some(4));
/// assert_eq!(ledger.history("Mira").count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<CharacterState>", into = "Vec<CharacterState>")]
pub struct CharacterLedger {
    snapshots: Vec<CharacterState>,
    latest: HashMap<String, usize>,
}

impl CharacterLedger {
    /// Append a snapshot; it becomes the latest unless an existing one is newer.
    pub fn record(&mut self, snapshot: CharacterState) {
        let index = self.snapshots.len();
        let newer = match self.latest.get(&snapshot.name) {
            Some(&current) => self.snapshots[current].chapter <= snapshot.chapter,
            None => true,
        };
        if newer {
            self.latest.insert(snapshot.name.clone(), index);
        }
        self.snapshots.push(snapshot);
    }

    /// Latest snapshot for `name`.
    pub fn latest(&self, name: &str) -> Option<&CharacterState> {
        self.latest.get(name).map(|&i| &self.snapshots[i])
    }

    /// Latest snapshot of every character, most recently updated first.
    pub fn current(&self) -> Vec<&CharacterState> {
        let mut states: Vec<&CharacterState> =
            self.latest.values().map(|&i| &self.snapshots[i]).collect();
        states.sort_by(|a, b| b.chapter.cmp(&a.chapter).then_with(|| a.name.cmp(&b.name)));
        states
    }

    /// Every snapshot of `name` in recording order.
    pub fn history<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CharacterState> + 'a {
        self.snapshots.iter().filter(move |s| s.name == name)
    }

    /// Snapshots recorded after index `from`.
    pub fn since(&self, from: usize) -> &[CharacterState] {
        &self.snapshots[from.min(self.snapshots.len())..]
    }

    /// Total snapshots recorded.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl From<Vec<CharacterState>> for CharacterLedger {
    fn from(snapshots: Vec<CharacterState>) -> Self {
        let mut ledger = Self::default();
        for snapshot in snapshots {
            ledger.record(snapshot);
        }
        ledger
    }
}

impl From<CharacterLedger> for Vec<CharacterState> {
    fn from(ledger: CharacterLedger) -> Self {
        ledger.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_merges_update() {
        let base = CharacterState {
            power_level: Some("Foundation".into()),
            abilities: vec!["Wind Step".into()],
            ..CharacterState::new("Mira", 3)
        };
        let update = CharacterUpdate {
            name: "Mira".into(),
            power_level: Some("Core Formation".into()),
            new_abilities: vec!["Wind Step".into(), "Iron Skin".into()],
            ..CharacterUpdate::default()
        };

        let next = base.apply(&update, 7);
        assert_eq!(next.chapter, 7);
        assert_eq!(next.abilities, vec!["Wind Step".to_string(), "Iron Skin".to_string()]);
        assert!(next.tracked_change_from(&base));
    }

    #[test]
    fn test_out_of_order_snapshot_does_not_replace_latest() {
        let mut ledger = CharacterLedger::default();
        ledger.record(CharacterState::new("Kade", 10));
        ledger.record(CharacterState::new("Kade", 4));
        assert_eq!(ledger.latest("Kade").map(|s| s.chapter), Some(10));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_ledger_serde_rebuilds_index() {
        let mut ledger = CharacterLedger::default();
        ledger.record(CharacterState::new("Mira", 1));
        ledger.record(CharacterState::new("Kade", 2));
        let json = serde_json::to_string(&ledger).expect("serialize");
        let restored: CharacterLedger = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored.latest("Kade").map(|s| s.chapter), Some(2));
        assert_eq!(restored.current().len(), 2);
    }
}
