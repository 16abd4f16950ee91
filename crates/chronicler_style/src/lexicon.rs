//! Word lists driving the style heuristics.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Vocabulary the [`StyleAnalyzer`](crate::StyleAnalyzer) matches against.
///
/// The default is an English lexicon. Every list can be replaced from TOML
/// or through the `with_*` setters; omitted lists keep their defaults.
///
/// # Examples
///
/// ```
/// use chronicler_style::StyleLexicon;
///
/// let lexicon = StyleLexicon::default()
///     .with_weak_verbs(vec!["got".to_string(), "went".to_string()]);
/// assert_eq!(lexicon.weak_verbs().len(), 2);
/// assert!(!lexicon.modifiers().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct StyleLexicon {
    /// Low-information verbs
    weak_verbs: Vec<String>,
    /// Intensifiers and filler adverbs
    modifiers: Vec<String>,
    /// Verbs that report a feeling instead of showing it
    telling_verbs: Vec<String>,
    /// Emotion words that complete a telling construction
    emotion_words: Vec<String>,
    /// Stock ornate phrases
    purple_phrases: Vec<String>,
    /// Vocabulary typical of background info-dumps
    exposition_markers: Vec<String>,
    /// Forms of "to be" that open a passive construction
    passive_auxiliaries: Vec<String>,
    /// Past participles not ending in -ed or -en
    irregular_participles: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for StyleLexicon {
    fn default() -> Self {
        Self {
            weak_verbs: words(&[
                "was", "were", "is", "are", "had", "has", "got", "get", "gets", "went", "go",
                "goes", "made", "make", "makes", "did", "do", "does", "put", "seemed", "started",
                "began",
            ]),
            modifiers: words(&[
                "very", "really", "quite", "rather", "extremely", "incredibly", "totally",
                "absolutely", "literally", "suddenly", "just", "somewhat", "truly", "utterly",
                "completely", "slightly",
            ]),
            telling_verbs: words(&[
                "felt", "feel", "feels", "feeling", "was", "were", "seemed", "looked",
                "became", "grew",
            ]),
            emotion_words: words(&[
                "angry", "sad", "happy", "afraid", "scared", "nervous", "excited", "furious",
                "anxious", "jealous", "lonely", "terrified", "relieved", "ashamed", "guilty",
                "embarrassed", "confused", "frustrated", "hopeful", "worried", "upset",
                "determined", "surprised", "shocked",
            ]),
            purple_phrases: words(&[
                "orbs",
                "cerulean",
                "ineffable",
                "ethereal",
                "resplendent",
                "tapestry of",
                "symphony of",
                "kaleidoscope of",
                "dance of shadows",
                "a sea of",
                "time stood still",
                "sent shivers down",
                "breath she didn't know",
                "breath he didn't know",
                "heart of hearts",
                "very soul",
                "depths of despair",
                "pregnant silence",
                "ebony tresses",
                "alabaster skin",
            ]),
            exposition_markers: words(&[
                "centuries",
                "ancient",
                "history",
                "legend",
                "legends",
                "founded",
                "dynasty",
                "according to",
                "for generations",
                "it was said",
                "known as",
                "long ago",
                "millennia",
                "the empire",
                "the war",
                "tradition",
            ]),
            passive_auxiliaries: words(&["am", "is", "are", "was", "were", "be", "been", "being"]),
            irregular_participles: words(&[
                "born", "bound", "brought", "built", "caught", "done", "drawn", "found", "held",
                "kept", "known", "led", "left", "made", "seen", "sent", "slain", "struck",
                "taught", "thrown", "told", "torn", "won",
            ]),
        }
    }
}
