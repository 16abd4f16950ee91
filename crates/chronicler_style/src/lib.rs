//! Prose style analysis.
//!
//! [`StyleAnalyzer`] scores a draft 0-100 on independent axes (weak verbs,
//! overused modifiers, telling instead of showing, purple prose, passive
//! constructions, sentence-length variety, exposition dumps) and returns the
//! offending spans so rewrite prompts can cite them. Word lists live in a
//! [`StyleLexicon`], not in the scoring code.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod lexicon;
mod report;

pub use analyzer::StyleAnalyzer;
pub use lexicon::StyleLexicon;
pub use report::{AxisScore, QuickCheck, StyleAxis, StyleIssue, StyleReport, TextSpan};
