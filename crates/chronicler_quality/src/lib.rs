//! Quality gate and refinement loop.
//!
//! [`QualityGate`] runs ordered structural checks on a draft (length,
//! dialogue count, compositional balance against the genre's ranges).
//! [`RefinementLoop`] turns failed checks into targeted rewrite passes
//! through the shared generation client, with a hard cap on repair cycles.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod composition;
mod gate;
mod prompts;
mod refine;

pub use composition::{Composition, CompositionAxis, CompositionEstimator};
pub use gate::{GateReport, GateViolation, QualityGate};
pub use refine::{PassRecord, RefinementLoop, RefinementOutcome, RepairPass};
