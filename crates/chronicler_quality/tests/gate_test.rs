//! Tests for the ordered quality checks.

mod test_utils;

use chronicler_core::GenreRegistry;
use chronicler_quality::{CompositionAxis, CompositionEstimator, GateViolation, QualityGate};
use test_utils::chapter;

fn gate() -> anyhow::Result<QualityGate> {
    Ok(QualityGate::new(CompositionEstimator::new()?, 0.8))
}

#[test]
fn test_balanced_chapter_passes_fantasy_gate() -> anyhow::Result<()> {
    let registry = GenreRegistry::builtin()?;
    let fantasy = registry.profile("fantasy")?;
    // 2310 words: 38% dialogue, 41% description, 21% interior
    let draft = chapter(110, 44, 66);

    let report = gate()?.evaluate(&draft, 2800, fantasy);

    assert!(report.passed(), "violations: {:?}", report.issues());
    assert_eq!(report.words(), 2310);
    assert_eq!(report.required_words, 2240);
    assert_eq!(report.composition.dialogue_segments, 110);
    Ok(())
}

#[test]
fn test_short_draft_flagged_first() -> anyhow::Result<()> {
    let registry = GenreRegistry::builtin()?;
    let report = gate()?.evaluate(&chapter(10, 4, 6), 2800, registry.profile("fantasy")?);

    assert!(report.is_short());
    assert_eq!(
        report.violations[0],
        GateViolation::TooShort {
            words: 210,
            required: 2240
        }
    );
    assert!(!report.lacks_dialogue());
    Ok(())
}

#[test]
fn test_dialogue_light_draft_names_worst_axis() -> anyhow::Result<()> {
    let registry = GenreRegistry::builtin()?;
    // 218 words: 7% dialogue, 72% description, 20% interior
    let report = gate()?.evaluate(&chapter(2, 4, 14), 200, registry.profile("fantasy")?);

    assert!(!report.is_short());
    assert!(report.lacks_dialogue());
    let out_of_range: Vec<CompositionAxis> = report
        .violations
        .iter()
        .filter_map(|v| match v {
            GateViolation::CompositionOutOfRange { axis, .. } => Some(*axis),
            _ => None,
        })
        .collect();
    assert_eq!(
        out_of_range,
        vec![CompositionAxis::Dialogue, CompositionAxis::Description]
    );

    let worst = report
        .worst_composition()
        .ok_or_else(|| anyhow::anyhow!("expected a composition violation"))?;
    assert!(worst.to_string().starts_with("description is 72%"));
    assert!(worst.to_string().ends_with("target 30-45%"));
    Ok(())
}
