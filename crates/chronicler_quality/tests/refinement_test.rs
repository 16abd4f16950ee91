//! Tests for the bounded repair loop.

mod test_utils;

use chronicler_core::{GenreRegistry, RefinementConfig};
use chronicler_quality::{
    CompositionAxis, CompositionEstimator, QualityGate, RefinementLoop, RepairPass,
};
use chronicler_style::StyleAnalyzer;
use test_utils::{EditorDriver, chapter, client};

fn refinement_loop(driver: EditorDriver) -> anyhow::Result<RefinementLoop<EditorDriver>> {
    let gate = QualityGate::new(CompositionEstimator::new()?, 0.8);
    Ok(RefinementLoop::new(client(driver), gate, StyleAnalyzer::english()?))
}

fn kinds(passes: &[chronicler_quality::PassRecord]) -> Vec<(u32, RepairPass)> {
    passes.iter().map(|p| (p.cycle, p.pass.clone())).collect()
}

#[tokio::test]
async fn test_short_draft_expanded_then_polished() -> anyhow::Result<()> {
    let registry = GenreRegistry::builtin()?;
    let fantasy = registry.profile("fantasy")?;
    let expanded = chapter(20, 8, 12);
    let driver = EditorDriver::new(vec![
        format!("```\n{expanded}\n```"),
        expanded.clone(),
    ]);
    let refinement = refinement_loop(driver)?;

    let outcome = refinement.refine(chapter(10, 4, 6), 300, fantasy).await?;

    assert!(outcome.passed());
    assert!(outcome.expanded());
    assert_eq!(outcome.draft, expanded);
    assert_eq!(
        kinds(&outcome.passes),
        vec![(1, RepairPass::Expand), (1, RepairPass::Fluency)]
    );
    assert_eq!(outcome.passes[0].words_before, 210);
    assert_eq!(outcome.passes[0].words_after, 420);
    Ok(())
}

#[tokio::test]
async fn test_expand_prompt_states_counts() -> anyhow::Result<()> {
    let registry = GenreRegistry::builtin()?;
    let expanded = chapter(20, 8, 12);
    let driver = EditorDriver::new(vec![expanded.clone(), expanded]);
    let gate = QualityGate::new(CompositionEstimator::new()?, 0.8);
    let client = client(driver);
    let refinement = RefinementLoop::new(client.clone(), gate, StyleAnalyzer::english()?)
        .configured(&RefinementConfig::default().with_repair_temperature(0.4));

    refinement
        .refine(chapter(10, 4, 6), 300, registry.profile("fantasy")?)
        .await?;

    let requests = client.driver().requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].prompt.contains("has 210 words"));
    assert!(requests[0].prompt.contains("about 300 words"));
    assert_eq!(requests[0].temperature, Some(0.4));
    Ok(())
}

#[tokio::test]
async fn test_compliant_draft_gets_single_fluency_pass_citing_style_issue() -> anyhow::Result<()> {
    let registry = GenreRegistry::builtin()?;
    let draft = format!("{}\n\nShe felt very angry.", chapter(10, 4, 6));
    let driver = EditorDriver::new(vec![chapter(10, 4, 6)]);
    let gate = QualityGate::new(CompositionEstimator::new()?, 0.8);
    let client = client(driver);
    let refinement = RefinementLoop::new(client.clone(), gate, StyleAnalyzer::english()?);

    let outcome = refinement
        .refine(draft, 200, registry.profile("fantasy")?)
        .await?;

    assert!(outcome.passed());
    assert_eq!(kinds(&outcome.passes), vec![(1, RepairPass::Fluency)]);
    let prompts = client.driver().prompts();
    assert!(prompts[0].contains("Fix this in particular: emotion named rather than shown (\"felt very angry\")"));
    Ok(())
}

#[tokio::test]
async fn test_stubborn_draft_accepted_after_extra_cycle() -> anyhow::Result<()> {
    let registry = GenreRegistry::builtin()?;
    let stubborn = chapter(2, 4, 14);
    let driver = EditorDriver::new(Vec::new()).with_fallback(stubborn.clone());
    let gate = QualityGate::new(CompositionEstimator::new()?, 0.8);
    let client = client(driver);
    let refinement = RefinementLoop::new(client.clone(), gate, StyleAnalyzer::english()?);

    let outcome = refinement
        .refine(stubborn, 200, registry.profile("fantasy")?)
        .await?;

    assert!(!outcome.passed());
    let rebalance = RepairPass::Rebalance {
        axis: CompositionAxis::Description,
    };
    assert_eq!(
        kinds(&outcome.passes),
        vec![
            (1, RepairPass::AddDialogue),
            (1, rebalance.clone()),
            (1, RepairPass::Fluency),
            (2, rebalance),
            (2, RepairPass::Fluency),
        ]
    );
    let prompts = client.driver().prompts();
    assert!(prompts[1].contains("description is 72% of the text, target 30-45%"));
    Ok(())
}

#[tokio::test]
async fn test_extra_cycles_configurable() -> anyhow::Result<()> {
    let registry = GenreRegistry::builtin()?;
    let stubborn = chapter(2, 4, 14);
    let driver = EditorDriver::new(Vec::new()).with_fallback(stubborn.clone());
    let refinement = refinement_loop(driver)?
        .configured(&RefinementConfig::default().with_extra_repair_cycles(0));

    let outcome = refinement
        .refine(stubborn, 200, registry.profile("fantasy")?)
        .await?;

    assert_eq!(outcome.passes.len(), 3);
    assert!(!outcome.passed());
    Ok(())
}

#[tokio::test]
async fn test_generation_failure_propagates() -> anyhow::Result<()> {
    let registry = GenreRegistry::builtin()?;
    let refinement = refinement_loop(EditorDriver::new(Vec::new()))?;

    let result = refinement
        .refine(chapter(10, 4, 6), 200, registry.profile("fantasy")?)
        .await;

    assert!(result.is_err());
    Ok(())
}
