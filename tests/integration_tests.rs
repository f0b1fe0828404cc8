//! Integration tests for the definition comparison pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - DiTree construction → visit data → correlation search
//! - Set diff → merge → results
//! - Background execution with a timing hook
//!
//! Run with: cargo test --test integration_tests

use anyhow::Result;
use axiograph_ditree::well_known::{
    AND, CONCRETE_DOMAIN_OPERATOR, FEATURE, INCLUSION_SET, LITERAL_VALUE, NECESSARY_SET,
    SUFFICIENT_SET,
};
use axiograph_ditree::{ConceptId, DiTree, DiTreeBuilder, PropertyValue};
use axiograph_isomorphic::{
    compare_in_background, Checkpoint, GroupingKind, IsomorphicComparison, RecordingTimer,
    SolutionGrowthGuard, TreeRole,
};
use std::sync::Arc;

const AMOXICILLIN: ConceptId = ConceptId::new(5001);
const HAS_DOSE_FORM: ConceptId = ConceptId::new(1001);
const HAS_ACTIVE_INGREDIENT: ConceptId = ConceptId::new(1002);
const HAS_STRENGTH: ConceptId = ConceptId::new(1003);
const PART_OF: ConceptId = ConceptId::new(1004);
const ORAL: ConceptId = ConceptId::new(2001);
const AMOXICILLIN_SUBSTANCE: ConceptId = ConceptId::new(2002);
const ANTIBIOTIC: ConceptId = ConceptId::new(2003);
const CAPSULE: ConceptId = ConceptId::new(2004);
const EQUALS: ConceptId = ConceptId::new(3001);

fn guard() -> Arc<SolutionGrowthGuard> {
    Arc::new(SolutionGrowthGuard::new(512, 1 << 20))
}

/// A fuller drug definition: necessary set, sufficient set and property set.
fn drug_definition(builder: &mut DiTreeBuilder, strength: i64) -> Result<()> {
    let root = builder.definition_root();

    let ns = builder.necessary_set(root)?;
    let and = builder.and(ns)?;
    builder.concept(and, ANTIBIOTIC)?;
    let role = builder.some_role(and, HAS_DOSE_FORM)?;
    builder.concept(role, ORAL)?;
    let role = builder.some_role(and, HAS_ACTIVE_INGREDIENT)?;
    builder.concept(role, AMOXICILLIN_SUBSTANCE)?;

    let ss = builder.sufficient_set(root)?;
    let and = builder.and(ss)?;
    builder.concept(and, ANTIBIOTIC)?;
    let role = builder.some_role(and, HAS_ACTIVE_INGREDIENT)?;
    builder.concept(role, AMOXICILLIN_SUBSTANCE)?;

    let ps = builder.property_set(root)?;
    let and = builder.and(ps)?;
    builder.feature(and, HAS_STRENGTH, EQUALS, PropertyValue::Integer(strength))?;
    Ok(())
}

fn build_drug() -> Result<DiTree> {
    let mut b = DiTreeBuilder::new();
    drug_definition(&mut b, 500)?;
    Ok(b.build()?)
}

// ============================================================================
// Round trips through the whole engine
// ============================================================================

#[test]
fn test_independent_builds_are_equivalent() -> Result<()> {
    let results = IsomorphicComparison::new(build_drug()?, build_drug()?, AMOXICILLIN)
        .with_guard(guard())
        .run()?;

    assert!(results.equivalent());
    assert_eq!(results.shared_set_elements().len(), 6);
    assert!(results.merged_tree().structurally_equal(results.reference_tree()));
    assert_eq!(
        results.comparison_to_reference().iter().filter(|&&r| r >= 0).count(),
        results.comparison_tree().vertex_count()
    );
    Ok(())
}

#[test]
fn test_literal_only_changes_are_not_differences() -> Result<()> {
    let mut b = DiTreeBuilder::new();
    drug_definition(&mut b, 250)?;
    let comparison = b.build()?;

    let results = IsomorphicComparison::new(build_drug()?, comparison, AMOXICILLIN)
        .with_guard(guard())
        .run()?;

    assert!(results.equivalent());
    assert!(results.added_set_elements().is_empty());
    assert!(results.deleted_set_elements().is_empty());

    // the merged tree is the reference, literal included
    let merged = results.merged_tree();
    let feature = merged.vertices_with_meaning(FEATURE)[0];
    assert_eq!(
        merged.vertex(feature).and_then(|v| v.property(LITERAL_VALUE)),
        Some(&PropertyValue::Integer(500))
    );
    assert_eq!(
        merged.vertex(feature).and_then(|v| v.property(CONCRETE_DOMAIN_OPERATOR)),
        Some(&PropertyValue::Concept(EQUALS))
    );
    Ok(())
}

#[test]
fn test_multi_group_merge() -> Result<()> {
    let reference = build_drug()?;

    let mut b = DiTreeBuilder::new();
    drug_definition(&mut b, 500)?;
    let root = b.root().expect("definition root");
    let ns = b.indices_with_meaning(NECESSARY_SET)[0];
    let and = b.successors_of(ns)[0];
    let role = b.some_role(and, PART_OF)?;
    b.concept(role, CAPSULE)?;
    let ss = b.sufficient_set(root)?;
    let ss_and = b.and(ss)?;
    b.concept(ss_and, CAPSULE)?;
    let inclusion = b.inclusion_set(root)?;
    let inclusion_and = b.and(inclusion)?;
    b.concept(inclusion_and, ORAL)?;
    let comparison = b.build()?;

    let results = IsomorphicComparison::new(reference.clone(), comparison, AMOXICILLIN)
        .with_guard(guard())
        .run()?;

    assert!(!results.equivalent());
    assert!(results.deletion_roots().is_empty());
    assert_eq!(results.addition_roots().len(), 3);

    let mut added_kinds: Vec<GroupingKind> = results
        .added_set_elements()
        .iter()
        .map(|e| e.key.kind())
        .collect();
    added_kinds.sort();
    assert_eq!(
        added_kinds,
        vec![
            GroupingKind::NecessarySet,
            GroupingKind::SufficientSet,
            GroupingKind::InclusionSet
        ]
    );
    assert!(results
        .added_set_elements()
        .iter()
        .all(|e| e.role == TreeRole::Comparison));

    let merged = results.merged_tree();
    assert_eq!(merged.vertices_with_meaning(NECESSARY_SET).len(), 1);
    assert_eq!(merged.vertices_with_meaning(SUFFICIENT_SET).len(), 2);
    assert_eq!(merged.vertices_with_meaning(INCLUSION_SET).len(), 1);
    // 2 for the role, 3 per new group
    assert_eq!(merged.vertex_count(), reference.vertex_count() + 2 + 3 + 3);

    let ns = merged.vertices_with_meaning(NECESSARY_SET)[0];
    let and = merged.successors(ns)[0];
    assert_eq!(merged.vertex(and).map(|v| v.meaning()), Some(AND));
    assert_eq!(merged.successors(and).len(), 4);
    Ok(())
}

// ============================================================================
// Background execution
// ============================================================================

#[tokio::test]
async fn test_background_comparison_reports_timing() -> Result<()> {
    let timer = Arc::new(RecordingTimer::new());
    let before = chrono::Utc::now();

    let job = IsomorphicComparison::new(build_drug()?, build_drug()?, AMOXICILLIN)
        .with_guard(guard())
        .with_timer(timer.clone());
    let results = compare_in_background(job).await?;

    assert!(results.equivalent());
    let completed = timer
        .last(Checkpoint::FullComparisonComplete)
        .expect("checkpoint recorded");
    assert!(completed >= before);

    let summary = results.summary();
    let json = summary.to_json_pretty()?;
    let parsed: axiograph_isomorphic::ComparisonSummary = serde_json::from_str(&json)?;
    assert_eq!(parsed, summary);
    Ok(())
}
