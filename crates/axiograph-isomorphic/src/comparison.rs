//! The comparison entry point.
//!
//! ```text
//! reference, comparison
//!   → visit data (per tree)
//!   → correlation search          (guarded by the solution-growth cap)
//!   → image-uniqueness check
//!   → set-element index (per tree) → set diff
//!   → result assembly → merge
//!   → timer checkpoint
//! ```

use crate::config::{IsomorphicConfig, SolutionGrowthGuard};
use crate::error::{IsomorphicError, Result, TreeRole};
use crate::merge::merge_trees;
use crate::results::{IsomorphicResults, ResultParts};
use crate::search::CorrelationSearch;
use crate::set_element::{SetDiff, SetElementIndex};
use crate::timing::{Checkpoint, ComparisonTimer};
use crate::visit::IsomorphicVisitData;
use axiograph_ditree::{ConceptId, DiTree};
use chrono::Utc;
use std::sync::Arc;

/// One reference/comparison pair, ready to run.
#[derive(Clone)]
pub struct IsomorphicComparison {
    reference: Arc<DiTree>,
    comparison: Arc<DiTree>,
    concept: ConceptId,
    config: IsomorphicConfig,
    guard: Option<Arc<SolutionGrowthGuard>>,
    /// Built from `config` by `with_config`
    config_guard: Option<Arc<SolutionGrowthGuard>>,
    timer: Option<Arc<dyn ComparisonTimer>>,
}

impl IsomorphicComparison {
    /// `concept` is only used to label logs and results.
    pub fn new(
        reference: impl Into<Arc<DiTree>>,
        comparison: impl Into<Arc<DiTree>>,
        concept: ConceptId,
    ) -> Self {
        Self {
            reference: reference.into(),
            comparison: comparison.into(),
            concept,
            config: IsomorphicConfig::default(),
            guard: None,
            config_guard: None,
            timer: None,
        }
    }

    pub fn with_timer(mut self, timer: Arc<dyn ComparisonTimer>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Use `guard` instead of the process-wide one. Takes precedence over
    /// the caps given to `with_config`.
    pub fn with_guard(mut self, guard: Arc<SolutionGrowthGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Apply `config`. Unless a guard is passed to `with_guard`, the search
    /// runs against a guard of its own built from the config's caps, so the
    /// process-wide cap is left alone.
    pub fn with_config(mut self, config: &IsomorphicConfig) -> Self {
        self.config = config.clone();
        self.config_guard = Some(Arc::new(SolutionGrowthGuard::from_config(config)));
        self
    }

    pub fn concept(&self) -> ConceptId {
        self.concept
    }

    pub fn run(&self) -> Result<IsomorphicResults> {
        let reference = &self.reference;
        let comparison = &self.comparison;
        tracing::debug!(
            concept = %self.concept,
            reference_vertices = reference.vertex_count(),
            comparison_vertices = comparison.vertex_count(),
            "starting isomorphic comparison"
        );

        let reference_data = IsomorphicVisitData::collect(reference, TreeRole::Reference)?;
        let comparison_data = IsomorphicVisitData::collect(comparison, TreeRole::Comparison)?;

        let guard = self
            .guard
            .clone()
            .or_else(|| self.config_guard.clone())
            .unwrap_or_else(SolutionGrowthGuard::global);
        let outcome = CorrelationSearch::new(
            reference,
            comparison,
            &reference_data,
            &comparison_data,
            &guard,
            self.concept,
        )
        .run();

        if self.config.verify_unique_images {
            if let Some((comparison_index, preimages)) =
                outcome.solution.duplicate_images().into_iter().next()
            {
                return Err(IsomorphicError::DuplicateImage {
                    comparison: comparison_index,
                    reference: preimages,
                });
            }
        }

        let reference_elements = SetElementIndex::build(reference, TreeRole::Reference)?;
        let comparison_elements = SetElementIndex::build(comparison, TreeRole::Comparison)?;
        let diff = SetDiff::between(&reference_elements, &comparison_elements);
        let added = diff.added.clone();

        let results = IsomorphicResults::assemble(ResultParts {
            concept: self.concept,
            reference: Arc::clone(reference),
            comparison: Arc::clone(comparison),
            solution: outcome.solution,
            diff,
            statistics: outcome.statistics,
        })?;
        let merged = merge_trees(reference, comparison, &added, results.equivalent())?;
        let results = results.with_merged(merged);

        if let Some(timer) = &self.timer {
            timer.record(Checkpoint::FullComparisonComplete, Utc::now());
        }

        tracing::debug!(
            concept = %self.concept,
            equivalent = results.equivalent(),
            score = results.solution().score(),
            additions = results.addition_roots().len(),
            deletions = results.deletion_roots().len(),
            added_elements = results.added_set_elements().len(),
            deleted_elements = results.deleted_set_elements().len(),
            "isomorphic comparison complete"
        );
        Ok(results)
    }
}

/// Run `comparison` on the blocking pool so async callers keep their executor
/// free.
pub async fn compare_in_background(comparison: IsomorphicComparison) -> Result<IsomorphicResults> {
    tokio::task::spawn_blocking(move || comparison.run())
        .await
        .map_err(|e| IsomorphicError::TaskFailed(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::RecordingTimer;
    use axiograph_ditree::DiTreeBuilder;

    fn tree(fillers: &[u32]) -> DiTree {
        let mut b = DiTreeBuilder::new();
        let root = b.definition_root();
        let ns = b.necessary_set(root).unwrap();
        let and = b.and(ns).unwrap();
        for &filler in fillers {
            b.concept(and, ConceptId::new(filler)).unwrap();
        }
        b.build().unwrap()
    }

    fn private_guard() -> Arc<SolutionGrowthGuard> {
        Arc::new(SolutionGrowthGuard::new(64, 4_096))
    }

    #[test]
    fn timer_sees_completion() {
        let t = tree(&[2001]);
        let timer = Arc::new(RecordingTimer::new());
        let results = IsomorphicComparison::new(t.clone(), t, ConceptId::new(1))
            .with_guard(private_guard())
            .with_timer(timer.clone())
            .run()
            .unwrap();

        assert!(results.equivalent());
        assert!(timer.last(Checkpoint::FullComparisonComplete).is_some());
    }

    #[test]
    fn deleted_leaf_is_reported_on_the_reference_side() {
        let reference = tree(&[2001, 2002]);
        let comparison = tree(&[2001]);
        let results = IsomorphicComparison::new(reference, comparison, ConceptId::new(1))
            .with_guard(private_guard())
            .run()
            .unwrap();

        assert!(!results.equivalent());
        assert_eq!(results.deletion_root_indices(), vec![4]);
        assert!(results.addition_roots().is_empty());
        assert_eq!(results.deleted_set_elements().len(), 1);
        // nothing to graft: the merge keeps the reference content
        assert_eq!(results.merged_tree().vertex_count(), 5);
    }

    #[test]
    fn config_caps_reach_the_search() {
        let config = IsomorphicConfig {
            initial_soft_cap: 1,
            hard_ceiling: 2,
            ..IsomorphicConfig::default()
        };
        // fresh identities on both sides keep every duplicate contested
        let reference = tree(&[2001, 2001, 2001, 2001]);
        let comparison = tree(&[2001, 2001, 2001, 2001]);
        let results = IsomorphicComparison::new(reference, comparison, ConceptId::new(1))
            .with_config(&config)
            .run()
            .unwrap();

        assert!(results.search_saturated());
        assert!(results.statistics().soft_cap_raises >= 1);
        assert_eq!(results.solution().score(), 7);
    }

    #[test]
    fn explicit_guard_wins_over_config_caps() {
        let config = IsomorphicConfig {
            initial_soft_cap: 1,
            hard_ceiling: 2,
            ..IsomorphicConfig::default()
        };
        let guard = private_guard();
        let results = IsomorphicComparison::new(
            tree(&[2001, 2001, 2001]),
            tree(&[2001, 2001, 2001]),
            ConceptId::new(1),
        )
        .with_config(&config)
        .with_guard(guard.clone())
        .run()
        .unwrap();

        assert!(!results.search_saturated());
        assert_eq!(results.statistics().soft_cap_raises, 0);
        assert_eq!(guard.soft_cap(), 64);
    }

    #[tokio::test]
    async fn background_run_matches_foreground() {
        let reference = tree(&[2001]);
        let comparison = tree(&[2001, 2002]);
        let job = IsomorphicComparison::new(reference, comparison, ConceptId::new(1))
            .with_guard(private_guard());

        let foreground = job.run().unwrap().summary();
        let background = compare_in_background(job).await.unwrap().summary();
        assert_eq!(foreground, background);
    }
}
