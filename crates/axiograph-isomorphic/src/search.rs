//! Beam-pruned breadth-first correlation search.
//!
//! ```text
//! seed: reference root ──► comparison root          (score 1)
//!
//! for each reference vertex r, breadth-first:
//!     candidates  = comparison vertices with r's content hash
//!     per partial solution:
//!         valid     = candidates passing the consistency predicate
//!         preferred = identity match, else max leaf-fingerprint overlap
//!                     among candidates not reserved by an identity partner
//!         branch the solution once per preferred candidate
//!     frontier = solutions with the best score at this step
//! ```
//!
//! Consistency of (r, c) against a partial solution:
//! - c is not already the image of another reference vertex
//! - the leaf fingerprints of r and c intersect (cheap pre-check)
//! - r and c are equivalent vertices
//! - their predecessors are correlated identically: both unmapped, or mapped
//!   to each other

use crate::config::{GrowthVerdict, SolutionGrowthGuard};
use crate::solution::IndexCorrelationSolution;
use crate::visit::{fingerprint_overlap, IsomorphicVisitData};
use ahash::AHashMap;
use axiograph_ditree::{ConceptId, DiTree, VertexId};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Counters describing one search run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatistics {
    /// Reference vertices offered for extension
    pub steps: usize,
    /// Largest frontier seen before beam pruning
    pub peak_frontier: usize,
    /// How often this search raised the shared soft cap
    pub soft_cap_raises: usize,
    /// The frontier outgrew the hard ceiling at least once
    pub hard_ceiling_exceeded: bool,
    /// Best-scoring solutions left at the end (ties)
    pub tied_solutions: usize,
}

#[derive(Debug, Clone)]
pub struct CorrelationOutcome {
    pub solution: IndexCorrelationSolution,
    pub statistics: SearchStatistics,
}

pub struct CorrelationSearch<'a> {
    reference: &'a DiTree,
    comparison: &'a DiTree,
    reference_data: &'a IsomorphicVisitData,
    comparison_data: &'a IsomorphicVisitData,
    guard: &'a SolutionGrowthGuard,
    concept: ConceptId,
    /// Reference index owning each identity
    identities: AHashMap<VertexId, usize>,
}

impl<'a> CorrelationSearch<'a> {
    pub fn new(
        reference: &'a DiTree,
        comparison: &'a DiTree,
        reference_data: &'a IsomorphicVisitData,
        comparison_data: &'a IsomorphicVisitData,
        guard: &'a SolutionGrowthGuard,
        concept: ConceptId,
    ) -> Self {
        let identities = reference.vertices().iter().map(|v| (v.id(), v.index())).collect();
        Self {
            reference,
            comparison,
            reference_data,
            comparison_data,
            guard,
            concept,
            identities,
        }
    }

    pub fn run(&self) -> CorrelationOutcome {
        let mut statistics = SearchStatistics::default();
        let root = self.reference.root_index();

        let seed = IndexCorrelationSolution::unmapped(self.reference.vertex_count())
            .with_mapping(root, self.comparison.root_index());
        let mut frontier = vec![seed.clone()];

        let mut processed = RoaringBitmap::new();
        processed.insert(root as u32);
        let mut queue: VecDeque<usize> = self.reference.successors(root).iter().copied().collect();

        while let Some(r) = queue.pop_front() {
            if !processed.insert(r as u32) {
                continue;
            }
            queue.extend(
                self.reference
                    .successors(r)
                    .iter()
                    .copied()
                    .filter(|s| !processed.contains(*s as u32)),
            );
            statistics.steps += 1;

            let hash = self.reference_data.content_hash(r);
            let Some(candidates) = self.comparison_data.indices_with_hash(hash) else {
                continue;
            };

            let mut next: Vec<IndexCorrelationSolution> = Vec::with_capacity(frontier.len());
            for solution in &frontier {
                if solution.get(r).is_some() {
                    next.push(solution.clone());
                    continue;
                }
                let preferred = self.preferred_candidates(solution, r, candidates, &processed);
                if preferred.is_empty() {
                    next.push(solution.clone());
                } else {
                    next.extend(preferred.into_iter().map(|c| solution.with_mapping(r, c)));
                }
            }
            next.sort();
            next.dedup();

            statistics.peak_frontier = statistics.peak_frontier.max(next.len());
            let GrowthVerdict {
                soft_cap_raised,
                hard_ceiling_exceeded,
            } = self.guard.observe(next.len(), self.concept);
            if soft_cap_raised.is_some() {
                statistics.soft_cap_raises += 1;
            }
            statistics.hard_ceiling_exceeded |= hard_ceiling_exceeded;

            let best = next.iter().map(IndexCorrelationSolution::score).max().unwrap_or(0);
            next.retain(|s| s.score() == best);
            frontier = next;
        }

        statistics.tied_solutions = frontier.len();
        let solution = frontier.into_iter().next().unwrap_or(seed);
        tracing::debug!(
            concept = %self.concept,
            score = solution.score(),
            steps = statistics.steps,
            peak_frontier = statistics.peak_frontier,
            tied = statistics.tied_solutions,
            "correlation search finished"
        );
        CorrelationOutcome {
            solution,
            statistics,
        }
    }

    /// Valid candidates for `r`, reduced to the preferred ones.
    ///
    /// A candidate whose identity belongs to another reference vertex that is
    /// still unmapped in `solution` is held back for that vertex.
    fn preferred_candidates(
        &self,
        solution: &IndexCorrelationSolution,
        r: usize,
        candidates: &RoaringBitmap,
        processed: &RoaringBitmap,
    ) -> Vec<usize> {
        let Some(reference_vertex) = self.reference.vertex(r) else {
            return Vec::new();
        };
        let Some(reference_fp) = self.reference_data.leaf_fingerprint(r) else {
            return Vec::new();
        };

        let mut best_overlap = 0usize;
        let mut preferred: Vec<usize> = Vec::new();
        for c in candidates.iter().map(|c| c as usize) {
            if !self.consistent(solution, r, c) {
                continue;
            }
            let Some(comparison_vertex) = self.comparison.vertex(c) else {
                continue;
            };
            if comparison_vertex.id() == reference_vertex.id() {
                return vec![c];
            }
            if self.reserved_for_partner(solution, r, c, processed) {
                continue;
            }
            let overlap = self
                .comparison_data
                .leaf_fingerprint(c)
                .map(|fp| fingerprint_overlap(reference_fp, fp))
                .unwrap_or(0);
            if overlap > best_overlap {
                best_overlap = overlap;
                preferred.clear();
            }
            if overlap == best_overlap {
                preferred.push(c);
            }
        }
        preferred
    }

    /// `c` shares its identity with a reference vertex other than `r` that has
    /// not been offered yet and could still take `c`.
    fn reserved_for_partner(
        &self,
        solution: &IndexCorrelationSolution,
        r: usize,
        c: usize,
        processed: &RoaringBitmap,
    ) -> bool {
        let Some(cv) = self.comparison.vertex(c) else {
            return false;
        };
        let Some(&owner) = self.identities.get(&cv.id()) else {
            return false;
        };
        if owner == r || processed.contains(owner as u32) || solution.get(owner).is_some() {
            return false;
        }
        if self.reference_data.content_hash(owner) != self.comparison_data.content_hash(c) {
            return false;
        }
        if !self.reference.vertex(owner).is_some_and(|ov| ov.equivalent(cv)) {
            return false;
        }
        match (self.reference.predecessor(owner), self.comparison.predecessor(c)) {
            (None, None) => true,
            (Some(po), Some(pc)) => match solution.get(po) {
                Some(mapped) => mapped == pc,
                None => !solution.is_comparison_index_used(pc),
            },
            _ => false,
        }
    }

    fn consistent(&self, solution: &IndexCorrelationSolution, r: usize, c: usize) -> bool {
        if solution.is_comparison_index_used(c) {
            return false;
        }

        let (Some(reference_fp), Some(comparison_fp)) = (
            self.reference_data.leaf_fingerprint(r),
            self.comparison_data.leaf_fingerprint(c),
        ) else {
            return false;
        };
        if reference_fp.is_disjoint(comparison_fp) {
            return false;
        }

        let (Some(rv), Some(cv)) = (self.reference.vertex(r), self.comparison.vertex(c)) else {
            return false;
        };
        if !rv.equivalent(cv) {
            return false;
        }

        match (self.reference.predecessor(r), self.comparison.predecessor(c)) {
            (None, None) => true,
            (Some(pr), Some(pc)) => match solution.get(pr) {
                Some(mapped) => mapped == pc,
                None => !solution.is_comparison_index_used(pc),
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreeRole;
    use axiograph_ditree::well_known::{CONCEPT, CONCEPT_REFERENCE};
    use axiograph_ditree::{DiTreeBuilder, PropertyValue};

    fn run(reference: &DiTree, comparison: &DiTree) -> CorrelationOutcome {
        let rd = IsomorphicVisitData::collect(reference, TreeRole::Reference).unwrap();
        let cd = IsomorphicVisitData::collect(comparison, TreeRole::Comparison).unwrap();
        let guard = SolutionGrowthGuard::new(64, 1_024);
        CorrelationSearch::new(reference, comparison, &rd, &cd, &guard, ConceptId::new(9)).run()
    }

    fn dose_form_tree(extra: Option<(u32, u32)>) -> DiTree {
        let mut b = DiTreeBuilder::new();
        let root = b.definition_root();
        let ns = b.necessary_set(root).unwrap();
        let and = b.and(ns).unwrap();
        let role = b.some_role(and, ConceptId::new(1001)).unwrap();
        b.concept(role, ConceptId::new(2001)).unwrap();
        if let Some((role_type, filler)) = extra {
            let role = b.some_role(and, ConceptId::new(role_type)).unwrap();
            b.concept(role, ConceptId::new(filler)).unwrap();
        }
        b.build().unwrap()
    }

    #[test]
    fn self_comparison_maps_everything() {
        let tree = dose_form_tree(Some((1002, 2002)));
        let outcome = run(&tree, &tree);
        assert_eq!(outcome.solution.score(), tree.vertex_count());
        for r in 0..tree.vertex_count() {
            assert_eq!(outcome.solution.get(r), Some(r));
        }
        assert!(!outcome.statistics.hard_ceiling_exceeded);
    }

    #[test]
    fn independently_built_trees_still_correlate() {
        let reference = dose_form_tree(None);
        let comparison = dose_form_tree(Some((1002, 2002)));
        let outcome = run(&reference, &comparison);
        assert_eq!(outcome.solution.score(), reference.vertex_count());
        assert!(outcome.solution.duplicate_images().is_empty());
    }

    #[test]
    fn changed_filler_is_left_unmapped() {
        let reference = dose_form_tree(Some((1002, 2002)));
        let comparison = dose_form_tree(Some((1002, 2003)));
        let outcome = run(&reference, &comparison);
        // the second role shares no leaf signature with its counterpart
        assert_eq!(outcome.solution.score(), 5);
        assert_eq!(outcome.solution.get(5), None);
        assert_eq!(outcome.solution.get(6), None);
        assert_eq!(outcome.solution.get(3), Some(3));
    }

    #[test]
    fn duplicate_siblings_never_share_an_image() {
        let mut b = DiTreeBuilder::new();
        let root = b.definition_root();
        let ns = b.necessary_set(root).unwrap();
        let and = b.and(ns).unwrap();
        b.concept(and, ConceptId::new(2001)).unwrap();
        b.concept(and, ConceptId::new(2001)).unwrap();
        let reference = b.build().unwrap();

        let mut b = DiTreeBuilder::new();
        let root = b.definition_root();
        let ns = b.necessary_set(root).unwrap();
        let and = b.and(ns).unwrap();
        b.concept(and, ConceptId::new(2001)).unwrap();
        b.concept(and, ConceptId::new(2001)).unwrap();
        let comparison = b.build().unwrap();

        let outcome = run(&reference, &comparison);
        assert_eq!(outcome.solution.score(), 5);
        assert!(outcome.solution.duplicate_images().is_empty());
        assert_eq!(outcome.statistics.tied_solutions, 2);
    }

    #[test]
    fn identity_partner_is_held_back_for_later_sibling() {
        let mut b = DiTreeBuilder::new();
        let root = b.definition_root();
        let ns = b.necessary_set(root).unwrap();
        let and = b.and(ns).unwrap();

        // reference: [fresh, A]
        let mut rb = b.clone();
        rb.concept(and, ConceptId::new(2001)).unwrap();
        let shared = rb.concept(and, ConceptId::new(2001)).unwrap();
        let id_a = rb.vertex(shared).unwrap().id();
        let reference = rb.build().unwrap();

        // comparison: [A, fresh]
        let mut cb = b;
        let a = cb.add_vertex_with_id(
            id_a,
            CONCEPT,
            [(CONCEPT_REFERENCE, PropertyValue::Concept(ConceptId::new(2001)))],
        );
        cb.add_edge(and, a).unwrap();
        cb.concept(and, ConceptId::new(2001)).unwrap();
        let comparison = cb.build().unwrap();

        let outcome = run(&reference, &comparison);
        assert_eq!(outcome.solution.score(), 5);
        assert_eq!(outcome.solution.get(shared), Some(a));
        assert_eq!(outcome.solution.get(3), Some(4));
        assert_eq!(outcome.statistics.tied_solutions, 1);
    }

    #[test]
    fn unreachable_partner_does_not_block_a_candidate() {
        // reference A sits under a different role, so its partner stays free
        let mut b = DiTreeBuilder::new();
        let root = b.definition_root();
        let ns = b.necessary_set(root).unwrap();
        let and = b.and(ns).unwrap();
        let mut rb = b.clone();
        rb.concept(and, ConceptId::new(2001)).unwrap();
        let role = rb.some_role(and, ConceptId::new(1001)).unwrap();
        let shared = rb.concept(role, ConceptId::new(2001)).unwrap();
        let id_a = rb.vertex(shared).unwrap().id();
        let reference = rb.build().unwrap();

        let mut cb = b;
        let a = cb.add_vertex_with_id(
            id_a,
            CONCEPT,
            [(CONCEPT_REFERENCE, PropertyValue::Concept(ConceptId::new(2001)))],
        );
        cb.add_edge(and, a).unwrap();
        let comparison = cb.build().unwrap();

        let outcome = run(&reference, &comparison);
        assert_eq!(outcome.solution.get(3), Some(a));
        assert_eq!(outcome.solution.get(shared), None);
    }

    #[test]
    fn tiny_guard_flags_saturation_without_aborting() {
        let mut b = DiTreeBuilder::new();
        let root = b.definition_root();
        let ns = b.necessary_set(root).unwrap();
        let and = b.and(ns).unwrap();
        for _ in 0..4 {
            b.concept(and, ConceptId::new(2001)).unwrap();
        }
        let tree = b.build().unwrap();
        // fresh identities so identity matching cannot collapse the branching
        let other = {
            let mut c = DiTreeBuilder::new();
            let root = c.definition_root();
            let ns = c.necessary_set(root).unwrap();
            let and = c.and(ns).unwrap();
            for _ in 0..4 {
                c.concept(and, ConceptId::new(2001)).unwrap();
            }
            c.build().unwrap()
        };

        let rd = IsomorphicVisitData::collect(&tree, TreeRole::Reference).unwrap();
        let cd = IsomorphicVisitData::collect(&other, TreeRole::Comparison).unwrap();
        let guard = SolutionGrowthGuard::new(1, 2);
        let outcome =
            CorrelationSearch::new(&tree, &other, &rd, &cd, &guard, ConceptId::new(9)).run();

        assert!(outcome.statistics.hard_ceiling_exceeded);
        assert!(outcome.statistics.soft_cap_raises >= 1);
        assert_eq!(outcome.solution.score(), tree.vertex_count());
        assert_eq!(guard.soft_cap(), 2);
    }
}
