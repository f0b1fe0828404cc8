//! Comparison results.
//!
//! Everything here is derived once from the winning correlation solution and
//! the set diff, then read-only.

use crate::error::{IsomorphicError, Result, TreeRole};
use crate::search::SearchStatistics;
use crate::set_element::{SetDiff, SetElement, SetElementKey};
use crate::solution::IndexCorrelationSolution;
use axiograph_ditree::{ConceptId, DiTree, DiTreeBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Topmost vertex of an unmatched region, with the region extracted.
#[derive(Debug, Clone)]
pub struct RootFragment {
    pub index: usize,
    pub fragment: DiTree,
}

/// A set element with its subtree extracted from the tree named by `role`.
#[derive(Debug, Clone)]
pub struct SetElementFragment {
    pub key: SetElementKey,
    pub vertex: usize,
    pub role: TreeRole,
    pub fragment: DiTree,
}

impl SetElementFragment {
    fn extract(tree: &DiTree, element: &SetElement, role: TreeRole) -> Result<Self> {
        Ok(Self {
            key: element.key.clone(),
            vertex: element.vertex,
            role,
            fragment: tree
                .subtree(element.vertex)
                .map_err(IsomorphicError::tree(role))?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct IsomorphicResults {
    concept: ConceptId,
    reference: Arc<DiTree>,
    comparison: Arc<DiTree>,
    merged: Arc<DiTree>,
    isomorphic: DiTree,
    solution: IndexCorrelationSolution,
    comparison_to_reference: Vec<i32>,
    addition_roots: Vec<RootFragment>,
    deletion_roots: Vec<RootFragment>,
    shared: Vec<SetElementFragment>,
    added: Vec<SetElementFragment>,
    deleted: Vec<SetElementFragment>,
    equivalent: bool,
    statistics: SearchStatistics,
}

/// Everything `IsomorphicResults` is assembled from.
pub(crate) struct ResultParts {
    pub concept: ConceptId,
    pub reference: Arc<DiTree>,
    pub comparison: Arc<DiTree>,
    pub solution: IndexCorrelationSolution,
    pub diff: SetDiff,
    pub statistics: SearchStatistics,
}

impl IsomorphicResults {
    /// Derive the unmatched regions, the isomorphic tree and the set-element
    /// fragments; the merged tree is supplied afterwards by `with_merged`.
    pub(crate) fn assemble(parts: ResultParts) -> Result<Self> {
        let ResultParts {
            concept,
            reference,
            comparison,
            solution,
            diff,
            statistics,
        } = parts;

        let comparison_to_reference = solution.comparison_to_reference(comparison.vertex_count());

        let deletion_indices = topmost_unmatched(&reference, |r| solution.get(r).is_some());
        let addition_indices =
            topmost_unmatched(&comparison, |c| comparison_to_reference[c] >= 0);

        let equivalent = reference.vertex_count() == comparison.vertex_count()
            && solution.score() == reference.vertex_count()
            && addition_indices.is_empty()
            && deletion_indices.is_empty();

        let deletion_roots = fragments(&reference, &deletion_indices, TreeRole::Reference)?;
        let addition_roots = fragments(&comparison, &addition_indices, TreeRole::Comparison)?;

        let shared = diff
            .shared
            .iter()
            .map(|e| SetElementFragment::extract(&reference, e, TreeRole::Reference))
            .collect::<Result<Vec<_>>>()?;
        let deleted = diff
            .deleted
            .iter()
            .map(|e| SetElementFragment::extract(&reference, e, TreeRole::Reference))
            .collect::<Result<Vec<_>>>()?;
        let added = diff
            .added
            .iter()
            .map(|e| SetElementFragment::extract(&comparison, e, TreeRole::Comparison))
            .collect::<Result<Vec<_>>>()?;

        let isomorphic = isomorphic_tree(&reference, &solution)?;

        Ok(Self {
            concept,
            merged: Arc::clone(&reference),
            reference,
            comparison,
            isomorphic,
            solution,
            comparison_to_reference,
            addition_roots,
            deletion_roots,
            shared,
            added,
            deleted,
            equivalent,
            statistics,
        })
    }

    pub(crate) fn with_merged(mut self, merged: Arc<DiTree>) -> Self {
        self.merged = merged;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn concept(&self) -> ConceptId {
        self.concept
    }

    /// No additions and no deletions.
    pub fn equivalent(&self) -> bool {
        self.equivalent
    }

    pub fn reference_tree(&self) -> &Arc<DiTree> {
        &self.reference
    }

    pub fn comparison_tree(&self) -> &Arc<DiTree> {
        &self.comparison
    }

    pub fn merged_tree(&self) -> &Arc<DiTree> {
        &self.merged
    }

    /// Reference vertices correlated with the comparison tree and connected
    /// to the root through correlated vertices.
    pub fn isomorphic_tree(&self) -> &DiTree {
        &self.isomorphic
    }

    pub fn solution(&self) -> &IndexCorrelationSolution {
        &self.solution
    }

    /// Reference index correlated with each comparison index (`-1` if none).
    pub fn comparison_to_reference(&self) -> &[i32] {
        &self.comparison_to_reference
    }

    /// Comparison-side vertices with no reference counterpart (topmost only).
    pub fn addition_roots(&self) -> &[RootFragment] {
        &self.addition_roots
    }

    /// Reference-side vertices with no comparison counterpart (topmost only).
    pub fn deletion_roots(&self) -> &[RootFragment] {
        &self.deletion_roots
    }

    pub fn addition_root_indices(&self) -> Vec<usize> {
        self.addition_roots.iter().map(|r| r.index).collect()
    }

    pub fn deletion_root_indices(&self) -> Vec<usize> {
        self.deletion_roots.iter().map(|r| r.index).collect()
    }

    pub fn shared_set_elements(&self) -> &[SetElementFragment] {
        &self.shared
    }

    pub fn added_set_elements(&self) -> &[SetElementFragment] {
        &self.added
    }

    pub fn deleted_set_elements(&self) -> &[SetElementFragment] {
        &self.deleted
    }

    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// The search outgrew the hard ceiling; the solution may be suboptimal.
    pub fn search_saturated(&self) -> bool {
        self.statistics.hard_ceiling_exceeded
    }

    pub fn summary(&self) -> ComparisonSummary {
        ComparisonSummary {
            concept: self.concept,
            equivalent: self.equivalent,
            score: self.solution.score(),
            reference_vertices: self.reference.vertex_count(),
            comparison_vertices: self.comparison.vertex_count(),
            merged_vertices: self.merged.vertex_count(),
            isomorphic_vertices: self.isomorphic.vertex_count(),
            addition_roots: self.addition_root_indices(),
            deletion_roots: self.deletion_root_indices(),
            shared: keys(&self.shared),
            added: keys(&self.added),
            deleted: keys(&self.deleted),
            statistics: self.statistics.clone(),
        }
    }
}

fn keys(elements: &[SetElementFragment]) -> Vec<SetElementKey> {
    elements.iter().map(|e| e.key.clone()).collect()
}

fn topmost_unmatched(tree: &DiTree, matched: impl Fn(usize) -> bool) -> Vec<usize> {
    (0..tree.vertex_count())
        .filter(|&v| !matched(v))
        .filter(|&v| tree.predecessor(v).map_or(true, &matched))
        .collect()
}

fn fragments(tree: &DiTree, roots: &[usize], role: TreeRole) -> Result<Vec<RootFragment>> {
    roots
        .iter()
        .map(|&index| {
            Ok(RootFragment {
                index,
                fragment: tree.subtree(index).map_err(IsomorphicError::tree(role))?,
            })
        })
        .collect()
}

fn isomorphic_tree(reference: &DiTree, solution: &IndexCorrelationSolution) -> Result<DiTree> {
    let n = reference.vertex_count();
    let mut keep = vec![false; n];
    let mut stack = vec![reference.root_index()];
    while let Some(v) = stack.pop() {
        if solution.get(v).is_none() {
            continue;
        }
        keep[v] = true;
        stack.extend(reference.successors(v).iter().copied());
    }

    let mut builder = DiTreeBuilder::new();
    let mut new_index = vec![None; n];
    for (old, vertex) in reference.vertices().iter().enumerate() {
        if keep[old] {
            new_index[old] = Some(builder.add_vertex_with_id(
                vertex.id(),
                vertex.meaning(),
                vertex.properties().iter().map(|(k, v)| (*k, v.clone())),
            ));
        }
    }

    let to_err = IsomorphicError::tree(TreeRole::Reference);
    for old in 0..n {
        let Some(parent) = new_index[old] else {
            continue;
        };
        for &child in reference.successors(old) {
            if let Some(child) = new_index[child] {
                builder.add_edge(parent, child).map_err(&to_err)?;
            }
        }
    }
    if let Some(root) = new_index[reference.root_index()] {
        builder.set_root(root).map_err(&to_err)?;
    }
    builder.build().map_err(to_err)
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Serialisable digest of a comparison, for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub concept: ConceptId,
    pub equivalent: bool,
    pub score: usize,
    pub reference_vertices: usize,
    pub comparison_vertices: usize,
    pub merged_vertices: usize,
    pub isomorphic_vertices: usize,
    pub addition_roots: Vec<usize>,
    pub deletion_roots: Vec<usize>,
    pub shared: Vec<SetElementKey>,
    pub added: Vec<SetElementKey>,
    pub deleted: Vec<SetElementKey>,
    pub statistics: SearchStatistics,
}

impl ComparisonSummary {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for IsomorphicResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== isomorphic comparison for {} ===", self.concept)?;
        writeln!(
            f,
            "equivalent: {}  score: {}/{}  saturated: {}",
            self.equivalent,
            self.solution.score(),
            self.reference.vertex_count(),
            self.search_saturated()
        )?;

        writeln!(f, "--- reference ---")?;
        write!(f, "{}", self.reference)?;
        writeln!(f, "--- comparison ---")?;
        write!(f, "{}", self.comparison)?;

        writeln!(f, "--- correlation (reference -> comparison) ---")?;
        for (r, c) in self.solution.mapping().iter().enumerate() {
            match usize::try_from(*c) {
                Ok(c) => writeln!(f, "  {r} -> {c}")?,
                Err(_) => writeln!(f, "  {r} -> (unmapped)")?,
            }
        }

        writeln!(f, "--- addition roots ---")?;
        for root in &self.addition_roots {
            write!(f, "{}", root.fragment)?;
        }
        writeln!(f, "--- deletion roots ---")?;
        for root in &self.deletion_roots {
            write!(f, "{}", root.fragment)?;
        }

        for (label, elements) in [
            ("shared", &self.shared),
            ("added", &self.added),
            ("deleted", &self.deleted),
        ] {
            writeln!(f, "--- {label} set elements ---")?;
            for e in elements {
                writeln!(f, "  {} @ {} {}", e.key, e.role, e.vertex)?;
            }
        }

        writeln!(f, "--- merged ---")?;
        write!(f, "{}", self.merged)
    }
}
