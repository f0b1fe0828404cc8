//! Merged-tree construction.
//!
//! The merged tree starts as a verbatim copy of the reference tree; every set
//! element only present in the comparison tree is then grafted in:
//!
//! | enclosing group          | policy                                             |
//! |--------------------------|----------------------------------------------------|
//! | necessary / property set | singleton: graft under the existing group's AND, or graft the whole comparison group under the root if none exists |
//! | sufficient / inclusion   | multi-instance: graft the comparison group under the root unless a vertex with its identity is already present |
//! | data / interval property | unsupported (error)                                |
//!
//! A graft is a `copy_subtree` from the comparison tree followed by one
//! `add_edge` from the target parent to the fragment root. Grafted vertices
//! whose identity is already present in the merged tree get a fresh one, so
//! merged identities stay unique.

use crate::error::{IsomorphicError, Result, TreeRole};
use crate::set_element::{GroupingKind, SetElement};
use axiograph_ditree::well_known::AND;
use ahash::AHashSet;
use axiograph_ditree::{DiTree, DiTreeBuilder, Vertex, VertexId};
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct MergeBuilder<'a> {
    comparison: &'a DiTree,
    builder: DiTreeBuilder,
    root: usize,
    /// Comparison group vertices already grafted wholesale.
    grafted_groups: BTreeSet<usize>,
    grafts: usize,
}

impl<'a> MergeBuilder<'a> {
    pub fn new(reference: &DiTree, comparison: &'a DiTree) -> Result<Self> {
        let mut builder = DiTreeBuilder::new();
        let mapping = builder
            .copy_tree(reference)
            .map_err(IsomorphicError::tree(TreeRole::Merged))?;
        builder
            .set_root(mapping.root())
            .map_err(IsomorphicError::tree(TreeRole::Merged))?;
        Ok(Self {
            comparison,
            builder,
            root: mapping.root(),
            grafted_groups: BTreeSet::new(),
            grafts: 0,
        })
    }

    /// Graft one added set element (taken from the comparison tree).
    pub fn add_element(&mut self, element: &SetElement) -> Result<()> {
        if self.grafted_groups.contains(&element.group) {
            return Ok(());
        }
        if self.comparison.predecessor(element.group).is_none() {
            return Err(IsomorphicError::MissingParentLink {
                role: TreeRole::Comparison,
                vertex: element.group,
            });
        }

        match element.kind() {
            GroupingKind::NecessarySet | GroupingKind::PropertySet => {
                self.add_to_singleton_group(element)
            }
            GroupingKind::SufficientSet | GroupingKind::InclusionSet => {
                self.add_group_instance(element)
            }
            kind @ (GroupingKind::DataPropertySet | GroupingKind::IntervalPropertySet) => {
                Err(IsomorphicError::UnsupportedMergeGrouping {
                    kind,
                    vertex: element.vertex,
                })
            }
        }
    }

    fn add_to_singleton_group(&mut self, element: &SetElement) -> Result<()> {
        let kind = element.kind();
        let groups = self.builder.indices_with_meaning(kind.meaning());
        match groups.as_slice() {
            [] => self.graft_group(element),
            [group] => {
                let group = *group;
                let and = self
                    .builder
                    .successors_of(group)
                    .iter()
                    .copied()
                    .find(|&c| self.builder.meaning_of(c) == Some(AND))
                    .ok_or(IsomorphicError::MissingStructuralChild {
                        role: TreeRole::Merged,
                        vertex: group,
                        expected: AND,
                    })?;
                self.graft(element.vertex, and)?;
                tracing::debug!(
                    kind = %kind,
                    vertex = element.vertex,
                    target = and,
                    "grafted set element into existing group"
                );
                Ok(())
            }
            _ => Err(IsomorphicError::DuplicateSingletonGroup {
                role: TreeRole::Merged,
                kind,
                count: groups.len(),
            }),
        }
    }

    fn add_group_instance(&mut self, element: &SetElement) -> Result<()> {
        let id = self
            .comparison
            .vertex(element.group)
            .map(|g| g.id())
            .ok_or(IsomorphicError::MissingParentLink {
                role: TreeRole::Comparison,
                vertex: element.vertex,
            })?;
        if self.builder.contains_identity(id) {
            return Ok(());
        }
        self.graft_group(element)
    }

    fn graft_group(&mut self, element: &SetElement) -> Result<()> {
        self.graft(element.group, self.root)?;
        self.grafted_groups.insert(element.group);
        tracing::debug!(
            kind = %element.kind(),
            group = element.group,
            "grafted comparison group under merged root"
        );
        Ok(())
    }

    fn graft(&mut self, source: usize, parent: usize) -> Result<()> {
        let first = self.builder.vertex_count();
        let known: AHashSet<VertexId> = (0..first)
            .filter_map(|i| self.builder.vertex(i))
            .map(Vertex::id)
            .collect();

        let mapping = self
            .builder
            .copy_subtree(self.comparison, source)
            .map_err(IsomorphicError::tree(TreeRole::Comparison))?;
        for index in first..self.builder.vertex_count() {
            let clashes = self
                .builder
                .vertex(index)
                .is_some_and(|v| known.contains(&v.id()));
            if clashes {
                let old = self
                    .builder
                    .reidentify(index, VertexId::new_v4())
                    .map_err(IsomorphicError::tree(TreeRole::Merged))?;
                tracing::debug!(vertex = index, %old, "grafted vertex given a fresh identity");
            }
        }
        self.builder
            .add_edge(parent, mapping.root())
            .map_err(IsomorphicError::tree(TreeRole::Merged))?;
        self.grafts += 1;
        Ok(())
    }

    pub fn graft_count(&self) -> usize {
        self.grafts
    }

    pub fn build(self) -> Result<DiTree> {
        self.builder
            .build()
            .map_err(IsomorphicError::tree(TreeRole::Merged))
    }
}

/// Merge `added` (comparison-side set elements, in key order) into `reference`.
///
/// An equivalent pair merges to the reference tree itself.
pub fn merge_trees(
    reference: &Arc<DiTree>,
    comparison: &DiTree,
    added: &[SetElement],
    equivalent: bool,
) -> Result<Arc<DiTree>> {
    if equivalent {
        return Ok(Arc::clone(reference));
    }
    let mut merge = MergeBuilder::new(reference, comparison)?;
    for element in added {
        merge.add_element(element)?;
    }
    let grafts = merge.graft_count();
    let merged = merge.build()?;
    tracing::debug!(
        reference_vertices = reference.vertex_count(),
        merged_vertices = merged.vertex_count(),
        grafts,
        "merged tree built"
    );
    Ok(Arc::new(merged))
}
