//! Tree construction.
//!
//! `DiTreeBuilder` is the only way to produce a `DiTree`. Besides adding fresh
//! vertices it can copy whole trees or fragments from existing trees; every
//! copy returns an `IndexMapping` (source index → new index) so callers can
//! wire new edges against the copied vertices.

use crate::concept::{ConceptId, PropertyValue};
use crate::error::TreeError;
use crate::tree::DiTree;
use crate::vertex::{Vertex, VertexId};
use std::collections::BTreeMap;

/// Old → new index map produced by a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMapping {
    old_to_new: Vec<Option<usize>>,
    root: usize,
}

impl IndexMapping {
    /// New index of the copied fragment's root.
    pub fn root(&self) -> usize {
        self.root
    }

    pub fn get(&self, old: usize) -> Option<usize> {
        self.old_to_new.get(old).copied().flatten()
    }

    pub fn copied_count(&self) -> usize {
        self.old_to_new.iter().flatten().count()
    }
}

/// Mutable, in-progress tree.
#[derive(Debug, Clone, Default)]
pub struct DiTreeBuilder {
    vertices: Vec<Vertex>,
    root: Option<usize>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Option<usize>>,
}

impl DiTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Vertices and edges
    // ========================================================================

    /// Add a vertex with a fresh identity; returns its index.
    pub fn add_vertex<I>(&mut self, meaning: ConceptId, properties: I) -> usize
    where
        I: IntoIterator<Item = (ConceptId, PropertyValue)>,
    {
        self.add_vertex_with_id(VertexId::new_v4(), meaning, properties)
    }

    /// Add a vertex with a caller-chosen identity; returns its index.
    pub fn add_vertex_with_id<I>(&mut self, id: VertexId, meaning: ConceptId, properties: I) -> usize
    where
        I: IntoIterator<Item = (ConceptId, PropertyValue)>,
    {
        let index = self.vertices.len();
        let properties: BTreeMap<ConceptId, PropertyValue> = properties.into_iter().collect();
        self.push(Vertex::new(id, index, meaning, properties))
    }

    fn push(&mut self, vertex: Vertex) -> usize {
        let index = vertex.index();
        self.vertices.push(vertex);
        self.successors.push(Vec::new());
        self.predecessors.push(None);
        index
    }

    pub fn set_root(&mut self, index: usize) -> Result<(), TreeError> {
        self.check_index(index)?;
        self.root = Some(index);
        Ok(())
    }

    /// Wire `parent → child`. A child may receive only one predecessor.
    pub fn add_edge(&mut self, parent: usize, child: usize) -> Result<(), TreeError> {
        self.check_index(parent)?;
        self.check_index(child)?;
        if let Some(existing) = self.predecessors[child] {
            return Err(TreeError::DuplicatePredecessor {
                child,
                existing,
                requested: parent,
            });
        }
        self.predecessors[child] = Some(parent);
        self.successors[parent].push(child);
        Ok(())
    }

    /// Replace the identity of the vertex at `index`; returns the old one.
    pub fn reidentify(&mut self, index: usize, id: VertexId) -> Result<VertexId, TreeError> {
        self.check_index(index)?;
        let old = self.vertices[index].id();
        self.vertices[index] = self.vertices[index].with_id(id);
        Ok(old)
    }

    /// Add a fresh vertex and attach it under `parent`.
    pub fn add_child<I>(
        &mut self,
        parent: usize,
        meaning: ConceptId,
        properties: I,
    ) -> Result<usize, TreeError>
    where
        I: IntoIterator<Item = (ConceptId, PropertyValue)>,
    {
        self.check_index(parent)?;
        let child = self.add_vertex(meaning, properties);
        self.add_edge(parent, child)?;
        Ok(child)
    }

    // ========================================================================
    // Copy-with-index-map
    // ========================================================================

    /// Copy every vertex and edge of `source`.
    ///
    /// Relative index order is preserved, so copying into an empty builder
    /// reproduces the source indices exactly. The root of the builder is left
    /// untouched; callers that want a verbatim copy set it from
    /// `mapping.root()`.
    pub fn copy_tree(&mut self, source: &DiTree) -> Result<IndexMapping, TreeError> {
        self.copy_subtree(source, source.root_index())
    }

    /// Copy the fragment of `source` rooted at `index`.
    ///
    /// Copied vertices keep their identity, their relative index order and
    /// their child order. The fragment root is left without a predecessor so
    /// it can be grafted with a single `add_edge`.
    pub fn copy_subtree(&mut self, source: &DiTree, index: usize) -> Result<IndexMapping, TreeError> {
        source.check_index(index)?;

        let mut members = vec![false; source.vertex_count()];
        let mut stack = vec![index];
        while let Some(v) = stack.pop() {
            members[v] = true;
            stack.extend(source.successors(v).iter().copied());
        }

        let mut old_to_new = vec![None; source.vertex_count()];
        for (old, _) in members.iter().enumerate().filter(|(_, m)| **m) {
            let new = self.vertices.len();
            self.push(source.vertices[old].reindexed(new));
            old_to_new[old] = Some(new);
        }

        for (old, _) in members.iter().enumerate().filter(|(_, m)| **m) {
            let Some(parent) = old_to_new[old] else {
                continue;
            };
            for &child in source.successors(old) {
                if let Some(new_child) = old_to_new[child] {
                    self.add_edge(parent, new_child)?;
                }
            }
        }

        let root = old_to_new[index].ok_or(TreeError::UnknownVertex {
            index,
            count: source.vertex_count(),
        })?;
        Ok(IndexMapping { old_to_new, root })
    }

    // ========================================================================
    // Queries over the in-progress tree
    // ========================================================================

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn vertex(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    pub fn meaning_of(&self, index: usize) -> Option<ConceptId> {
        self.vertices.get(index).map(Vertex::meaning)
    }

    pub fn successors_of(&self, index: usize) -> &[usize] {
        self.successors
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains_identity(&self, id: VertexId) -> bool {
        self.vertices.iter().any(|v| v.id() == id)
    }

    pub fn indices_with_meaning(&self, meaning: ConceptId) -> Vec<usize> {
        self.vertices
            .iter()
            .filter(|v| v.meaning() == meaning)
            .map(Vertex::index)
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<(), TreeError> {
        if index < self.vertices.len() {
            Ok(())
        } else {
            Err(TreeError::UnknownVertex {
                index,
                count: self.vertices.len(),
            })
        }
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Validate and freeze the tree.
    pub fn build(self) -> Result<DiTree, TreeError> {
        let root = self.root.ok_or(TreeError::MissingRoot)?;
        if self.predecessors[root].is_some() {
            return Err(TreeError::RootHasPredecessor { root });
        }

        let mut reached = vec![false; self.vertices.len()];
        let mut stack = vec![root];
        while let Some(v) = stack.pop() {
            reached[v] = true;
            stack.extend(self.successors[v].iter().copied());
        }
        if let Some(index) = reached.iter().position(|r| !r) {
            return Err(TreeError::Unreachable { index, root });
        }

        Ok(DiTree {
            vertices: self.vertices,
            root,
            successors: self.successors,
            predecessors: self.predecessors,
        })
    }
}
