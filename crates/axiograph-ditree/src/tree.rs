//! The immutable rooted tree and its depth-first traversal.

use crate::builder::DiTreeBuilder;
use crate::concept::ConceptId;
use crate::error::TreeError;
use crate::vertex::{Vertex, VertexId};
use std::fmt;

// ============================================================================
// DiTree
// ============================================================================

/// Rooted, directed, acyclic tree of vertices with dense indices.
///
/// Built only through `DiTreeBuilder::build`, which guarantees that every
/// non-root vertex has exactly one predecessor and is reachable from the root.
#[derive(Debug, Clone)]
pub struct DiTree {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) root: usize,
    pub(crate) successors: Vec<Vec<usize>>,
    pub(crate) predecessors: Vec<Option<usize>>,
}

impl DiTree {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn root(&self) -> &Vertex {
        &self.vertices[self.root]
    }

    pub fn root_index(&self) -> usize {
        self.root
    }

    pub fn vertex(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Children of `index` in insertion order (empty for unknown indices).
    pub fn successors(&self, index: usize) -> &[usize] {
        self.successors
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn predecessor(&self, index: usize) -> Option<usize> {
        self.predecessors.get(index).copied().flatten()
    }

    pub fn is_leaf(&self, index: usize) -> bool {
        self.successors(index).is_empty()
    }

    pub fn find_by_identity(&self, id: VertexId) -> Option<usize> {
        self.vertices.iter().position(|v| v.id() == id)
    }

    pub fn vertices_with_meaning(&self, meaning: ConceptId) -> Vec<usize> {
        self.vertices
            .iter()
            .filter(|v| v.meaning() == meaning)
            .map(Vertex::index)
            .collect()
    }

    /// Ancestors of `index`, nearest first (the vertex itself excluded).
    pub fn ancestors(&self, index: usize) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.predecessor(index),
        }
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<(), TreeError> {
        if index < self.vertices.len() {
            Ok(())
        } else {
            Err(TreeError::UnknownVertex {
                index,
                count: self.vertices.len(),
            })
        }
    }

    /// Extract the fragment rooted at `index` as a new tree.
    ///
    /// Indices are renumbered densely; identities are preserved.
    pub fn subtree(&self, index: usize) -> Result<DiTree, TreeError> {
        self.check_index(index)?;
        let mut builder = DiTreeBuilder::new();
        let mapping = builder.copy_subtree(self, index)?;
        builder.set_root(mapping.root())?;
        builder.build()
    }

    /// Recursive equivalence of two trees, including child order.
    pub fn structurally_equal(&self, other: &DiTree) -> bool {
        if self.vertex_count() != other.vertex_count() {
            return false;
        }
        let mut stack = vec![(self.root, other.root)];
        while let Some((a, b)) = stack.pop() {
            if !self.vertices[a].equivalent(&other.vertices[b]) {
                return false;
            }
            let (sa, sb) = (self.successors(a), other.successors(b));
            if sa.len() != sb.len() {
                return false;
            }
            stack.extend(sa.iter().copied().zip(sb.iter().copied()));
        }
        true
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Depth-first walk from `start`, calling the visitor in pre and post order.
    ///
    /// The returned `TraversalRecord` holds discovery/finish times, depth and
    /// predecessor for every visited vertex.
    pub fn dfs<V: TreeVisitor + ?Sized>(
        &self,
        start: usize,
        visitor: &mut V,
    ) -> Result<TraversalRecord, TreeError> {
        self.check_index(start)?;
        let mut record = TraversalRecord::new(self.vertex_count());
        // (vertex, next child cursor)
        let mut stack: Vec<(usize, usize)> = Vec::new();

        record.discover(start, None, 0);
        visitor.pre_visit(self, start, &record);
        stack.push((start, 0));

        while let Some(top) = stack.last_mut() {
            let (vertex, cursor) = *top;
            let children = self.successors(vertex);
            if cursor < children.len() {
                top.1 += 1;
                let child = children[cursor];
                let depth = record.depth[vertex].unwrap_or(0) + 1;
                record.discover(child, Some(vertex), depth);
                visitor.pre_visit(self, child, &record);
                stack.push((child, 0));
            } else {
                stack.pop();
                record.finish(vertex);
                visitor.post_visit(self, vertex, &record);
            }
        }

        Ok(record)
    }
}

/// Iterator over the ancestors of a vertex.
pub struct Ancestors<'a> {
    tree: &'a DiTree,
    next: Option<usize>,
}

impl Iterator for Ancestors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.tree.predecessor(current);
        Some(current)
    }
}

impl fmt::Display for DiTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.root, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            writeln!(f, "{:indent$}{}", "", self.vertices[index], indent = depth * 2)?;
            for &child in self.successors(index).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Visitor + traversal bookkeeping
// ============================================================================

/// Callbacks for `DiTree::dfs`. Both default to no-ops.
pub trait TreeVisitor {
    fn pre_visit(&mut self, _tree: &DiTree, _vertex: usize, _record: &TraversalRecord) {}

    fn post_visit(&mut self, _tree: &DiTree, _vertex: usize, _record: &TraversalRecord) {}
}

/// Per-vertex bookkeeping produced by one depth-first walk.
#[derive(Debug, Clone, Default)]
pub struct TraversalRecord {
    discovered: Vec<Option<usize>>,
    finished: Vec<Option<usize>>,
    depth: Vec<Option<usize>>,
    predecessor: Vec<Option<usize>>,
    clock: usize,
    visited: usize,
}

impl TraversalRecord {
    fn new(vertex_count: usize) -> Self {
        Self {
            discovered: vec![None; vertex_count],
            finished: vec![None; vertex_count],
            depth: vec![None; vertex_count],
            predecessor: vec![None; vertex_count],
            clock: 0,
            visited: 0,
        }
    }

    fn discover(&mut self, vertex: usize, predecessor: Option<usize>, depth: usize) {
        self.discovered[vertex] = Some(self.clock);
        self.depth[vertex] = Some(depth);
        self.predecessor[vertex] = predecessor;
        self.clock += 1;
        self.visited += 1;
    }

    fn finish(&mut self, vertex: usize) {
        self.finished[vertex] = Some(self.clock);
        self.clock += 1;
    }

    pub fn discovery_time(&self, vertex: usize) -> Option<usize> {
        self.discovered.get(vertex).copied().flatten()
    }

    pub fn finish_time(&self, vertex: usize) -> Option<usize> {
        self.finished.get(vertex).copied().flatten()
    }

    pub fn depth(&self, vertex: usize) -> Option<usize> {
        self.depth.get(vertex).copied().flatten()
    }

    pub fn predecessor(&self, vertex: usize) -> Option<usize> {
        self.predecessor.get(vertex).copied().flatten()
    }

    pub fn visited_count(&self) -> usize {
        self.visited
    }

    pub fn max_depth(&self) -> usize {
        self.depth.iter().flatten().copied().max().unwrap_or(0)
    }
}
