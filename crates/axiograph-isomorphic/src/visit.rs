//! Per-tree visit data for the correlation search.
//!
//! Built in one depth-first walk:
//!
//! - **pre-order**: accumulate the concept context from the root, compute the
//!   vertex content hash, and register the vertex under that hash
//! - **post-order**: fold leaf-index bitmaps bottom-up and derive each
//!   vertex's leaf fingerprint (content hashes of every leaf below it)
//!
//! The data is scratch state for a single comparison.

use crate::error::{IsomorphicError, Result, TreeRole};
use crate::hash::{content_hash, UNASSIGNED_HASH};
use ahash::AHashMap;
use axiograph_ditree::{ConceptId, DiTree, TraversalRecord, TreeVisitor};
use roaring::RoaringBitmap;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct IsomorphicVisitData {
    traversal: TraversalRecord,
    contexts: Vec<BTreeSet<ConceptId>>,
    hashes: Vec<i64>,
    by_hash: AHashMap<i64, RoaringBitmap>,
    leaf_indices: Vec<RoaringBitmap>,
    leaf_fingerprints: Vec<BTreeSet<i64>>,
}

impl IsomorphicVisitData {
    pub fn collect(tree: &DiTree, role: TreeRole) -> Result<Self> {
        let mut collector = Collector::new(tree.vertex_count());
        let traversal = tree
            .dfs(tree.root_index(), &mut collector)
            .map_err(IsomorphicError::tree(role))?;
        Ok(Self {
            traversal,
            contexts: collector.contexts,
            hashes: collector.hashes,
            by_hash: collector.by_hash,
            leaf_indices: collector.leaf_indices,
            leaf_fingerprints: collector.leaf_fingerprints,
        })
    }

    pub fn traversal(&self) -> &TraversalRecord {
        &self.traversal
    }

    /// Content hash of `vertex`, or `UNASSIGNED_HASH` if it was never visited.
    pub fn content_hash(&self, vertex: usize) -> i64 {
        self.hashes.get(vertex).copied().unwrap_or(UNASSIGNED_HASH)
    }

    pub fn context(&self, vertex: usize) -> Option<&BTreeSet<ConceptId>> {
        self.contexts.get(vertex)
    }

    /// Vertex indices sharing `hash`.
    pub fn indices_with_hash(&self, hash: i64) -> Option<&RoaringBitmap> {
        self.by_hash.get(&hash)
    }

    pub fn distinct_hash_count(&self) -> usize {
        self.by_hash.len()
    }

    pub fn leaf_indices(&self, vertex: usize) -> Option<&RoaringBitmap> {
        self.leaf_indices.get(vertex)
    }

    pub fn leaf_fingerprint(&self, vertex: usize) -> Option<&BTreeSet<i64>> {
        self.leaf_fingerprints.get(vertex)
    }
}

/// Number of leaf signatures shared by two fingerprints.
pub fn fingerprint_overlap(a: &BTreeSet<i64>, b: &BTreeSet<i64>) -> usize {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter(|h| large.contains(h)).count()
}

struct Collector {
    contexts: Vec<BTreeSet<ConceptId>>,
    hashes: Vec<i64>,
    by_hash: AHashMap<i64, RoaringBitmap>,
    leaf_indices: Vec<RoaringBitmap>,
    leaf_fingerprints: Vec<BTreeSet<i64>>,
}

impl Collector {
    fn new(vertex_count: usize) -> Self {
        Self {
            contexts: vec![BTreeSet::new(); vertex_count],
            hashes: vec![UNASSIGNED_HASH; vertex_count],
            by_hash: AHashMap::new(),
            leaf_indices: vec![RoaringBitmap::new(); vertex_count],
            leaf_fingerprints: vec![BTreeSet::new(); vertex_count],
        }
    }
}

impl TreeVisitor for Collector {
    fn pre_visit(&mut self, tree: &DiTree, vertex: usize, record: &TraversalRecord) {
        let Some(v) = tree.vertex(vertex) else {
            return;
        };
        let mut context = record
            .predecessor(vertex)
            .map(|p| self.contexts[p].clone())
            .unwrap_or_default();
        context.insert(v.meaning());
        context.extend(v.concept_references());

        let hash = content_hash(v.meaning(), &context);
        self.hashes[vertex] = hash;
        self.by_hash
            .entry(hash)
            .or_insert_with(RoaringBitmap::new)
            .insert(vertex as u32);
        self.contexts[vertex] = context;
    }

    fn post_visit(&mut self, tree: &DiTree, vertex: usize, record: &TraversalRecord) {
        if tree.is_leaf(vertex) {
            self.leaf_indices[vertex].insert(vertex as u32);
        }
        let hashes = &self.hashes;
        self.leaf_fingerprints[vertex] = self.leaf_indices[vertex]
            .iter()
            .map(|leaf| hashes[leaf as usize])
            .collect();
        if let Some(parent) = record.predecessor(vertex) {
            let leaves = self.leaf_indices[vertex].clone();
            self.leaf_indices[parent] |= &leaves;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axiograph_ditree::DiTreeBuilder;

    #[test]
    fn shared_context_gives_shared_hash() {
        let mut b = DiTreeBuilder::new();
        let root = b.definition_root();
        let ns = b.necessary_set(root).unwrap();
        let and = b.and(ns).unwrap();
        let left = b.concept(and, ConceptId::new(2001)).unwrap();
        let right = b.concept(and, ConceptId::new(2001)).unwrap();
        let other = b.concept(and, ConceptId::new(2002)).unwrap();
        let tree = b.build().unwrap();

        let data = IsomorphicVisitData::collect(&tree, TreeRole::Reference).unwrap();
        assert_eq!(data.content_hash(left), data.content_hash(right));
        assert_ne!(data.content_hash(left), data.content_hash(other));

        let bucket = data.indices_with_hash(data.content_hash(left)).unwrap();
        assert_eq!(bucket.iter().collect::<Vec<_>>(), vec![left as u32, right as u32]);
        assert_eq!(data.distinct_hash_count(), 5);
    }

    #[test]
    fn leaf_fingerprints_fold_bottom_up() {
        let mut b = DiTreeBuilder::new();
        let root = b.definition_root();
        let ns = b.necessary_set(root).unwrap();
        let and = b.and(ns).unwrap();
        let role = b.some_role(and, ConceptId::new(1001)).unwrap();
        let oral = b.concept(role, ConceptId::new(2001)).unwrap();
        let isa = b.concept(and, ConceptId::new(2002)).unwrap();
        let tree = b.build().unwrap();

        let data = IsomorphicVisitData::collect(&tree, TreeRole::Reference).unwrap();
        let root_leaves: Vec<u32> = data.leaf_indices(root).unwrap().iter().collect();
        assert_eq!(root_leaves, vec![oral as u32, isa as u32]);

        let role_fp = data.leaf_fingerprint(role).unwrap();
        assert_eq!(role_fp.len(), 1);
        assert!(role_fp.contains(&data.content_hash(oral)));
        assert_eq!(
            fingerprint_overlap(data.leaf_fingerprint(root).unwrap(), role_fp),
            1
        );
    }

    #[test]
    fn context_accumulates_from_root() {
        let mut b = DiTreeBuilder::new();
        let root = b.definition_root();
        let ns = b.necessary_set(root).unwrap();
        let and = b.and(ns).unwrap();
        let role = b.some_role(and, ConceptId::new(1001)).unwrap();
        let filler = b.concept(role, ConceptId::new(2001)).unwrap();
        let tree = b.build().unwrap();

        let data = IsomorphicVisitData::collect(&tree, TreeRole::Reference).unwrap();
        let ctx = data.context(filler).unwrap();
        assert!(ctx.contains(&ConceptId::new(1001)));
        assert!(ctx.contains(&ConceptId::new(2001)));
        assert!(ctx.contains(&axiograph_ditree::well_known::NECESSARY_SET));
        assert!(!data.context(role).unwrap().contains(&ConceptId::new(2001)));
    }
}
