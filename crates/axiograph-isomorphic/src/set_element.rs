//! Set elements and order-independent set diffs.
//!
//! A *set element* is one axiom inside an unordered group:
//!
//! ```text
//! <grouping vertex>            NECESSARY_SET, SUFFICIENT_SET, PROPERTY_SET, …
//!   └── AND
//!         ├── element          ← set element
//!         └── element          ← set element
//! ```
//!
//! Its canonical key ignores tree position entirely: `(grouping kind, sorted
//! deduplicated concept ids referenced by the element or its descendants)`.
//! Diffing key sets therefore treats groups as mathematical sets, so
//! reordering the children of an AND never shows up as a change.

use crate::error::{IsomorphicError, Result, TreeRole};
use crate::hash::Fnv1a64;
use axiograph_ditree::well_known::{
    AND, DATA_PROPERTY_SET, INCLUSION_SET, INTERVAL_PROPERTY_SET, NECESSARY_SET, PROPERTY_SET,
    SUFFICIENT_SET,
};
use axiograph_ditree::{ConceptId, DiTree};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ============================================================================
// Grouping kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupingKind {
    NecessarySet,
    SufficientSet,
    PropertySet,
    DataPropertySet,
    IntervalPropertySet,
    InclusionSet,
}

impl GroupingKind {
    pub const ALL: [GroupingKind; 6] = [
        GroupingKind::NecessarySet,
        GroupingKind::SufficientSet,
        GroupingKind::PropertySet,
        GroupingKind::DataPropertySet,
        GroupingKind::IntervalPropertySet,
        GroupingKind::InclusionSet,
    ];

    pub fn from_meaning(meaning: ConceptId) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.meaning() == meaning)
    }

    pub fn meaning(self) -> ConceptId {
        match self {
            GroupingKind::NecessarySet => NECESSARY_SET,
            GroupingKind::SufficientSet => SUFFICIENT_SET,
            GroupingKind::PropertySet => PROPERTY_SET,
            GroupingKind::DataPropertySet => DATA_PROPERTY_SET,
            GroupingKind::IntervalPropertySet => INTERVAL_PROPERTY_SET,
            GroupingKind::InclusionSet => INCLUSION_SET,
        }
    }
}

impl fmt::Display for GroupingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.meaning())
    }
}

// ============================================================================
// Keys
// ============================================================================

/// Canonical, index-independent key of a set element.
///
/// Ordered by kind, then hash, then concept list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SetElementKey {
    kind: GroupingKind,
    hash: i64,
    concepts: Vec<ConceptId>,
}

impl SetElementKey {
    pub fn new(kind: GroupingKind, concepts: impl IntoIterator<Item = ConceptId>) -> Self {
        let concepts: Vec<ConceptId> = concepts
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut h = Fnv1a64::new();
        h.write_str("kind=");
        h.write_u32(kind.meaning().raw());
        h.write_str("|concepts=");
        for c in &concepts {
            h.write_u32(c.raw());
            h.write_str(";");
        }
        Self {
            kind,
            hash: h.finish(),
            concepts,
        }
    }

    /// Key for `vertex` in `tree`.
    ///
    /// Fails if no ancestor is a grouping vertex, or if more than one is.
    pub fn for_vertex(tree: &DiTree, vertex: usize, role: TreeRole) -> Result<Self> {
        let kind = enclosing_kind(tree, vertex, role)?;
        let mut concepts = BTreeSet::new();
        let mut stack = vec![vertex];
        while let Some(v) = stack.pop() {
            if let Some(vx) = tree.vertex(v) {
                concepts.extend(vx.concept_references());
            }
            stack.extend(tree.successors(v).iter().copied());
        }
        Ok(Self::new(kind, concepts))
    }

    pub fn kind(&self) -> GroupingKind {
        self.kind
    }

    pub fn concepts(&self) -> &[ConceptId] {
        &self.concepts
    }

    pub fn hash_code(&self) -> i64 {
        self.hash
    }
}

impl fmt::Display for SetElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let concepts: Vec<String> = self.concepts.iter().map(|c| c.to_string()).collect();
        write!(f, "({}, {{{}}})", self.kind, concepts.join(", "))
    }
}

fn enclosing_kind(tree: &DiTree, vertex: usize, role: TreeRole) -> Result<GroupingKind> {
    let kinds: Vec<GroupingKind> = tree
        .ancestors(vertex)
        .filter_map(|a| tree.vertex(a))
        .filter_map(|a| GroupingKind::from_meaning(a.meaning()))
        .collect();
    match kinds.as_slice() {
        [] => Err(IsomorphicError::MissingGroupingKind { role, vertex }),
        [kind] => Ok(*kind),
        _ => Err(IsomorphicError::AmbiguousGrouping {
            role,
            vertex,
            kinds,
        }),
    }
}

// ============================================================================
// Per-tree index
// ============================================================================

/// One set element located in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetElement {
    pub key: SetElementKey,
    /// The element vertex
    pub vertex: usize,
    /// The AND directly above it
    pub and_vertex: usize,
    /// The grouping vertex above the AND
    pub group: usize,
}

impl SetElement {
    pub fn kind(&self) -> GroupingKind {
        self.key.kind()
    }
}

/// All set elements of one tree, keyed canonically.
///
/// When several elements share a key the first (lowest index) represents it.
#[derive(Debug, Clone, Default)]
pub struct SetElementIndex {
    by_key: BTreeMap<SetElementKey, SetElement>,
    element_count: usize,
}

impl SetElementIndex {
    pub fn build(tree: &DiTree, role: TreeRole) -> Result<Self> {
        let mut index = SetElementIndex::default();
        for vertex in 0..tree.vertex_count() {
            let Some(and_vertex) = tree.predecessor(vertex) else {
                continue;
            };
            if tree.vertex(and_vertex).map(|v| v.meaning()) != Some(AND) {
                continue;
            }
            let Some(group) = tree.predecessor(and_vertex) else {
                continue;
            };
            let is_grouping = tree
                .vertex(group)
                .and_then(|g| GroupingKind::from_meaning(g.meaning()))
                .is_some();
            if !is_grouping {
                continue;
            }

            let key = SetElementKey::for_vertex(tree, vertex, role)?;
            index.element_count += 1;
            index.by_key.entry(key.clone()).or_insert(SetElement {
                key,
                vertex,
                and_vertex,
                group,
            });
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Elements found, counting duplicates of one key.
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn get(&self, key: &SetElementKey) -> Option<&SetElement> {
        self.by_key.get(key)
    }

    pub fn contains(&self, key: &SetElementKey) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &SetElementKey> {
        self.by_key.keys()
    }

    pub fn elements(&self) -> impl Iterator<Item = &SetElement> {
        self.by_key.values()
    }
}

// ============================================================================
// Diff
// ============================================================================

/// Set-semantics difference between two trees' set elements.
#[derive(Debug, Clone, Default)]
pub struct SetDiff {
    /// In both (represented by the reference element)
    pub shared: Vec<SetElement>,
    /// Only in the comparison tree
    pub added: Vec<SetElement>,
    /// Only in the reference tree
    pub deleted: Vec<SetElement>,
}

impl SetDiff {
    pub fn between(reference: &SetElementIndex, comparison: &SetElementIndex) -> Self {
        let mut diff = SetDiff::default();
        for element in reference.elements() {
            if comparison.contains(&element.key) {
                diff.shared.push(element.clone());
            } else {
                diff.deleted.push(element.clone());
            }
        }
        diff.added = comparison
            .elements()
            .filter(|e| !reference.contains(&e.key))
            .cloned()
            .collect();
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }
}
