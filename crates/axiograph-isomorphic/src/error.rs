use crate::set_element::GroupingKind;
use axiograph_ditree::{ConceptId, TreeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which input (or output) tree an error or fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeRole {
    Reference,
    Comparison,
    Merged,
}

impl fmt::Display for TreeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeRole::Reference => write!(f, "reference"),
            TreeRole::Comparison => write!(f, "comparison"),
            TreeRole::Merged => write!(f, "merged"),
        }
    }
}

/// Failures of a comparison.
///
/// Every variant except `InvalidConfig` and `TaskFailed` describes a malformed
/// input tree (or an internal invariant breach) and is not recoverable:
/// legitimate differences between trees never surface as errors.
#[derive(Debug, Error)]
pub enum IsomorphicError {
    #[error("{role} tree: vertex {vertex} is not enclosed by a known grouping kind")]
    MissingGroupingKind { role: TreeRole, vertex: usize },

    #[error("{role} tree: vertex {vertex} is enclosed by more than one grouping kind {kinds:?}")]
    AmbiguousGrouping {
        role: TreeRole,
        vertex: usize,
        kinds: Vec<GroupingKind>,
    },

    #[error("{role} tree: expected exactly one {kind} group, found {count}")]
    DuplicateSingletonGroup {
        role: TreeRole,
        kind: GroupingKind,
        count: usize,
    },

    #[error("{role} tree: vertex {vertex} has no {expected} child")]
    MissingStructuralChild {
        role: TreeRole,
        vertex: usize,
        expected: ConceptId,
    },

    #[error("{role} tree: vertex {vertex} has no predecessor to graft against")]
    MissingParentLink { role: TreeRole, vertex: usize },

    #[error("comparison tree: cannot merge set element {vertex} enclosed by {kind}")]
    UnsupportedMergeGrouping { kind: GroupingKind, vertex: usize },

    #[error("correlation maps reference vertices {reference:?} onto comparison vertex {comparison}")]
    DuplicateImage {
        comparison: usize,
        reference: Vec<usize>,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{role} tree: {source}")]
    Tree {
        role: TreeRole,
        #[source]
        source: TreeError,
    },

    #[error("background comparison task failed: {0}")]
    TaskFailed(String),
}

impl IsomorphicError {
    pub(crate) fn tree(role: TreeRole) -> impl Fn(TreeError) -> IsomorphicError {
        move |source| IsomorphicError::Tree { role, source }
    }
}

pub type Result<T> = std::result::Result<T, IsomorphicError>;
