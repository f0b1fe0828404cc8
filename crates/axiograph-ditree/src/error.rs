use thiserror::Error;

/// Errors raised while building or addressing a `DiTree`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("tree has no root vertex")]
    MissingRoot,
    #[error("vertex index {index} out of range (vertex count {count})")]
    UnknownVertex { index: usize, count: usize },
    #[error("vertex {child} already has predecessor {existing}; cannot attach it to {requested}")]
    DuplicatePredecessor {
        child: usize,
        existing: usize,
        requested: usize,
    },
    #[error("root vertex {root} must not have a predecessor")]
    RootHasPredecessor { root: usize },
    #[error("vertex {index} is not reachable from root {root}")]
    Unreachable { index: usize, root: usize },
}
