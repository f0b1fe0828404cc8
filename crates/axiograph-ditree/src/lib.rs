//! Axiograph DiTree: rooted trees for logical definitions
//!
//! A logical definition (the description-logic axioms that define one concept)
//! is stored as an immutable, rooted, directed tree:
//!
//! ```text
//! DEFINITION_ROOT
//!   └── NECESSARY_SET
//!         └── AND
//!               ├── ROLE_SOME (role type = Has dose form)
//!               │     └── CONCEPT (Oral)
//!               └── CONCEPT (Antibiotic)
//! ```
//!
//! Key properties:
//! 1. **Dense indices**: vertices are addressed by `0..N-1` (arena + index)
//! 2. **Stable identity**: every vertex carries a `VertexId` that survives copies
//! 3. **Single predecessor**: every non-root vertex has exactly one parent
//! 4. **Immutable**: new trees are produced by `DiTreeBuilder`, which copies
//!    vertices from source trees under an explicit old→new index mapping
//!
//! ## Module Organization
//!
//! - `concept`: concept ids, the well-known meaning catalogue, property values
//! - `vertex`: vertices and the content equivalence test
//! - `tree`: the immutable tree plus depth-first traversal
//! - `builder`: tree construction and copy-with-index-map
//! - `logical`: convenience builders for definition shapes

pub mod builder;
pub mod concept;
mod error;
pub mod logical;
pub mod tree;
pub mod vertex;

pub use builder::{DiTreeBuilder, IndexMapping};
pub use concept::{well_known, ConceptId, PropertyValue};
pub use error::TreeError;
pub use tree::{DiTree, TraversalRecord, TreeVisitor};
pub use vertex::{Vertex, VertexId};
