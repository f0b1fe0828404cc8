//! Axiograph Isomorphic: structural comparison and merge of logical definitions
//!
//! Given a *reference* and a *comparison* definition tree for the same concept,
//! this crate finds the best vertex correspondence between them, classifies
//! what changed and builds a merged tree.
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌─────────────┐   ┌────────────┐
//! │ visit data   │──►│ correlation      │──►│ set diff    │──►│ results +  │
//! │ hashes, leaf │   │ search (beam BFS)│   │ (canonical  │   │ merge      │
//! │ fingerprints │   │                  │   │  keys)      │   │            │
//! └──────────────┘   └──────────────────┘   └─────────────┘   └────────────┘
//! ```
//!
//! Key properties:
//! 1. **Content addressed**: candidates are found through a hash of each
//!    vertex's meaning plus every concept referenced on its root path
//! 2. **Beam pruned**: only the best-scoring partial solutions survive a step,
//!    and frontier growth is watched by a process-wide adaptive cap
//! 3. **Order independent**: set elements are diffed by canonical key, so
//!    reordering the children of an AND is never a change
//! 4. **Fail loudly on malformed input**: structural problems are typed
//!    errors; ordinary differences never are
//!
//! ## Module Organization
//!
//! - `visit`: per-tree content hashes and leaf fingerprints
//! - `search`: the correlation search
//! - `solution`: the correlation value type
//! - `set_element`: canonical set-element keys and the set diff
//! - `merge`: merged-tree construction
//! - `results`: assembled results and diagnostics
//! - `comparison`: the entry point (sync and background)
//! - `config`: configuration and the solution-growth guard
//! - `timing`: the optional checkpoint hook

pub mod comparison;
pub mod config;
mod error;
mod hash;
pub mod merge;
pub mod results;
pub mod search;
pub mod set_element;
pub mod solution;
pub mod timing;
pub mod visit;

pub use comparison::{compare_in_background, IsomorphicComparison};
pub use config::{GrowthVerdict, IsomorphicConfig, SolutionGrowthGuard};
pub use error::{IsomorphicError, Result, TreeRole};
pub use hash::{content_hash, UNASSIGNED_HASH};
pub use results::{ComparisonSummary, IsomorphicResults, RootFragment, SetElementFragment};
pub use search::{CorrelationOutcome, CorrelationSearch, SearchStatistics};
pub use set_element::{GroupingKind, SetDiff, SetElement, SetElementIndex, SetElementKey};
pub use solution::{IndexCorrelationSolution, UNMAPPED};
pub use timing::{Checkpoint, ComparisonTimer, RecordingTimer};
pub use visit::IsomorphicVisitData;
