//! Engine configuration and the process-wide solution-growth guard.
//!
//! The correlation search keeps a frontier of partial solutions. When the
//! frontier grows past the *soft cap* the search logs a warning and doubles
//! the cap (never beyond the *hard ceiling*); past the hard ceiling it logs an
//! error and flags the result, but keeps going.
//!
//! The soft cap is process-wide state: once raised by one comparison it stays
//! raised for later ones. Lifecycle:
//!
//! 1. `SolutionGrowthGuard::install_global(config)` once at startup (optional;
//!    the first `global()` call installs `IsomorphicConfig::default()`)
//! 2. every comparison reads/raises the cap through an `AtomicUsize`
//!
//! Tests and embedders that need isolation pass their own guard to
//! `IsomorphicComparison::with_guard`.

use crate::error::{IsomorphicError, Result};
use axiograph_ditree::ConceptId;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsomorphicConfig {
    /// Frontier size that triggers the first warning + cap doubling
    pub initial_soft_cap: usize,
    /// Frontier size past which the search is flagged as saturated
    pub hard_ceiling: usize,
    /// Check that no comparison vertex is the image of two reference vertices
    pub verify_unique_images: bool,
}

impl Default for IsomorphicConfig {
    fn default() -> Self {
        Self {
            initial_soft_cap: 1_000,
            hard_ceiling: 1_000_000,
            verify_unique_images: true,
        }
    }
}

impl IsomorphicConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: IsomorphicConfig =
            serde_json::from_str(json).map_err(|e| IsomorphicError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_soft_cap == 0 {
            return Err(IsomorphicError::InvalidConfig(
                "initial_soft_cap must be positive".to_string(),
            ));
        }
        if self.initial_soft_cap > self.hard_ceiling {
            return Err(IsomorphicError::InvalidConfig(format!(
                "initial_soft_cap {} exceeds hard_ceiling {}",
                self.initial_soft_cap, self.hard_ceiling
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Solution-growth guard
// ============================================================================

/// Outcome of checking one frontier size against the guard.
///
/// One observation can both raise the soft cap and exceed the hard ceiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrowthVerdict {
    /// `(from, to)` when this observation raised the soft cap
    pub soft_cap_raised: Option<(usize, usize)>,
    pub hard_ceiling_exceeded: bool,
}

impl GrowthVerdict {
    pub fn is_within(&self) -> bool {
        self.soft_cap_raised.is_none() && !self.hard_ceiling_exceeded
    }
}

#[derive(Debug)]
pub struct SolutionGrowthGuard {
    soft_cap: AtomicUsize,
    hard_ceiling: usize,
}

static GLOBAL_GUARD: OnceLock<Arc<SolutionGrowthGuard>> = OnceLock::new();

impl SolutionGrowthGuard {
    pub fn new(initial_soft_cap: usize, hard_ceiling: usize) -> Self {
        Self {
            soft_cap: AtomicUsize::new(initial_soft_cap.max(1)),
            hard_ceiling: hard_ceiling.max(initial_soft_cap.max(1)),
        }
    }

    pub fn from_config(config: &IsomorphicConfig) -> Self {
        Self::new(config.initial_soft_cap, config.hard_ceiling)
    }

    /// Install the process-wide guard. Fails if one is already installed.
    pub fn install_global(config: &IsomorphicConfig) -> Result<Arc<SolutionGrowthGuard>> {
        config.validate()?;
        let guard = Arc::new(Self::from_config(config));
        GLOBAL_GUARD
            .set(Arc::clone(&guard))
            .map_err(|_| IsomorphicError::InvalidConfig("global guard already installed".into()))?;
        Ok(guard)
    }

    /// The process-wide guard (default config if none was installed).
    pub fn global() -> Arc<SolutionGrowthGuard> {
        Arc::clone(
            GLOBAL_GUARD.get_or_init(|| Arc::new(Self::from_config(&IsomorphicConfig::default()))),
        )
    }

    pub fn soft_cap(&self) -> usize {
        self.soft_cap.load(Ordering::Acquire)
    }

    pub fn hard_ceiling(&self) -> usize {
        self.hard_ceiling
    }

    /// Check a frontier size, raising the soft cap if it was exceeded.
    pub fn observe(&self, candidates: usize, concept: ConceptId) -> GrowthVerdict {
        let mut verdict = GrowthVerdict::default();

        let hard = self.hard_ceiling;
        let raised = self
            .soft_cap
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cap| {
                (candidates > cap && cap < hard).then(|| cap.saturating_mul(2).min(hard))
            });
        if let Ok(from) = raised {
            let to = from.saturating_mul(2).min(hard);
            tracing::warn!(
                concept = %concept,
                candidates,
                from,
                to,
                "correlation frontier exceeded soft cap; raising cap"
            );
            verdict.soft_cap_raised = Some((from, to));
        }

        if candidates > hard {
            tracing::error!(
                concept = %concept,
                candidates,
                hard_ceiling = hard,
                "correlation frontier exceeded hard ceiling; continuing with degraded search"
            );
            verdict.hard_ceiling_exceeded = true;
        }

        verdict
    }
}
