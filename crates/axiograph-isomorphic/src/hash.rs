//! Deterministic content hashing (FNV-1a 64-bit).
//!
//! Same primitive as the `.axi` module digests: cheap, stable across runs and
//! platforms, not a security primitive. Results are `i64` so that `-1` can act
//! as the "unassigned" sentinel; a hash landing on `-1` is perturbed with a
//! salt until it does not.

use axiograph_ditree::ConceptId;
use std::collections::BTreeSet;

/// Sentinel for "no hash assigned". Never produced by this module.
pub const UNASSIGNED_HASH: i64 = -1;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001b3;

#[derive(Debug, Clone)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 ^= *b as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    pub(crate) fn write_str(&mut self, s: &str) {
        self.write(s.as_bytes());
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub(crate) fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Finish, re-salting until the result differs from `UNASSIGNED_HASH`.
    pub(crate) fn finish(&self) -> i64 {
        let mut value = self.0 as i64;
        let mut salt: u32 = 0;
        while value == UNASSIGNED_HASH {
            salt += 1;
            let mut perturbed = self.clone();
            perturbed.write_str("|salt=");
            perturbed.write_u32(salt);
            value = perturbed.0 as i64;
        }
        value
    }
}

/// `hash(meaning, sorted(context))` for one vertex.
///
/// `context` is the set of concept ids referenced at the vertex or any of its
/// ancestors (meanings and concept-valued properties).
pub fn content_hash(meaning: ConceptId, context: &BTreeSet<ConceptId>) -> i64 {
    let mut h = Fnv1a64::new();
    h.write_str("meaning=");
    h.write_u32(meaning.raw());
    h.write_str("|context=");
    for concept in context {
        h.write_u32(concept.raw());
        h.write_str(";");
    }
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_order_free_and_meaning_sensitive() {
        let ctx: BTreeSet<ConceptId> = [3, 1, 2].into_iter().map(ConceptId::new).collect();
        let same: BTreeSet<ConceptId> = [2, 3, 1].into_iter().map(ConceptId::new).collect();
        assert_eq!(
            content_hash(ConceptId::new(1), &ctx),
            content_hash(ConceptId::new(1), &same)
        );
        assert_ne!(
            content_hash(ConceptId::new(1), &ctx),
            content_hash(ConceptId::new(2), &ctx)
        );
    }

    #[test]
    fn finish_never_returns_sentinel() {
        // Force the raw state onto the sentinel and check it is perturbed.
        let forced = Fnv1a64(UNASSIGNED_HASH as u64);
        assert_ne!(forced.finish(), UNASSIGNED_HASH);
    }
}
