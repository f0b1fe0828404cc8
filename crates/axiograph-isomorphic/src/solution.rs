//! Candidate correlation between two trees.

use crate::hash::Fnv1a64;
use roaring::RoaringBitmap;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Sentinel for "reference vertex not correlated".
pub const UNMAPPED: i32 = -1;

/// Immutable reference→comparison index mapping with a precomputed score.
///
/// `mapping[r]` is the comparison index correlated with reference index `r`,
/// or `UNMAPPED`. The score is the number of correlated entries. Equality and
/// hashing follow the mapping content; ordering (score, hash, mapping) exists
/// only for deterministic tie-breaking.
#[derive(Debug, Clone)]
pub struct IndexCorrelationSolution {
    score: usize,
    hash: i64,
    mapping: Vec<i32>,
    images: RoaringBitmap,
}

impl IndexCorrelationSolution {
    pub fn new(mapping: Vec<i32>) -> Self {
        let images: RoaringBitmap = mapping
            .iter()
            .filter(|&&c| c >= 0)
            .map(|&c| c as u32)
            .collect();
        let score = mapping.iter().filter(|&&c| c >= 0).count();
        let hash = Self::compute_hash(score, &mapping);
        Self {
            score,
            hash,
            mapping,
            images,
        }
    }

    /// Nothing correlated yet.
    pub fn unmapped(reference_count: usize) -> Self {
        Self::new(vec![UNMAPPED; reference_count])
    }

    fn compute_hash(score: usize, mapping: &[i32]) -> i64 {
        let mut h = Fnv1a64::new();
        h.write_u64(score as u64);
        for &c in mapping {
            h.write_i32(c);
        }
        h.finish()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn hash_code(&self) -> i64 {
        self.hash
    }

    pub fn mapping(&self) -> &[i32] {
        &self.mapping
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Comparison index correlated with `reference`, if any.
    pub fn get(&self, reference: usize) -> Option<usize> {
        match self.mapping.get(reference) {
            Some(&c) if c >= 0 => Some(c as usize),
            _ => None,
        }
    }

    /// A new solution with `reference → comparison` added (or replaced).
    pub fn with_mapping(&self, reference: usize, comparison: usize) -> Self {
        let mut mapping = self.mapping.clone();
        if let Some(slot) = mapping.get_mut(reference) {
            *slot = comparison as i32;
        }
        Self::new(mapping)
    }

    pub fn is_comparison_index_used(&self, comparison: usize) -> bool {
        self.images.contains(comparison as u32)
    }

    /// Inverse map over `comparison_count` comparison indices.
    pub fn comparison_to_reference(&self, comparison_count: usize) -> Vec<i32> {
        let mut inverse = vec![UNMAPPED; comparison_count];
        for (r, &c) in self.mapping.iter().enumerate() {
            if c >= 0 {
                if let Some(slot) = inverse.get_mut(c as usize) {
                    *slot = r as i32;
                }
            }
        }
        inverse
    }

    /// Comparison indices that are the image of more than one reference index.
    pub fn duplicate_images(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut preimages: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (r, &c) in self.mapping.iter().enumerate() {
            if c >= 0 {
                preimages.entry(c as usize).or_default().push(r);
            }
        }
        preimages.retain(|_, refs| refs.len() > 1);
        preimages
    }
}

impl PartialEq for IndexCorrelationSolution {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.hash == other.hash && self.mapping == other.mapping
    }
}

impl Eq for IndexCorrelationSolution {}

impl Hash for IndexCorrelationSolution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i64(self.hash);
    }
}

impl Ord for IndexCorrelationSolution {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| self.hash.cmp(&other.hash))
            .then_with(|| self.mapping.cmp(&other.mapping))
    }
}

impl PartialOrd for IndexCorrelationSolution {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
