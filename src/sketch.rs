//! Min-hash sketches for approximate Jaccard similarity.
//!
//! Each collection is condensed into a fixed-size signature: one seeded xxh3
//! hash function per permutation, keeping the minimum hash over all values.
//! The similarity estimate is the fraction of signature positions on which
//! two sketches agree, an unbiased estimator of the true Jaccard similarity
//! of the underlying sets with variance shrinking as the permutation count
//! grows. Comparison cost is O(num_perm), independent of collection size.

use xxhash_rust::xxh3::xxh3_64_with_seed;

pub const DEFAULT_NUM_PERM: usize = 128;

/// Seed spread for independent hash functions, one per signature position.
const SEED_SPREAD: u64 = 0x9E3779B97F4A7C15;

#[derive(Debug, Clone)]
pub struct MinHashSketch {
    signature: Vec<u64>,
    empty: bool,
}

impl MinHashSketch {
    /// Builds a sketch from a collection of values. Order and duplicates are
    /// irrelevant; values are hashed by their string form.
    pub fn build<I, S>(values: I, num_perm: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut signature = vec![u64::MAX; num_perm];
        let mut empty = true;
        for value in values {
            empty = false;
            let bytes = value.as_ref().as_bytes();
            for (position, slot) in signature.iter_mut().enumerate() {
                let seed = SEED_SPREAD.wrapping_mul(position as u64 + 1);
                let hashed = xxh3_64_with_seed(bytes, seed);
                if hashed < *slot {
                    *slot = hashed;
                }
            }
        }
        Self { signature, empty }
    }

    pub fn num_perm(&self) -> usize {
        self.signature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Estimated Jaccard similarity with another sketch. Defined as 0.0 when
    /// either side is empty.
    pub fn jaccard(&self, other: &Self) -> f64 {
        debug_assert_eq!(self.signature.len(), other.signature.len());
        if self.empty || other.empty || self.signature.is_empty() {
            return 0.0;
        }
        let matching = self
            .signature
            .iter()
            .zip(other.signature.iter())
            .filter(|(a, b)| a == b)
            .count();
        matching as f64 / self.signature.len() as f64
    }
}

/// One-shot estimate for two collections sharing a permutation count.
pub fn estimate_similarity<'a, A, B>(a: A, b: B, num_perm: usize) -> f64
where
    A: IntoIterator<Item = &'a str>,
    B: IntoIterator<Item = &'a str>,
{
    MinHashSketch::build(a, num_perm).jaccard(&MinHashSketch::build(b, num_perm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sketch(values: &[&str]) -> MinHashSketch {
        MinHashSketch::build(values.iter().copied(), DEFAULT_NUM_PERM)
    }

    #[test]
    fn identical_collections_have_unit_similarity() {
        let values: Vec<String> = (0..30).map(|i| format!("value-{i}")).collect();
        let a = MinHashSketch::build(values.iter().map(String::as_str), DEFAULT_NUM_PERM);
        let b = MinHashSketch::build(values.iter().map(String::as_str), DEFAULT_NUM_PERM);
        assert_eq!(a.jaccard(&b), 1.0);
    }

    #[test]
    fn empty_collection_yields_zero_on_either_side() {
        let empty = MinHashSketch::build(std::iter::empty::<&str>(), DEFAULT_NUM_PERM);
        let full = sketch(&["a", "b", "c"]);
        assert_eq!(empty.jaccard(&full), 0.0);
        assert_eq!(full.jaccard(&empty), 0.0);
        assert_eq!(empty.jaccard(&empty), 0.0);
    }

    #[test]
    fn duplicates_and_order_do_not_affect_the_estimate() {
        let a = sketch(&["x", "y", "z"]);
        let b = sketch(&["z", "z", "y", "x", "x"]);
        assert_eq!(a.jaccard(&b), 1.0);
    }

    #[test]
    fn disjoint_collections_estimate_near_zero() {
        let a: Vec<String> = (0..50).map(|i| format!("left-{i}")).collect();
        let b: Vec<String> = (0..50).map(|i| format!("right-{i}")).collect();
        let sim = estimate_similarity(
            a.iter().map(String::as_str),
            b.iter().map(String::as_str),
            DEFAULT_NUM_PERM,
        );
        assert!(sim < 0.1, "disjoint sets estimated at {sim:.3}");
    }

    #[test]
    fn half_overlap_estimates_near_true_jaccard() {
        // |A ∩ B| = 50, |A ∪ B| = 150 → true Jaccard = 1/3.
        let a: Vec<String> = (0..100).map(|i| format!("tok-{i}")).collect();
        let b: Vec<String> = (50..200).map(|i| format!("tok-{i}")).collect();
        let sim = estimate_similarity(
            a.iter().map(String::as_str),
            b.iter().map(String::as_str),
            DEFAULT_NUM_PERM,
        );
        assert!(
            (sim - 1.0 / 3.0).abs() < 0.15,
            "expected ≈0.33, estimated {sim:.3}"
        );
    }

    proptest! {
        #[test]
        fn self_similarity_is_one_and_symmetric(values in proptest::collection::vec("[a-z]{1,8}", 1..40)) {
            let a = MinHashSketch::build(values.iter().map(String::as_str), 64);
            let b = MinHashSketch::build(values.iter().rev().map(String::as_str), 64);
            prop_assert_eq!(a.jaccard(&b), 1.0);

            let other: Vec<String> = values.iter().map(|v| format!("{v}!")).collect();
            let c = MinHashSketch::build(other.iter().map(String::as_str), 64);
            prop_assert_eq!(a.jaccard(&c).to_bits(), c.jaccard(&a).to_bits());
        }
    }
}
