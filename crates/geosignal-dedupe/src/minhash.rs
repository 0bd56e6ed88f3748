use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::canonical::canonicalize;

/// Number of hash functions in a signature. 128 is a common default
/// that keeps the Jaccard estimate's standard error small (~1/sqrt(128)
/// ≈ 0.09) while staying cheap to compute per document.
const NUM_HASHES: usize = 128;

/// A 61-bit Mersenne prime, used as the modulus for the universal hash
/// family `(a*x + b) mod P`.
const MERSENNE_PRIME: u64 = (1u64 << 61) - 1;

/// Fixed seed so permutation coefficients -- and therefore every
/// signature this process ever computes -- are reproducible across
/// runs and processes. The seed is not a secret; it only needs to be
/// stable.
const PERMUTATION_SEED: u64 = 0x6765_6f73_6967_6e61;

struct Permutation {
    a: u64,
    b: u64,
}

static PERMUTATIONS: Lazy<Vec<Permutation>> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(PERMUTATION_SEED);
    (0..NUM_HASHES)
        .map(|_| Permutation {
            a: rng.gen_range(1..MERSENNE_PRIME),
            b: rng.gen_range(0..MERSENNE_PRIME),
        })
        .collect()
});

/// FNV-1a, used only to turn a shingle string into a base integer
/// before it is run through the permutation family. Not
/// cryptographic; it doesn't need to be.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Word-level k-shingles of the canonicalized text.
fn shingles(text: &str, k: usize) -> Vec<String> {
    let canon = canonicalize(text);
    let words: Vec<&str> = canon.split_whitespace().collect();
    if words.len() < k {
        return vec![words.join(" ")];
    }
    words.windows(k).map(|w| w.join(" ")).collect()
}

/// A document's MinHash signature: for each of [`NUM_HASHES`]
/// permutations, the minimum permuted hash value over all of the
/// document's shingles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinHashSignature {
    pub values: Vec<u64>,
}

impl MinHashSignature {
    pub fn compute(text: &str, shingle_size: usize) -> Self {
        let shingle_set = shingles(text, shingle_size);
        let base_hashes: Vec<u64> = shingle_set.iter().map(|s| fnv1a(s.as_bytes())).collect();

        let values = PERMUTATIONS
            .iter()
            .map(|perm| {
                base_hashes
                    .iter()
                    .map(|&x| {
                        ((perm.a as u128 * x as u128 + perm.b as u128) % MERSENNE_PRIME as u128)
                            as u64
                    })
                    .min()
                    .unwrap_or(0)
            })
            .collect();

        Self { values }
    }

    /// Serialized form persisted on the job row's `minhash_signature`
    /// reference.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let values = bytes
            .chunks_exact(8)
            .map(|chunk| u64::from_le_bytes(chunk.try_into().unwrap()))
            .collect();
        Self { values }
    }

    /// Fraction of hash slots that agree -- the standard MinHash
    /// estimator of the Jaccard similarity between the two shingle sets.
    pub fn estimate_jaccard(&self, other: &MinHashSignature) -> f64 {
        if self.values.is_empty() || other.values.is_empty() {
            return 0.0;
        }
        let matches = self
            .values
            .iter()
            .zip(other.values.iter())
            .filter(|(a, b)| a == b)
            .count();
        matches as f64 / self.values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_have_identical_signatures() {
        let a = MinHashSignature::compute("The quick brown fox jumps over the lazy dog", 5);
        let b = MinHashSignature::compute("the   quick brown fox jumps over the lazy dog", 5);
        assert_eq!(a, b);
        assert_eq!(a.estimate_jaccard(&b), 1.0);
    }

    #[test]
    fn disjoint_texts_have_low_similarity() {
        let a = MinHashSignature::compute(
            "economic summit leaders discuss trade tariffs policy reform across continents",
            5,
        );
        let b = MinHashSignature::compute(
            "wildlife photographers capture rare footage of migrating arctic birds overhead",
            5,
        );
        assert!(a.estimate_jaccard(&b) < 0.3);
    }

    #[test]
    fn near_duplicate_paraphrase_scores_high() {
        let a = MinHashSignature::compute(
            "the president announced a new economic policy aimed at reducing inflation across the country today",
            5,
        );
        let b = MinHashSignature::compute(
            "the president announced a new economic policy aimed at reducing inflation across the country this week",
            5,
        );
        assert!(a.estimate_jaccard(&b) >= 0.7, "expected high similarity for near-paraphrase");
    }

    #[test]
    fn signature_round_trips_through_bytes() {
        let sig = MinHashSignature::compute("round trip this signature through bytes please", 5);
        let bytes = sig.to_bytes();
        let restored = MinHashSignature::from_bytes(&bytes);
        assert_eq!(sig, restored);
    }
}
