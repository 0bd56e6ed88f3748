use std::collections::HashMap;

use uuid::Uuid;

use crate::minhash::MinHashSignature;

/// Banded LSH index over MinHash signatures, scoped to a single run.
///
/// The signature is sliced into `bands` contiguous groups of `rows`
/// values each; two documents that agree on every value within at
/// least one band are emitted as *candidates* and pay for a full
/// Jaccard-estimate comparison. Documents that share no band are never
/// compared, which is the whole point of banding once the candidate
/// set can't plausibly reach similarity `threshold`.
pub struct LshIndex {
    bands: usize,
    rows: usize,
    buckets: HashMap<(usize, u64), Vec<Uuid>>,
}

impl LshIndex {
    /// `num_hashes` must be divisible by `bands`; `rows = num_hashes /
    /// bands`. 32 bands of 4 rows (128 hashes total) comfortably covers
    /// the default `MINHASH_THRESHOLD` of 0.8.
    pub fn new(num_hashes: usize, bands: usize) -> Self {
        assert!(bands > 0 && num_hashes % bands == 0);
        Self {
            bands,
            rows: num_hashes / bands,
            buckets: HashMap::new(),
        }
    }

    fn band_key(&self, band: usize, signature: &MinHashSignature) -> u64 {
        let start = band * self.rows;
        let slice = &signature.values[start..start + self.rows];
        slice.iter().fold(0xcbf2_9ce4_8422_2325u64, |acc, v| {
            (acc ^ v).wrapping_mul(0x0000_0100_0000_01b3)
        })
    }

    /// Inserts `entry_id` and returns every previously-inserted entry
    /// that shares at least one band with it -- the candidate set a
    /// caller should run the exact Jaccard estimate against.
    pub fn insert(&mut self, entry_id: Uuid, signature: &MinHashSignature) -> Vec<Uuid> {
        let mut candidates: Vec<Uuid> = Vec::new();
        for band in 0..self.bands {
            let key = (band, self.band_key(band, signature));
            let bucket = self.buckets.entry(key).or_default();
            for &existing in bucket.iter() {
                if !candidates.contains(&existing) {
                    candidates.push(existing);
                }
            }
            bucket.push(entry_id);
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_signatures_become_candidates() {
        let sig = MinHashSignature::compute(
            "the quick brown fox jumps over the lazy dog near the river today",
            5,
        );
        let mut index = LshIndex::new(128, 32);
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);

        assert!(index.insert(a, &sig).is_empty());
        let candidates = index.insert(b, &sig);
        assert_eq!(candidates, vec![a]);
    }

    #[test]
    fn unrelated_signatures_rarely_share_a_band() {
        let sig_a = MinHashSignature::compute(
            "economic summit leaders discuss trade tariffs policy reform",
            5,
        );
        let sig_b = MinHashSignature::compute(
            "wildlife photographers capture rare footage of migrating birds",
            5,
        );
        let mut index = LshIndex::new(128, 32);
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);

        index.insert(a, &sig_a);
        let candidates = index.insert(b, &sig_b);
        assert!(candidates.is_empty());
    }
}
