//! Two-level content addressing over a run's extracted article bodies:
//! exact SHA-256 collision, then MinHash/LSH near-duplicate detection
//! for the survivors. Scoped to a single run -- a fresh [`DedupeIndex`]
//! is built per `run()` call, per spec.md §4.5.

mod canonical;
mod lsh;
mod minhash;

pub use canonical::{canonicalize, content_hash};
pub use minhash::MinHashSignature;

use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use lsh::LshIndex;

const DEFAULT_NUM_HASHES: usize = 128;
const DEFAULT_LSH_BANDS: usize = 32;

/// The dedupe verdict persisted on a job row.
#[derive(Debug, Clone, PartialEq)]
pub enum DedupeVerdict {
    Unique {
        content_hash: String,
        minhash_signature: Vec<u8>,
    },
    Duplicate {
        of: Uuid,
        content_hash: String,
    },
}

impl DedupeVerdict {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    pub fn content_hash(&self) -> &str {
        match self {
            Self::Unique { content_hash, .. } => content_hash,
            Self::Duplicate { content_hash, .. } => content_hash,
        }
    }
}

/// Exact + near-duplicate detector over one run's extracted bodies.
pub struct DedupeIndex {
    threshold: f64,
    shingle_size: usize,
}

impl DedupeIndex {
    pub fn new(minhash_threshold: f64, shingle_size: usize) -> Self {
        Self {
            threshold: minhash_threshold,
            shingle_size,
        }
    }

    /// Classifies every `(entry_id, extracted_text)` pair.
    ///
    /// Processes in ascending `entry_id` order regardless of the input
    /// order so that the duplicate-representative choice is
    /// deterministic (spec.md §9: "implementations must sort
    /// explicitly"). Returns a verdict per input entry.
    pub fn classify(&self, entries: &[(Uuid, String)]) -> BTreeMap<Uuid, DedupeVerdict> {
        let mut sorted: Vec<&(Uuid, String)> = entries.iter().collect();
        sorted.sort_by_key(|(id, _)| *id);

        let mut exact_hashes: HashMap<String, Uuid> = HashMap::new();
        let mut verdicts: BTreeMap<Uuid, DedupeVerdict> = BTreeMap::new();
        let mut survivors: Vec<(Uuid, &str)> = Vec::new();

        for (id, text) in sorted.iter() {
            let hash = content_hash(text);
            match exact_hashes.get(&hash) {
                Some(&winner) => {
                    verdicts.insert(
                        *id,
                        DedupeVerdict::Duplicate {
                            of: winner,
                            content_hash: hash,
                        },
                    );
                }
                None => {
                    exact_hashes.insert(hash, *id);
                    survivors.push((*id, text.as_str()));
                }
            }
        }

        let mut lsh = LshIndex::new(DEFAULT_NUM_HASHES, DEFAULT_LSH_BANDS);
        let mut signatures: HashMap<Uuid, MinHashSignature> = HashMap::new();
        let mut duplicate_of: HashMap<Uuid, Uuid> = HashMap::new();

        for (id, text) in survivors.iter() {
            let signature = MinHashSignature::compute(text, self.shingle_size);
            let candidates = lsh.insert(*id, &signature);

            let matched = candidates.into_iter().find_map(|candidate| {
                let representative = duplicate_of.get(&candidate).copied().unwrap_or(candidate);
                signatures
                    .get(&representative)
                    .filter(|rep_sig| signature.estimate_jaccard(rep_sig) >= self.threshold)
                    .map(|_| representative)
            });

            signatures.insert(*id, signature);
            if let Some(representative) = matched {
                duplicate_of.insert(*id, representative);
            }
        }

        for (id, text) in survivors {
            let hash = content_hash(text);
            match duplicate_of.get(&id) {
                Some(&representative) => {
                    verdicts.insert(
                        id,
                        DedupeVerdict::Duplicate {
                            of: representative,
                            content_hash: hash,
                        },
                    );
                }
                None => {
                    let signature = signatures.get(&id).expect("signature computed above");
                    verdicts.insert(
                        id,
                        DedupeVerdict::Unique {
                            content_hash: hash,
                            minhash_signature: signature.to_bytes(),
                        },
                    );
                }
            }
        }

        verdicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn exact_duplicates_pick_smallest_entry_id_as_representative() {
        let index = DedupeIndex::new(0.8, 5);
        let text = "the quick brown fox jumps over the lazy dog near the riverbank at dawn";
        let entries = vec![
            (uuid(3), text.to_string()),
            (uuid(1), text.to_string()),
            (uuid(2), text.to_string()),
        ];

        let verdicts = index.classify(&entries);
        assert!(matches!(
            verdicts[&uuid(1)],
            DedupeVerdict::Unique { .. }
        ));
        assert_eq!(
            verdicts[&uuid(2)],
            DedupeVerdict::Duplicate {
                of: uuid(1),
                content_hash: content_hash(text)
            }
        );
        assert_eq!(
            verdicts[&uuid(3)],
            DedupeVerdict::Duplicate {
                of: uuid(1),
                content_hash: content_hash(text)
            }
        );
    }

    #[test]
    fn near_duplicates_mark_higher_entry_id_as_duplicate() {
        let index = DedupeIndex::new(0.8, 5);
        let a = "the central bank raised interest rates by half a point to curb inflation this quarter";
        let b = "the central bank raised interest rates by half a point to curb inflation this year";
        let entries = vec![(uuid(2), b.to_string()), (uuid(3), a.to_string())];

        let verdicts = index.classify(&entries);
        assert!(matches!(verdicts[&uuid(2)], DedupeVerdict::Unique { .. }));
        assert!(matches!(
            verdicts[&uuid(3)],
            DedupeVerdict::Duplicate { of, .. } if of == uuid(2)
        ));
    }

    #[test]
    fn distinct_articles_are_both_unique() {
        let index = DedupeIndex::new(0.8, 5);
        let entries = vec![
            (
                uuid(1),
                "parliament votes on the new trade agreement after months of negotiation".to_string(),
            ),
            (
                uuid(2),
                "scientists discover a new species of deep sea fish near the volcanic vents".to_string(),
            ),
        ];

        let verdicts = index.classify(&entries);
        assert!(verdicts.values().all(|v| !v.is_duplicate()));
    }
}
