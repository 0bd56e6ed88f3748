//! A hash-based embedder with no model weights: deterministic, CPU-only,
//! and useful for tests and for any deployment that wants Tier B
//! clustering without pulling in the Candle/BGE stack.

use async_trait::async_trait;
use geosignal_error::EmbedError;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::Embedder;

/// Feature-hashes whitespace tokens into a fixed-width vector, then
/// L2-normalizes it. Semantically meaningless beyond exact/near token
/// overlap, but stable across calls and process restarts, which is
/// all the clustering algorithm requires from an `Embedder`.
pub struct DeterministicEmbedder {
    dim: usize,
}

impl DeterministicEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut values = vec![0.0f32; self.dim];
        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dim;
            values[bucket] += 1.0;
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in values.iter_mut() {
                *v /= norm;
            }
        } else {
            values[0] = 1.0;
        }
        values
    }
}

#[async_trait]
impl Embedder for DeterministicEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_always_embeds_identically() {
        let embedder = DeterministicEmbedder::new(16);
        let a = embedder.embed_batch(&["the quick brown fox"]).await.unwrap();
        let b = embedder.embed_batch(&["the quick brown fox"]).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn output_is_unit_normalized() {
        let embedder = DeterministicEmbedder::new(16);
        let vectors = embedder.embed_batch(&["some article body text here"]).await.unwrap();
        let norm: f32 = vectors[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn empty_text_still_yields_a_unit_vector() {
        let embedder = DeterministicEmbedder::new(8);
        let vectors = embedder.embed_batch(&[""]).await.unwrap();
        let norm: f32 = vectors[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
