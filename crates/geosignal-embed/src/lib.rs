//! Fixed-dimension dense embeddings for non-duplicate article bodies.
//!
//! Grounded directly on the teacher's `ob-semantic-matcher::embedder`
//! (Candle + a BERT-family transformer, CLS pooling, L2-normalize),
//! generalized from "embed a short voice command" to "embed an article
//! body" -- the batching contract and normalization step are unchanged.

mod bge;
mod deterministic;

pub use bge::BgeEmbedder;
pub use deterministic::DeterministicEmbedder;

use async_trait::async_trait;
use geosignal_error::EmbedError;

/// A single pipeline run's embedding backend. `embed_batch` is the
/// only entry point: batching is always explicit so a real model
/// implementation can size its forward pass to `EMBEDDING_BATCH_SIZE`
/// rather than being called one text at a time.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a batch of texts, returning one unit-L2-normalized
    /// vector per input in the same order. Re-embedding the same text
    /// must be idempotent -- callers key the result by `entry_id` in
    /// the content-addressed vector store, not by this call.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;

    fn dim(&self) -> usize;
}

/// Splits `texts` into chunks of at most `batch_size` and calls
/// `embedder.embed_batch` on each, preserving input order. Shared by
/// every embedder so the batching policy lives in one place rather
/// than being reimplemented per backend.
pub async fn embed_all(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, EmbedError> {
    let mut out = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(batch_size.max(1)) {
        let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
        let embeddings = embedder.embed_batch(&refs).await?;
        out.extend(embeddings);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embed_all_preserves_order_across_batch_boundaries() {
        let embedder = DeterministicEmbedder::new(8);
        let texts: Vec<String> = (0..10).map(|i| format!("article body number {i}")).collect();

        let vectors = embed_all(&embedder, &texts, 3).await.unwrap();
        assert_eq!(vectors.len(), 10);

        let direct = embedder
            .embed_batch(&texts.iter().map(String::as_str).collect::<Vec<_>>())
            .await
            .unwrap();
        assert_eq!(vectors, direct);
    }
}
