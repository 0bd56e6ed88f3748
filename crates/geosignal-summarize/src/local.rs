use std::sync::Arc;

use tokio::sync::Semaphore;
use uuid::Uuid;

/// Per-article summarizer, capped at roughly `max_tokens` tokens of
/// output. Deterministic given the same input (spec.md §4.8).
pub trait LocalSummarizer: Send + Sync {
    fn summarize(&self, text: &str, max_tokens: usize) -> String;
}

/// Leading-sentence extractive summarizer: takes whole sentences from
/// the start of the body until the token budget would be exceeded.
/// News bodies lead with the most salient facts, so this is a cheap,
/// deterministic stand-in for a real extractive/abstractive model
/// with the same contract.
pub struct LeadingSentenceSummarizer;

impl LocalSummarizer for LeadingSentenceSummarizer {
    fn summarize(&self, text: &str, max_tokens: usize) -> String {
        let sentences = split_sentences(text);
        let mut out = String::new();
        let mut tokens_used = 0usize;

        for sentence in sentences {
            let sentence_tokens = sentence.split_whitespace().count();
            if tokens_used > 0 && tokens_used + sentence_tokens > max_tokens {
                break;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(sentence.trim());
            tokens_used += sentence_tokens;
            if tokens_used >= max_tokens {
                break;
            }
        }

        if out.is_empty() {
            let truncated: String = text.split_whitespace().take(max_tokens).collect::<Vec<_>>().join(" ");
            return truncated;
        }
        out
    }
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'.' || b == b'!' || b == b'?' {
            let candidate = text[start..=i].trim();
            if !candidate.is_empty() {
                sentences.push(candidate);
            }
            start = i + 1;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Runs `summarizer.summarize` for every `(entry_id, text)` pair on a
/// bounded CPU worker pool, sized independently of the I/O
/// concurrency (spec.md §5): the cooperative scheduler dispatches
/// each summary onto `spawn_blocking`, gated by a semaphore sized
/// `LOCAL_SUMMARIZER_WORKERS`, so CPU-bound summarization never
/// starves the I/O scheduler.
pub async fn summarize_many(
    summarizer: Arc<dyn LocalSummarizer>,
    texts: Vec<(Uuid, String)>,
    max_tokens: usize,
    workers: usize,
) -> Vec<(Uuid, String)> {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = Vec::with_capacity(texts.len());

    for (entry_id, text) in texts {
        let summarizer = Arc::clone(&summarizer);
        let semaphore = Arc::clone(&semaphore);
        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
            let summary =
                tokio::task::spawn_blocking(move || summarizer.summarize(&text, max_tokens))
                    .await
                    .unwrap_or_default();
            (entry_id, summary)
        }));
    }

    let mut out = Vec::with_capacity(tasks.len());
    for task in tasks {
        if let Ok(result) = task.await {
            out.push(result);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_once_token_budget_is_reached() {
        let text = "First sentence is short. Second sentence adds a few more words here. Third sentence should not be needed at all for a small budget.";
        let summary = LeadingSentenceSummarizer.summarize(text, 8);
        assert!(summary.starts_with("First sentence is short."));
        assert!(!summary.contains("Third sentence"));
    }

    #[test]
    fn falls_back_to_word_truncation_without_sentence_boundaries() {
        let text = "no punctuation at all just a long run of words without any terminators";
        let summary = LeadingSentenceSummarizer.summarize(text, 4);
        assert_eq!(summary.split_whitespace().count(), 4);
    }

    #[tokio::test]
    async fn summarize_many_preserves_entry_ids() {
        let texts = vec![
            (Uuid::from_u128(1), "One sentence here.".to_string()),
            (Uuid::from_u128(2), "Another sentence there.".to_string()),
        ];
        let out = summarize_many(Arc::new(LeadingSentenceSummarizer), texts, 80, 2).await;
        let ids: std::collections::HashSet<Uuid> = out.iter().map(|(id, _)| *id).collect();
        assert!(ids.contains(&Uuid::from_u128(1)));
        assert!(ids.contains(&Uuid::from_u128(2)));
    }
}
