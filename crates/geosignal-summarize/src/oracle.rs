use std::time::Duration;

use async_trait::async_trait;
use geosignal_error::SummarizeError;
use rand::Rng;
use tracing::{debug, warn};

use crate::json_repair::parse_oracle_response;

/// External text-synthesis oracle for stage-2 cluster summarization.
/// Called at-most-once per cluster per run (retries happen inside a
/// single logical call via [`synthesize_with_retry`], not as repeated
/// top-level calls).
#[async_trait]
pub trait SummaryOracle: Send + Sync {
    /// Submits a serialized payload (the cluster's stage-1 summaries)
    /// and returns the raw response body for fault-tolerant parsing
    /// by the caller.
    async fn complete(&self, payload: &str) -> Result<String, SummarizeError>;

    fn name(&self) -> &'static str;
}

fn backoff_delay(attempt: u32) -> Duration {
    let base_ms = 500u64 * 2u64.pow(attempt);
    let jitter = rand::thread_rng().gen_range(0.75..1.25);
    Duration::from_millis((base_ms as f64 * jitter) as u64)
}

/// Calls `oracle.complete`, retrying transient failures with capped
/// exponential backoff up to `max_retries` times, then parsing the
/// response with the fault-tolerant JSON pipeline. Returns
/// `Err(OracleExhausted)` only after every retry and every parse
/// strategy has failed — callers fall back to the longest stage-1
/// summary in that case (spec.md §4.8).
pub async fn synthesize_with_retry(
    oracle: &dyn SummaryOracle,
    payload: &str,
    max_retries: u32,
) -> Result<String, SummarizeError> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        match oracle.complete(payload).await {
            Ok(raw) => match parse_oracle_response(&raw) {
                Some(parsed) => return Ok(parsed.summary),
                None => {
                    warn!(oracle = oracle.name(), attempt, "oracle response failed all parse strategies");
                    last_err = Some(SummarizeError::OracleExhausted(
                        "response was not parseable after strict/repair/relaxed passes".to_string(),
                    ));
                }
            },
            Err(SummarizeError::OracleUnauthorized(msg)) => {
                return Err(SummarizeError::OracleUnauthorized(msg));
            }
            Err(e) => {
                debug!(oracle = oracle.name(), attempt, error = %e, "oracle call failed, may retry");
                last_err = Some(e);
            }
        }

        if attempt < max_retries {
            tokio::time::sleep(backoff_delay(attempt)).await;
        }
    }

    Err(last_err.unwrap_or_else(|| SummarizeError::OracleExhausted("no attempts made".to_string())))
}

/// HTTP-based oracle adapter speaking a provider's chat-completion API,
/// generalized from the teacher's `LlmClient` trait implementations
/// (`AnthropicClient`/`OpenAiClient` in `ob-agentic`) from "tool-use
/// chat completion" to "submit a cluster summarization prompt, return
/// raw text." Works against any provider whose request/response shape
/// matches the configured `request_template`/`response_text_pointer`,
/// so one adapter covers both provider families the teacher hard-coded
/// separately.
pub struct HttpSummaryOracle {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    provider: &'static str,
}

impl HttpSummaryOracle {
    pub fn anthropic_style(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            provider: "anthropic-style",
        }
    }

    pub fn openai_style(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            provider: "openai-style",
        }
    }
}

#[async_trait]
impl SummaryOracle for HttpSummaryOracle {
    async fn complete(&self, payload: &str) -> Result<String, SummarizeError> {
        let system_prompt = "Synthesize the following per-article summaries into one concise cluster summary. Respond as JSON: {\"summary\": \"...\"}.";

        let body = match self.provider {
            "anthropic-style" => serde_json::json!({
                "model": &self.model,
                "max_tokens": 512,
                "system": system_prompt,
                "messages": [{"role": "user", "content": payload}],
            }),
            _ => serde_json::json!({
                "model": &self.model,
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": payload},
                ],
            }),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| SummarizeError::Local(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(SummarizeError::OracleUnauthorized(format!(
                "oracle rejected credentials: {status}"
            )));
        }
        if !status.is_success() {
            return Err(SummarizeError::OracleExhausted(format!(
                "oracle returned {status}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| SummarizeError::OracleExhausted(e.to_string()))
    }

    fn name(&self) -> &'static str {
        self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyOracle {
        failures_left: AtomicUsize,
    }

    #[async_trait]
    impl SummaryOracle for FlakyOracle {
        async fn complete(&self, _payload: &str) -> Result<String, SummarizeError> {
            if self.failures_left.fetch_sub(1, Ordering::SeqCst) > 0 {
                return Err(SummarizeError::Local("transient".to_string()));
            }
            Ok(r#"{"summary": "Recovered on retry"}"#.to_string())
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    struct AlwaysUnauthorized;

    #[async_trait]
    impl SummaryOracle for AlwaysUnauthorized {
        async fn complete(&self, _payload: &str) -> Result<String, SummarizeError> {
            Err(SummarizeError::OracleUnauthorized("bad key".to_string()))
        }

        fn name(&self) -> &'static str {
            "unauthorized"
        }
    }

    #[tokio::test]
    async fn recovers_after_transient_failures_within_retry_budget() {
        let oracle = FlakyOracle {
            failures_left: AtomicUsize::new(2),
        };
        let result = synthesize_with_retry(&oracle, "payload", 3).await.unwrap();
        assert_eq!(result, "Recovered on retry");
    }

    #[tokio::test]
    async fn exhausts_after_max_retries() {
        let oracle = FlakyOracle {
            failures_left: AtomicUsize::new(10),
        };
        let result = synthesize_with_retry(&oracle, "payload", 2).await;
        assert!(matches!(result, Err(SummarizeError::OracleExhausted(_) | SummarizeError::Local(_))));
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let oracle = AlwaysUnauthorized;
        let result = synthesize_with_retry(&oracle, "payload", 5).await;
        assert!(matches!(result, Err(SummarizeError::OracleUnauthorized(_))));
    }
}
