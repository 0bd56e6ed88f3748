//! Bounded-concurrency fetcher: a global semaphore caps total
//! in-flight requests, a per-host [`host_gate::HostGate`] caps
//! per-domain concurrency and politeness delay, and a per-host
//! [`circuit::CircuitBreaker`] stops hammering hosts that are down.

mod circuit;
mod host_gate;
mod retry;

pub use circuit::CircuitBreaker;
pub use host_gate::{HostGate, HostGateRegistry};

use async_trait::async_trait;
use geosignal_config::PipelineConfig;
use geosignal_error::FetchError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const MAX_RESPONSE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub requested_url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Pluggable escape hatch for pages the plain HTTP client cannot
/// render (heavy client-side JS). Off by default; a real deployment
/// may wire a headless-browser implementation behind this trait.
#[async_trait]
pub trait BrowserFallback: Send + Sync {
    async fn render(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

pub struct Fetcher {
    client: reqwest::Client,
    global_permits: Arc<Semaphore>,
    max_concurrent_fetches: usize,
    in_flight: AtomicUsize,
    high_water_mark: AtomicUsize,
    hosts: HostGateRegistry,
    timeout: Duration,
    browser_fallback: Option<Arc<dyn BrowserFallback>>,
}

impl Fetcher {
    pub fn new(config: &PipelineConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            global_permits: Arc::new(Semaphore::new(config.max_concurrent_fetches)),
            max_concurrent_fetches: config.max_concurrent_fetches,
            in_flight: AtomicUsize::new(0),
            high_water_mark: AtomicUsize::new(0),
            hosts: HostGateRegistry::new(
                config.per_domain_concurrency,
                config.request_delay,
                config.circuit_breaker_threshold,
                config.circuit_breaker_cooldown,
            ),
            timeout: config.fetch_timeout,
            browser_fallback: None,
        })
    }

    pub fn with_browser_fallback(mut self, fallback: Arc<dyn BrowserFallback>) -> Self {
        self.browser_fallback = Some(fallback);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrent_fetches
    }

    /// Highest number of fetches observed in flight at once, for the
    /// run's `fetch_concurrency_high_water_mark` metric.
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark.load(Ordering::Relaxed)
    }

    pub async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage, FetchError> {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .unwrap_or_default();

        let gate = self.hosts.gate_for(&host);

        if !gate.breaker.allow_request() {
            return Err(FetchError::DomainBlocked(host));
        }

        let _global_permit = tokio::select! {
            permit = self.global_permits.acquire() => permit.map_err(|_| FetchError::Cancelled)?,
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
        };
        let _host_permit = tokio::select! {
            permit = gate.semaphore.acquire() => permit.map_err(|_| FetchError::Cancelled)?,
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
        };

        if !gate.request_delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(gate.request_delay) => {}
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            }
        }

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.high_water_mark.fetch_max(now_in_flight, Ordering::Relaxed);
        let result = self.fetch_with_retry(url, cancel).await;
        self.in_flight.fetch_sub(1, Ordering::Relaxed);

        match &result {
            Ok(_) => gate.breaker.record_success(),
            Err(FetchError::Cancelled) => {}
            Err(_) => gate.breaker.record_failure(),
        }
        result
    }

    async fn fetch_with_retry(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage, FetchError> {
        let mut attempt = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let outcome = tokio::time::timeout(self.timeout, self.client.get(url).send())
                .await
                .map_err(|_| FetchError::Timeout)
                .and_then(|r| r.map_err(|e| FetchError::Transport(e.to_string())));

            let response = match outcome {
                Ok(response) => response,
                Err(e @ FetchError::Timeout) | Err(e @ FetchError::Transport(_)) => {
                    if attempt + 1 >= retry::max_attempts() {
                        return Err(e);
                    }
                    attempt += 1;
                    debug!(url, attempt, "retrying after transport error");
                    tokio::time::sleep(retry::backoff_delay(attempt - 1)).await;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let status = response.status().as_u16();
            if retry::is_retryable_status(status) && attempt + 1 < retry::max_attempts() {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(retry::parse_retry_after);
                attempt += 1;
                warn!(url, status, attempt, ?retry_after, "retrying after retryable status");
                tokio::time::sleep(retry::delay_with_retry_after(attempt - 1, retry_after)).await;
                continue;
            }

            if (400..500).contains(&status) {
                return Err(FetchError::Http4xx(status));
            }
            if status >= 500 {
                return Err(FetchError::Http5xx(status));
            }

            let final_url = response.url().to_string();
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            let body = read_bounded(response).await?;

            return Ok(FetchedPage {
                requested_url: url.to_string(),
                final_url,
                status,
                content_type,
                body,
            });
        }
    }
}

async fn read_bounded(response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
    use futures::StreamExt;

    if let Some(len) = response.content_length() {
        if len as usize > MAX_RESPONSE_BYTES {
            return Err(FetchError::Transport(format!(
                "response too large: {len} bytes"
            )));
        }
    }

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::Transport(e.to_string()))?;
        if body.len() + chunk.len() > MAX_RESPONSE_BYTES {
            return Err(FetchError::Transport("response too large".to_string()));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
