//! Four-component weighted hotspot scoring, top-K flagging, and the
//! alert dispatch boundary.
//!
//! Each component is normalized to `[0, 1]` independently, then
//! combined by configurable weights (spec.md §4.10). The top-K
//! scorers per run are handed to an [`AlertDispatcher`] as opaque
//! payloads — the transport is a plug-in, per spec.md §1/§6.

mod weights;

pub use weights::ScoreWeights;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Per-cluster inputs the scorer needs. Everything here is derived
/// from the cluster's member set by the caller (the run controller),
/// which has access to the enriched `FeedEntry` rows this crate does
/// not.
#[derive(Debug, Clone)]
pub struct ClusterScoreInputs {
    pub flashpoint_id: Uuid,
    pub cluster_id: u32,
    pub member_count: usize,
    pub domain_count: usize,
    pub language_count: usize,
    pub seen_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterScore {
    pub member_component: f64,
    pub domain_component: f64,
    pub language_component: f64,
    pub burst_component: f64,
    pub total: f64,
}

/// Scores every cluster in a run. `max_member_count` is the largest
/// `member_count` among the clusters being scored together, used to
/// normalize the member-count component relative to this run rather
/// than against an arbitrary fixed cap.
pub fn score_clusters(
    clusters: &[ClusterScoreInputs],
    weights: &ScoreWeights,
) -> Vec<(ClusterScoreInputs, ClusterScore)> {
    let max_member_count = clusters.iter().map(|c| c.member_count).max().unwrap_or(0);

    clusters
        .iter()
        .cloned()
        .map(|inputs| {
            let score = score_one(&inputs, max_member_count, weights);
            (inputs, score)
        })
        .collect()
}

fn score_one(inputs: &ClusterScoreInputs, max_member_count: usize, weights: &ScoreWeights) -> ClusterScore {
    let member_component = if max_member_count == 0 {
        0.0
    } else {
        (inputs.member_count as f64 / max_member_count as f64).min(1.0)
    };

    let domain_component = diversity_ratio(inputs.domain_count, inputs.member_count);
    let language_component = diversity_ratio(inputs.language_count, inputs.member_count);
    let burst_component = temporal_burstiness(&inputs.seen_dates);

    let total = weights.member_count * member_component
        + weights.domain_diversity * domain_component
        + weights.language_diversity * language_component
        + weights.temporal_burstiness * burst_component;

    ClusterScore {
        member_component,
        domain_component,
        language_component,
        burst_component,
        total,
    }
}

/// Distinct-count relative to total members, clamped to `[0, 1]`. A
/// cluster where every member is from a different domain scores 1.0;
/// one dominated by a single domain scores near zero.
fn diversity_ratio(distinct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (distinct as f64 / total as f64).min(1.0)
    }
}

/// Concentration of a cluster's seen-dates into its busiest single
/// day, as a fraction of all mentions. A cluster whose coverage is
/// spread evenly across many days scores low; one where most mentions
/// land on a single day (a burst) scores near 1.0.
fn temporal_burstiness(seen_dates: &[NaiveDate]) -> f64 {
    if seen_dates.is_empty() {
        return 0.0;
    }
    let mut counts: std::collections::BTreeMap<NaiveDate, usize> = std::collections::BTreeMap::new();
    for date in seen_dates {
        *counts.entry(*date).or_insert(0) += 1;
    }
    let busiest = counts.values().copied().max().unwrap_or(0);
    busiest as f64 / seen_dates.len() as f64
}

/// The opaque payload handed to the alert dispatcher for a flagged
/// cluster. spec.md names the dispatcher's interface but not the
/// payload shape; this is the minimal shape a webhook transport needs
/// without re-querying the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPayload {
    pub run_id: String,
    pub flashpoint_id: Uuid,
    pub cluster_id: u32,
    pub score: f64,
    pub summary: Option<String>,
    pub member_count: usize,
    pub top_domains: Vec<String>,
}

/// Selects the top-K clusters by total score, breaking ties
/// deterministically by `(flashpoint_id, cluster_id)` ascending so
/// flagging is reproducible for a fixed score set.
pub fn top_k_flagged<'a>(
    scored: &'a [(ClusterScoreInputs, ClusterScore)],
    k: usize,
) -> Vec<&'a (ClusterScoreInputs, ClusterScore)> {
    let mut ranked: Vec<&(ClusterScoreInputs, ClusterScore)> = scored.iter().collect();
    ranked.sort_by(|a, b| {
        b.1.total
            .partial_cmp(&a.1.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.flashpoint_id.cmp(&b.0.flashpoint_id))
            .then_with(|| a.0.cluster_id.cmp(&b.0.cluster_id))
    });
    ranked.truncate(k);
    ranked
}

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert transport error: {0}")]
    Transport(String),
}

/// Pluggable delivery for flagged clusters. Webhook/chat formatting is
/// out of scope for the core (spec.md §1) — this trait is the
/// boundary a real transport implements.
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn dispatch(&self, run_id: &str, flagged: &[AlertPayload]) -> Result<(), AlertError>;
}

/// The one production-shaped transport carried in this repo: POSTs
/// the flagged-cluster batch as a JSON array to a configured webhook
/// URL, matching the teacher's own `reqwest`-based HTTP client usage
/// elsewhere in the pack.
pub struct WebhookAlertDispatcher {
    client: reqwest::Client,
    webhook_url: String,
}

impl WebhookAlertDispatcher {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl AlertDispatcher for WebhookAlertDispatcher {
    async fn dispatch(&self, run_id: &str, flagged: &[AlertPayload]) -> Result<(), AlertError> {
        if flagged.is_empty() {
            return Ok(());
        }

        let body = serde_json::json!({
            "run_id": run_id,
            "flagged_clusters": flagged,
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AlertError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AlertError::Transport(format!(
                "webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// No-op dispatcher used when no webhook is configured, so the scorer
/// doesn't need an `Option<Box<dyn AlertDispatcher>>` threaded through
/// the run controller.
pub struct NullAlertDispatcher;

#[async_trait]
impl AlertDispatcher for NullAlertDispatcher {
    async fn dispatch(&self, _run_id: &str, _flagged: &[AlertPayload]) -> Result<(), AlertError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(cluster_id: u32, member_count: usize, domain_count: usize, language_count: usize) -> ClusterScoreInputs {
        ClusterScoreInputs {
            flashpoint_id: Uuid::from_u128(1),
            cluster_id,
            member_count,
            domain_count,
            language_count,
            seen_dates: vec![],
        }
    }

    #[test]
    fn components_are_bounded_zero_to_one() {
        let weights = ScoreWeights::default();
        let clusters = vec![inputs(1, 20, 15, 5), inputs(2, 1, 1, 1)];
        let scored = score_clusters(&clusters, &weights);
        for (_, score) in &scored {
            assert!((0.0..=1.0).contains(&score.member_component));
            assert!((0.0..=1.0).contains(&score.domain_component));
            assert!((0.0..=1.0).contains(&score.language_component));
            assert!((0.0..=1.0).contains(&score.burst_component));
        }
    }

    #[test]
    fn largest_cluster_gets_member_component_of_one() {
        let weights = ScoreWeights::default();
        let clusters = vec![inputs(1, 10, 5, 2), inputs(2, 5, 5, 2)];
        let scored = score_clusters(&clusters, &weights);
        let biggest = scored.iter().find(|(i, _)| i.cluster_id == 1).unwrap();
        assert_eq!(biggest.1.member_component, 1.0);
    }

    #[test]
    fn single_day_burst_scores_near_one() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        let score = temporal_burstiness(&[today, today, today]);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn spread_across_distinct_days_scores_lower() {
        let d1 = NaiveDate::from_ymd_opt(2026, 7, 29).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 7, 30).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        let score = temporal_burstiness(&[d1, d2, d3]);
        assert!(score < 1.0);
    }

    #[test]
    fn top_k_breaks_ties_by_flashpoint_then_cluster_id() {
        let weights = ScoreWeights {
            member_count: 1.0,
            domain_diversity: 0.0,
            language_diversity: 0.0,
            temporal_burstiness: 0.0,
        };
        let clusters = vec![inputs(5, 10, 1, 1), inputs(2, 10, 1, 1)];
        let scored = score_clusters(&clusters, &weights);
        let flagged = top_k_flagged(&scored, 1);
        assert_eq!(flagged[0].0.cluster_id, 2);
    }

    #[tokio::test]
    async fn null_dispatcher_never_errors() {
        let dispatcher = NullAlertDispatcher;
        let result = dispatcher.dispatch("run1", &[]).await;
        assert!(result.is_ok());
    }
}
