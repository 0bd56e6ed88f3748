//! Two-stage cluster summarization (spec.md §4.8): a local extractive
//! pass over every cluster member's body, then an external oracle
//! synthesis call per cluster, with a premium re-pass for the largest
//! clusters and a fallback when the oracle is unavailable.

mod json_repair;
mod local;
mod oracle;
mod premium;

pub use json_repair::{parse_oracle_response, OracleSummaryResponse};
pub use local::{summarize_many, LeadingSentenceSummarizer, LocalSummarizer};
pub use oracle::{synthesize_with_retry, HttpSummaryOracle, SummaryOracle};
pub use premium::select_premium_clusters;

/// Picks the cluster summary to persist when the oracle call (stage
/// 2) failed even after retries and fault-tolerant parsing: the
/// longest non-empty stage-1 summary among the cluster's members
/// (spec.md §4.8).
pub fn fallback_summary<'a>(stage1_summaries: &'a [String]) -> Option<&'a str> {
    stage1_summaries
        .iter()
        .filter(|s| !s.trim().is_empty())
        .max_by_key(|s| s.len())
        .map(|s| s.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_picks_longest_non_empty_summary() {
        let summaries = vec![
            "short".to_string(),
            "".to_string(),
            "a considerably longer stage one summary".to_string(),
        ];
        assert_eq!(
            fallback_summary(&summaries),
            Some("a considerably longer stage one summary")
        );
    }

    #[test]
    fn fallback_is_none_when_all_summaries_are_blank() {
        let summaries = vec!["".to_string(), "   ".to_string()];
        assert!(fallback_summary(&summaries).is_none());
    }
}
