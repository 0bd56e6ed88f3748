use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Enrichment depth for a run. Stages beyond ingest are invoked only
/// when the tier enables them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    /// Ingest only: fetch, extract, enrich, write back. No vectors,
    /// no clusters.
    A,
    /// Ingest + embed + cluster + local extractive summary.
    B,
    /// Everything in B, plus oracle cluster summarization.
    C,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }

    pub fn embeds_and_clusters(&self) -> bool {
        matches!(self, Self::B | Self::C)
    }

    pub fn summarizes_locally(&self) -> bool {
        matches!(self, Self::B | Self::C)
    }

    pub fn summarizes_with_oracle(&self) -> bool {
        matches!(self, Self::C)
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

/// One invocation of the pipeline, bound to a target date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingRun {
    /// Lexicographically sortable, encodes UTC start time (a ULID-style id).
    pub run_id: String,
    pub target_date: NaiveDate,
    pub tier: Tier,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub selected_count: u32,
    pub processed_count: u32,
    pub failed_count: u32,
    pub error_message: Option<String>,
    pub metrics: RunMetrics,
}

impl ProcessingRun {
    pub fn new(run_id: impl Into<String>, target_date: NaiveDate, tier: Tier) -> Self {
        Self {
            run_id: run_id.into(),
            target_date,
            tier,
            status: RunStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            selected_count: 0,
            processed_count: 0,
            failed_count: 0,
            error_message: None,
            metrics: RunMetrics::default(),
        }
    }

    /// A run is abandoned if it has been RUNNING for longer than the
    /// given timeout. Used by the startup safety sweeper.
    pub fn is_abandoned(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        self.status == RunStatus::Running && now - self.started_at > timeout
    }

    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error_message = Some(message.into());
    }
}

/// Structured per-run metrics, serialized into `ProcessingRun.metrics`
/// as the free-form JSON column spec.md describes — built from a typed
/// struct so callers never hand-assemble the JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    pub per_stage_counts: std::collections::BTreeMap<String, u32>,
    pub per_failure_reason_counts: std::collections::BTreeMap<String, u32>,
    pub stage_duration_ms_p50: std::collections::BTreeMap<String, f64>,
    pub stage_duration_ms_p95: std::collections::BTreeMap<String, f64>,
    pub fetch_concurrency_high_water_mark: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_gates_match_spec() {
        assert!(!Tier::A.embeds_and_clusters());
        assert!(Tier::B.embeds_and_clusters());
        assert!(Tier::B.summarizes_locally());
        assert!(!Tier::B.summarizes_with_oracle());
        assert!(Tier::C.summarizes_with_oracle());
    }

    #[test]
    fn abandoned_detection_uses_status_and_age() {
        let mut run = ProcessingRun::new(
            "01H0",
            NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
            Tier::A,
        );
        run.started_at = Utc::now() - chrono::Duration::hours(3);
        assert!(run.is_abandoned(Utc::now(), chrono::Duration::hours(2)));

        run.complete();
        assert!(!run.is_abandoned(Utc::now(), chrono::Duration::hours(2)));
    }
}
