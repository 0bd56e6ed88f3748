use geosignal_types::{FailureReason, RunMetrics};

/// Accumulates the counters the run writes back into
/// `ProcessingRun.metrics` (SPEC_FULL.md §3 — a typed struct rather
/// than a hand-assembled JSON blob).
#[derive(Default)]
pub struct MetricsAccumulator {
    metrics: RunMetrics,
}

impl MetricsAccumulator {
    pub fn record_stage(&mut self, stage: &str) {
        *self.metrics.per_stage_counts.entry(stage.to_string()).or_insert(0) += 1;
    }

    pub fn record_failure(&mut self, reason: FailureReason) {
        *self
            .metrics
            .per_failure_reason_counts
            .entry(reason.as_str().to_string())
            .or_insert(0) += 1;
    }

    pub fn finish(mut self, fetch_high_water_mark: u32) -> RunMetrics {
        self.metrics.fetch_concurrency_high_water_mark = fetch_high_water_mark;
        self.metrics
    }
}
