use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::failure::FailureReason;

/// Per-(run, entry) progression through the pipeline.
///
/// `QUEUED -> FETCHING -> EXTRACTED -> DEDUPED -> EMBEDDED -> CLUSTERED
/// -> SUMMARIZED -> SCORED`, with a short-circuit branch to
/// `SkippedDuplicate` after `Deduped`, and a terminal `Failed(reason)`
/// reachable from any state. Transitions are persisted after each
/// stage — a crash mid-stage leaves the job in its last persisted
/// state, and re-entering a stage must be idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Fetching,
    Extracted,
    Deduped,
    Embedded,
    Clustered,
    Summarized,
    Scored,
    SkippedDuplicate,
    Failed { reason: FailureReason },
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Extracted => "extracted",
            Self::Deduped => "deduped",
            Self::Embedded => "embedded",
            Self::Clustered => "clustered",
            Self::Summarized => "summarized",
            Self::Scored => "scored",
            Self::SkippedDuplicate => "skipped_duplicate",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Scored | Self::SkippedDuplicate | Self::Failed { .. }
        )
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Self::Failed { reason } => Some(*reason),
            _ => None,
        }
    }
}

/// The persisted state record for one (run_id, entry_id) pair.
///
/// `UNIQUE(run_id, entry_id)` at the storage layer is the claim
/// invariant: a run may create at most one job row per entry, and the
/// "insert; ignore on conflict" claim statement is how concurrent
/// entry-processing tasks avoid double-claiming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEntryJob {
    pub run_id: String,
    pub entry_id: Uuid,
    pub status: JobStatus,
    pub extraction_method: Option<String>,
    pub is_duplicate: bool,
    pub duplicate_of: Option<Uuid>,
    pub content_hash: Option<String>,
    pub minhash_signature: Option<Vec<u8>>,
    pub fetch_started_at: Option<DateTime<Utc>>,
    pub fetch_completed_at: Option<DateTime<Utc>>,
    pub extract_completed_at: Option<DateTime<Utc>>,
    pub embed_completed_at: Option<DateTime<Utc>>,
    pub cluster_completed_at: Option<DateTime<Utc>>,
    pub summarize_completed_at: Option<DateTime<Utc>>,
    pub score_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedEntryJob {
    pub fn new(run_id: impl Into<String>, entry_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.into(),
            entry_id,
            status: JobStatus::Queued,
            extraction_method: None,
            is_duplicate: false,
            duplicate_of: None,
            content_hash: None,
            minhash_signature: None,
            fetch_started_at: None,
            fetch_completed_at: None,
            extract_completed_at: None,
            embed_completed_at: None,
            cluster_completed_at: None,
            summarize_completed_at: None,
            score_completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a transition, stamping `updated_at`. Callers persist the
    /// row immediately afterward — this method only mutates in-memory
    /// state.
    pub fn transition(&mut self, status: JobStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_exactly_scored_skipped_and_failed() {
        assert!(JobStatus::Scored.is_terminal());
        assert!(JobStatus::SkippedDuplicate.is_terminal());
        assert!(JobStatus::Failed {
            reason: FailureReason::Timeout
        }
        .is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Embedded.is_terminal());
    }

    #[test]
    fn new_job_starts_queued_and_not_duplicate() {
        let job = FeedEntryJob::new("01H000RUN", Uuid::nil());
        assert_eq!(job.status, JobStatus::Queued);
        assert!(!job.is_duplicate);
    }
}
