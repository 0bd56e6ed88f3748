use geosignal_error::StoreError;
use geosignal_types::{FailureReason, FeedEntryJob, JobStatus};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// `feed_entry_jobs` sidecar table operations. `UNIQUE(run_id,
/// entry_id)` at the schema level is the claim invariant — `claim`
/// relies on an "insert; ignore on conflict" statement rather than a
/// separate existence check, so concurrent entry-processing tasks
/// never race on the same claim (spec.md §4.1 step 5).
pub struct JobRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> JobRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Attempts to claim `entry_id` for `run_id`. Returns `true` if
    /// this call created the row (the caller now owns processing this
    /// entry for this run); `false` if a job row already existed
    /// (another run, or a concurrent claim, got there first).
    pub async fn claim(&self, run_id: &str, entry_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO feed_entry_jobs (run_id, entry_id, status, is_duplicate, created_at, updated_at)
            VALUES ($1, $2, 'queued', false, now(), now())
            ON CONFLICT (run_id, entry_id) DO NOTHING
            "#,
        )
        .bind(run_id)
        .bind(entry_id)
        .execute(self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn transition(&self, job: &FeedEntryJob) -> Result<(), StoreError> {
        let (status_str, failure_reason): (&str, Option<&str>) = match &job.status {
            JobStatus::Failed { reason } => ("failed", Some(reason.as_str())),
            other => (other.as_str(), None),
        };

        sqlx::query(
            r#"
            UPDATE feed_entry_jobs
            SET status = $3, failure_reason = $4, extraction_method = $5,
                is_duplicate = $6, duplicate_of = $7, content_hash = $8,
                minhash_signature = $9, fetch_started_at = $10, fetch_completed_at = $11,
                extract_completed_at = $12, embed_completed_at = $13,
                cluster_completed_at = $14, summarize_completed_at = $15,
                score_completed_at = $16, updated_at = now()
            WHERE run_id = $1 AND entry_id = $2
            "#,
        )
        .bind(&job.run_id)
        .bind(job.entry_id)
        .bind(status_str)
        .bind(failure_reason)
        .bind(&job.extraction_method)
        .bind(job.is_duplicate)
        .bind(job.duplicate_of)
        .bind(&job.content_hash)
        .bind(&job.minhash_signature)
        .bind(job.fetch_started_at)
        .bind(job.fetch_completed_at)
        .bind(job.extract_completed_at)
        .bind(job.embed_completed_at)
        .bind(job.cluster_completed_at)
        .bind(job.summarize_completed_at)
        .bind(job.score_completed_at)
        .execute(self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    pub async fn find(&self, run_id: &str, entry_id: Uuid) -> Result<Option<FeedEntryJob>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT run_id, entry_id, status, failure_reason, extraction_method,
                   is_duplicate, duplicate_of, content_hash, minhash_signature,
                   fetch_started_at, fetch_completed_at, extract_completed_at,
                   embed_completed_at, cluster_completed_at, summarize_completed_at,
                   score_completed_at, created_at, updated_at
            FROM feed_entry_jobs
            WHERE run_id = $1 AND entry_id = $2
            "#,
        )
        .bind(run_id)
        .bind(entry_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        row.map(row_to_job).transpose()
    }

    pub async fn count_by_status(&self, run_id: &str) -> Result<Vec<(String, i64)>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT status, count(*) as count
            FROM feed_entry_jobs
            WHERE run_id = $1
            GROUP BY status
            "#,
        )
        .bind(run_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get::<String, _>("status"), r.get::<i64, _>("count")))
            .collect())
    }
}

fn row_to_job(row: sqlx::postgres::PgRow) -> Result<FeedEntryJob, StoreError> {
    let status_raw: String = row.get("status");
    let failure_reason_raw: Option<String> = row.get("failure_reason");

    let status = if status_raw == "failed" {
        let reason = failure_reason_raw
            .as_deref()
            .unwrap_or("unknown")
            .parse::<FailureReason>()
            .unwrap_or(FailureReason::Unknown);
        JobStatus::Failed { reason }
    } else {
        parse_non_failed_status(&status_raw)?
    };

    Ok(FeedEntryJob {
        run_id: row.get("run_id"),
        entry_id: row.get("entry_id"),
        status,
        extraction_method: row.get("extraction_method"),
        is_duplicate: row.get("is_duplicate"),
        duplicate_of: row.get("duplicate_of"),
        content_hash: row.get("content_hash"),
        minhash_signature: row.get("minhash_signature"),
        fetch_started_at: row.get("fetch_started_at"),
        fetch_completed_at: row.get("fetch_completed_at"),
        extract_completed_at: row.get("extract_completed_at"),
        embed_completed_at: row.get("embed_completed_at"),
        cluster_completed_at: row.get("cluster_completed_at"),
        summarize_completed_at: row.get("summarize_completed_at"),
        score_completed_at: row.get("score_completed_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn parse_non_failed_status(raw: &str) -> Result<JobStatus, StoreError> {
    match raw {
        "queued" => Ok(JobStatus::Queued),
        "fetching" => Ok(JobStatus::Fetching),
        "extracted" => Ok(JobStatus::Extracted),
        "deduped" => Ok(JobStatus::Deduped),
        "embedded" => Ok(JobStatus::Embedded),
        "clustered" => Ok(JobStatus::Clustered),
        "summarized" => Ok(JobStatus::Summarized),
        "scored" => Ok(JobStatus::Scored),
        "skipped_duplicate" => Ok(JobStatus::SkippedDuplicate),
        other => Err(StoreError::Query(format!("unknown job status: {other}"))),
    }
}
