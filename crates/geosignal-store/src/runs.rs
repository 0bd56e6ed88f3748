use chrono::{DateTime, Duration, NaiveDate, Utc};
use geosignal_error::StoreError;
use geosignal_types::{ProcessingRun, RunMetrics, RunStatus, Tier};
use sqlx::{PgPool, Row};

/// `processing_runs` sidecar table operations. Table name is static
/// (not date-partitioned), so this is the one repository in the crate
/// that can lean on regular bound-parameter queries without an
/// identifier whitelist.
pub struct RunRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RunRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, run: &ProcessingRun) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO processing_runs
                (run_id, target_date, tier, status, started_at, completed_at,
                 selected_count, processed_count, failed_count, error_message, metrics)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, CAST($11 AS jsonb))
            "#,
        )
        .bind(&run.run_id)
        .bind(run.target_date)
        .bind(run.tier.as_str())
        .bind(run.status.as_str())
        .bind(run.started_at)
        .bind(run.completed_at)
        .bind(run.selected_count as i32)
        .bind(run.processed_count as i32)
        .bind(run.failed_count as i32)
        .bind(&run.error_message)
        .bind(serde_json::to_value(&run.metrics).map_err(|e| StoreError::Query(e.to_string()))?)
        .execute(self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    pub async fn update_status(
        &self,
        run_id: &str,
        status: RunStatus,
        completed_at: Option<DateTime<Utc>>,
        error_message: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE processing_runs
            SET status = $2, completed_at = $3, error_message = $4
            WHERE run_id = $1
            "#,
        )
        .bind(run_id)
        .bind(status.as_str())
        .bind(completed_at)
        .bind(error_message)
        .execute(self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    pub async fn update_counters(
        &self,
        run_id: &str,
        selected: u32,
        processed: u32,
        failed: u32,
        metrics: &RunMetrics,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE processing_runs
            SET selected_count = $2, processed_count = $3, failed_count = $4,
                metrics = CAST($5 AS jsonb)
            WHERE run_id = $1
            "#,
        )
        .bind(run_id)
        .bind(selected as i32)
        .bind(processed as i32)
        .bind(failed as i32)
        .bind(serde_json::to_value(metrics).map_err(|e| StoreError::Query(e.to_string()))?)
        .execute(self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    /// Transitions any run still RUNNING after `timeout` to FAILED
    /// with reason `cancelled`'s sibling — an abandoned run, not a
    /// cancelled one. Run once at controller startup, before a new
    /// run begins (spec.md §4.1 Recovery policy).
    pub async fn sweep_abandoned(&self, timeout: Duration) -> Result<Vec<String>, StoreError> {
        let cutoff = Utc::now() - timeout;
        let rows = sqlx::query(
            r#"
            UPDATE processing_runs
            SET status = 'FAILED', completed_at = now(),
                error_message = 'abandoned: exceeded run timeout while RUNNING'
            WHERE status = 'RUNNING' AND started_at < $1
            RETURNING run_id
            "#,
        )
        .bind(cutoff)
        .fetch_all(self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows.iter().map(|r| r.get::<String, _>("run_id")).collect())
    }

    pub async fn find(&self, run_id: &str) -> Result<Option<ProcessingRun>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT run_id, target_date, tier, status, started_at, completed_at,
                   selected_count, processed_count, failed_count, error_message, metrics
            FROM processing_runs
            WHERE run_id = $1
            "#,
        )
        .bind(run_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        row.map(row_to_run).transpose()
    }
}

fn row_to_run(row: sqlx::postgres::PgRow) -> Result<ProcessingRun, StoreError> {
    let tier_raw: String = row.get("tier");
    let status_raw: String = row.get("status");
    let metrics_json: serde_json::Value = row.get("metrics");

    Ok(ProcessingRun {
        run_id: row.get("run_id"),
        target_date: row.get::<NaiveDate, _>("target_date"),
        tier: tier_raw.parse::<Tier>().map_err(StoreError::Query)?,
        status: parse_run_status(&status_raw)?,
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
        selected_count: row.get::<i32, _>("selected_count") as u32,
        processed_count: row.get::<i32, _>("processed_count") as u32,
        failed_count: row.get::<i32, _>("failed_count") as u32,
        error_message: row.get("error_message"),
        metrics: serde_json::from_value(metrics_json).map_err(|e| StoreError::Query(e.to_string()))?,
    })
}

fn parse_run_status(raw: &str) -> Result<RunStatus, StoreError> {
    match raw {
        "RUNNING" => Ok(RunStatus::Running),
        "COMPLETED" => Ok(RunStatus::Completed),
        "FAILED" => Ok(RunStatus::Failed),
        other => Err(StoreError::Query(format!("unknown run status: {other}"))),
    }
}
