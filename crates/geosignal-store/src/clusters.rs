use geosignal_error::StoreError;
use geosignal_types::{ClusterMember, ClusterOutput};
use sqlx::{PgPool, Row};

use crate::identifiers::validate_identifier;

/// `cluster_members` (internal, static table) and the per-date
/// `news_clusters_<YYYYMMDD>` output table (created on demand by the
/// core, per spec.md §6).
pub struct ClusterRepository<'a> {
    pool: &'a PgPool,
    output_table: String,
}

impl<'a> ClusterRepository<'a> {
    pub fn new(pool: &'a PgPool, output_table: impl Into<String>) -> Result<Self, StoreError> {
        let output_table = output_table.into();
        validate_identifier(&output_table)?;
        Ok(Self { pool, output_table })
    }

    /// Creates the output partition if it doesn't already exist
    /// (spec.md §4.1 step 3 / §6).
    pub async fn ensure_output_table(&self) -> Result<(), StoreError> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                flashpoint_id uuid NOT NULL,
                cluster_id integer NOT NULL,
                summary text,
                article_count integer NOT NULL,
                top_domains jsonb NOT NULL DEFAULT '[]',
                languages jsonb NOT NULL DEFAULT '[]',
                urls jsonb NOT NULL DEFAULT '[]',
                images jsonb NOT NULL DEFAULT '[]',
                created_at timestamptz NOT NULL DEFAULT now(),
                PRIMARY KEY (flashpoint_id, cluster_id)
            )
            "#,
            table = self.output_table
        );

        sqlx::query(&sql)
            .execute(self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    /// Re-inserting `cluster_members` for a run is safe because rows
    /// are scoped by `run_id` — a stage re-entry deletes and
    /// re-inserts this run's rows rather than accumulating duplicates
    /// (spec.md §4.9: "cluster rows scoped by run_id so they can be
    /// safely re-generated").
    pub async fn replace_members(&self, run_id: &str, members: &[ClusterMember]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| StoreError::Query(e.to_string()))?;

        sqlx::query("DELETE FROM cluster_members WHERE run_id = $1")
            .bind(run_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        for member in members {
            sqlx::query(
                r#"
                INSERT INTO cluster_members (run_id, flashpoint_id, cluster_uuid, entry_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&member.run_id)
            .bind(member.flashpoint_id)
            .bind(member.cluster_uuid)
            .bind(member.entry_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        }

        tx.commit().await.map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    pub async fn upsert_output(&self, output: &ClusterOutput) -> Result<(), StoreError> {
        let sql = format!(
            r#"
            INSERT INTO {table}
                (flashpoint_id, cluster_id, summary, article_count, top_domains,
                 languages, urls, images, created_at)
            VALUES ($1, $2, $3, $4, CAST($5 AS jsonb), CAST($6 AS jsonb), CAST($7 AS jsonb), CAST($8 AS jsonb), $9)
            ON CONFLICT (flashpoint_id, cluster_id) DO UPDATE SET
                summary = EXCLUDED.summary,
                article_count = EXCLUDED.article_count,
                top_domains = EXCLUDED.top_domains,
                languages = EXCLUDED.languages,
                urls = EXCLUDED.urls,
                images = EXCLUDED.images,
                created_at = EXCLUDED.created_at
            "#,
            table = self.output_table
        );

        sqlx::query(&sql)
            .bind(output.flashpoint_id)
            .bind(output.cluster_id as i32)
            .bind(&output.summary)
            .bind(output.article_count as i32)
            .bind(serde_json::to_value(&output.top_domains).map_err(|e| StoreError::Query(e.to_string()))?)
            .bind(serde_json::to_value(&output.languages).map_err(|e| StoreError::Query(e.to_string()))?)
            .bind(serde_json::to_value(&output.urls).map_err(|e| StoreError::Query(e.to_string()))?)
            .bind(serde_json::to_value(&output.images).map_err(|e| StoreError::Query(e.to_string()))?)
            .bind(output.created_at)
            .execute(self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    pub async fn members_for_run(&self, run_id: &str) -> Result<Vec<ClusterMember>, StoreError> {
        let rows = sqlx::query(
            "SELECT run_id, flashpoint_id, cluster_uuid, entry_id FROM cluster_members WHERE run_id = $1",
        )
        .bind(run_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| ClusterMember {
                run_id: row.get("run_id"),
                flashpoint_id: row.get("flashpoint_id"),
                cluster_uuid: row.get("cluster_uuid"),
                entry_id: row.get("entry_id"),
            })
            .collect())
    }
}

