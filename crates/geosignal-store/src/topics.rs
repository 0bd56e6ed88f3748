use geosignal_error::StoreError;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// A single topic label attached to an entry by the optional,
/// tier-independent topic classifier (SPEC_FULL.md §3 — the
/// distillation's inconsistent "Week 3" / per-tier language is
/// resolved by treating this as an enricher with no tier gate of its
/// own).
#[derive(Debug, Clone, PartialEq)]
pub struct TopicLabel {
    pub entry_id: Uuid,
    pub topic: String,
    pub confidence: f32,
}

/// `feed_entry_topics` sidecar table.
pub struct TopicRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TopicRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, label: &TopicLabel) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO feed_entry_topics (entry_id, topic, confidence)
            VALUES ($1, $2, $3)
            ON CONFLICT (entry_id, topic) DO UPDATE SET confidence = EXCLUDED.confidence
            "#,
        )
        .bind(label.entry_id)
        .bind(&label.topic)
        .bind(label.confidence)
        .execute(self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    pub async fn for_entry(&self, entry_id: Uuid) -> Result<Vec<TopicLabel>, StoreError> {
        let rows = sqlx::query("SELECT entry_id, topic, confidence FROM feed_entry_topics WHERE entry_id = $1")
            .bind(entry_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| TopicLabel {
                entry_id: row.get("entry_id"),
                topic: row.get("topic"),
                confidence: row.get("confidence"),
            })
            .collect())
    }
}
