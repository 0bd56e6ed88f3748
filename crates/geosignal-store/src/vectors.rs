use geosignal_error::StoreError;
use geosignal_types::EntryVector;
use pgvector::Vector;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// `feed_entry_vectors` sidecar table: a content-addressed cache keyed
/// by `entry_id`, not `(run_id, entry_id)` — re-processing an entry in
/// a later run reuses its prior vector rather than re-embedding
/// (spec.md §9 Design Notes).
pub struct VectorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VectorRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Upserts a vector for `entry_id`. Idempotent for the same
    /// `(entry_id, text)` pair by construction: the caller only
    /// re-embeds when the stored vector is absent, and this write
    /// always reflects the latest embedding for that id.
    pub async fn upsert(&self, vector: &EntryVector) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO feed_entry_vectors (entry_id, embedding, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (entry_id) DO UPDATE SET embedding = EXCLUDED.embedding, updated_at = now()
            "#,
        )
        .bind(vector.entry_id)
        .bind(Vector::from(vector.values.clone()))
        .execute(self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    pub async fn find(&self, entry_id: Uuid) -> Result<Option<EntryVector>, StoreError> {
        let row = sqlx::query("SELECT entry_id, embedding FROM feed_entry_vectors WHERE entry_id = $1")
            .bind(entry_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        row.map(row_to_vector).transpose()
    }

    /// Loads every stored vector for the given entry ids, in whatever
    /// order the database returns them — callers that need a
    /// deterministic order (the clusterer) sort afterward.
    pub async fn find_many(&self, entry_ids: &[Uuid]) -> Result<Vec<EntryVector>, StoreError> {
        if entry_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query("SELECT entry_id, embedding FROM feed_entry_vectors WHERE entry_id = ANY($1)")
            .bind(entry_ids)
            .fetch_all(self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.into_iter().map(row_to_vector).collect()
    }
}

fn row_to_vector(row: sqlx::postgres::PgRow) -> Result<EntryVector, StoreError> {
    let embedding: Vector = row.get("embedding");
    Ok(EntryVector::new(row.get("entry_id"), embedding.to_vec()))
}
