use geosignal_error::StoreError;
use geosignal_types::{Entities, FeedEntry, GeoEntity};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::identifiers::validate_identifier;

/// Reads from and writes back to a single date-partitioned
/// `feed_entries_<YYYYMMDD>` table. The table name is validated once
/// at construction, not re-validated per query.
pub struct FeedEntryRepository<'a> {
    pool: &'a PgPool,
    table: String,
}

impl<'a> FeedEntryRepository<'a> {
    pub fn new(pool: &'a PgPool, table: impl Into<String>) -> Result<Self, StoreError> {
        let table = table.into();
        validate_identifier(&table)?;
        Ok(Self { pool, table })
    }

    /// Selects up to `limit` entries that belong to a flashpoint and
    /// have not yet been processed (`content IS NULL` — spec.md §4.1
    /// step 4 / §3 invariant). Ordered by `entry_id` for a stable,
    /// reproducible selection across repeated calls against unchanged
    /// data.
    pub async fn select_unprocessed(&self, limit: i64) -> Result<Vec<FeedEntry>, StoreError> {
        let sql = format!(
            r#"
            SELECT entry_id, url, title, language, domain, flashpoint_id,
                   title_en, hostname, content, compressed_content, summary,
                   entities, geo_entities, images
            FROM {table}
            WHERE flashpoint_id IS NOT NULL AND content IS NULL
            ORDER BY entry_id
            LIMIT $1
            "#,
            table = self.table
        );

        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.into_iter().map(row_to_entry).collect()
    }

    pub async fn find(&self, entry_id: Uuid) -> Result<Option<FeedEntry>, StoreError> {
        let sql = format!(
            r#"
            SELECT entry_id, url, title, language, domain, flashpoint_id,
                   title_en, hostname, content, compressed_content, summary,
                   entities, geo_entities, images
            FROM {table}
            WHERE entry_id = $1
            "#,
            table = self.table
        );

        let row = sqlx::query(&sql)
            .bind(entry_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        row.map(row_to_entry).transpose()
    }

    /// Writes back the enrichment columns. Writing a non-null
    /// `content` is what makes the entry "processed" — the single
    /// source of truth for cross-run resume (spec.md §3). JSON values
    /// are cast explicitly via `CAST($n AS jsonb)` per the binding
    /// constraint in spec.md §6.
    pub async fn write_enrichment(&self, entry: &FeedEntry) -> Result<(), StoreError> {
        let sql = format!(
            r#"
            UPDATE {table}
            SET title_en = $2, hostname = $3, content = $4, compressed_content = $5,
                summary = $6, entities = CAST($7 AS jsonb), geo_entities = CAST($8 AS jsonb),
                images = $9
            WHERE entry_id = $1
            "#,
            table = self.table
        );

        let entities_json = entry
            .entities
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let geo_json = serde_json::to_value(&entry.geo_entities)
            .map_err(|e| StoreError::Query(e.to_string()))?;

        sqlx::query(&sql)
            .bind(entry.entry_id)
            .bind(&entry.title_en)
            .bind(&entry.hostname)
            .bind(&entry.content)
            .bind(&entry.compressed_content)
            .bind(&entry.summary)
            .bind(entities_json)
            .bind(geo_json)
            .bind(&entry.images)
            .execute(self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }
}

fn row_to_entry(row: sqlx::postgres::PgRow) -> Result<FeedEntry, StoreError> {
    let entities_json: Option<serde_json::Value> = row.get("entities");
    let geo_json: Option<serde_json::Value> = row.get("geo_entities");

    let entities: Option<Entities> = entities_json
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| StoreError::Query(e.to_string()))?;
    let geo_entities: Vec<GeoEntity> = geo_json
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| StoreError::Query(e.to_string()))?
        .unwrap_or_default();

    Ok(FeedEntry {
        entry_id: row.get("entry_id"),
        url: row.get("url"),
        title: row.get("title"),
        language: row.get("language"),
        domain: row.get("domain"),
        flashpoint_id: row.get("flashpoint_id"),
        title_en: row.get("title_en"),
        hostname: row.get("hostname"),
        content: row.get("content"),
        compressed_content: row.get("compressed_content"),
        summary: row.get("summary"),
        entities,
        geo_entities,
        images: row.get::<Option<Vec<String>>, _>("images").unwrap_or_default(),
    })
}

