//! PostgreSQL persistence for date-partitioned input/output tables
//! and the core's own sidecar state tables.
//!
//! No `sqlx::query!`/`query_as!` compile-time macros are used anywhere
//! in this crate: date-partitioned table names can't be expressed
//! through a static ORM, so every query here is runtime-checked
//! (`sqlx::query`/`query_as`) with bound values and a whitelisted,
//! validated identifier for the table name itself (spec.md §9 Design
//! Notes). JSON-valued binds use an explicit `CAST($n AS jsonb)`
//! rather than the `::jsonb` shorthand, per the binding constraint in
//! spec.md §6.

mod clusters;
mod entries;
mod identifiers;
mod jobs;
mod runs;
mod topics;
mod vectors;

pub use clusters::ClusterRepository;
pub use entries::FeedEntryRepository;
pub use identifiers::{feed_entries_table, flashpoint_table, news_clusters_table, validate_identifier};
pub use jobs::JobRepository;
pub use runs::RunRepository;
pub use topics::{TopicLabel, TopicRepository};
pub use vectors::VectorRepository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Owns the bounded connection pool (default 20, per spec.md §5) and
/// hands out scoped repositories. Constructed once per process and
/// shared via the run controller's `PipelineContext`.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, geosignal_error::StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| geosignal_error::StoreError::Unreachable(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn runs(&self) -> RunRepository<'_> {
        RunRepository::new(&self.pool)
    }

    pub fn jobs(&self) -> JobRepository<'_> {
        JobRepository::new(&self.pool)
    }

    pub fn vectors(&self) -> VectorRepository<'_> {
        VectorRepository::new(&self.pool)
    }

    pub fn topics(&self) -> TopicRepository<'_> {
        TopicRepository::new(&self.pool)
    }

    pub fn feed_entries(&self, table: impl Into<String>) -> Result<FeedEntryRepository<'_>, geosignal_error::StoreError> {
        FeedEntryRepository::new(&self.pool, table)
    }

    pub fn clusters(&self, output_table: impl Into<String>) -> Result<ClusterRepository<'_>, geosignal_error::StoreError> {
        ClusterRepository::new(&self.pool, output_table)
    }
}
