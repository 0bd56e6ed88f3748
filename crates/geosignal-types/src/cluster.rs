use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Internal grouping of entries produced by the clusterer, scoped to
/// `(run_id, flashpoint_id)`. `cluster_uuid` is an internal handle;
/// the externally visible `cluster_id` (dense rank) lives on
/// [`ClusterOutput`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterMember {
    pub run_id: String,
    pub flashpoint_id: Uuid,
    pub cluster_uuid: Uuid,
    pub entry_id: Uuid,
}

/// The external, dense-ranked view of a cluster delivered downstream.
///
/// `cluster_id` is a dense rank (1, 2, 3, ...) over this run's
/// components for a flashpoint, sorted by size descending then by
/// smallest member `entry_id` ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterOutput {
    pub run_id: String,
    pub flashpoint_id: Uuid,
    pub cluster_id: u32,
    pub summary: Option<String>,
    pub article_count: u32,
    pub top_domains: Vec<String>,
    pub languages: Vec<String>,
    pub urls: Vec<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}
