use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An input article reference, keyed by `entry_id`.
///
/// Created by the upstream system. The core mutates only the
/// enrichment fields, and only once per entry across the first run
/// that successfully processes it. `content` being non-null is the
/// single source of truth for "this entry has been processed" —
/// see the crate-level invariant notes in [`crate::job`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEntry {
    pub entry_id: Uuid,
    pub url: String,
    pub title: String,
    pub language: String,
    pub domain: String,
    pub flashpoint_id: Option<Uuid>,

    // Enrichment fields. `None`/empty until the core writes them back.
    pub title_en: Option<String>,
    pub hostname: Option<String>,
    pub content: Option<String>,
    pub compressed_content: Option<Vec<u8>>,
    pub summary: Option<String>,
    pub entities: Option<Entities>,
    pub geo_entities: Vec<GeoEntity>,
    pub images: Vec<String>,
}

impl FeedEntry {
    /// An entry is unprocessed iff its `content` column is still null.
    /// This is the resume predicate the run controller selects against.
    pub fn is_processed(&self) -> bool {
        self.content.is_some()
    }
}

/// Named-entity recognition output: entity class -> ordered, deduplicated
/// surface forms, plus a meta block describing the tagger run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    #[serde(flatten)]
    pub by_class: BTreeMap<String, Vec<String>>,
    pub meta: EntitiesMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitiesMeta {
    pub score: Option<f32>,
    pub model_id: Option<String>,
}

/// A country resolved from LOC/GPE entities, ordered by mention count
/// descending then name ascending by the geo resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeoEntity {
    pub name: String,
    pub alpha2: String,
    pub mentions: u32,
}
