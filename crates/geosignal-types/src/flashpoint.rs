use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A geopolitical situation that groups related news entries.
///
/// Identity is externally assigned and immutable; the core only ever
/// reads this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashpoint {
    pub fp_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub domain_hints: Vec<String>,
}
