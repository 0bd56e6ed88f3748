//! Language identification, title translation, hostname derivation,
//! named-entity recognition and geo resolution.
//!
//! Each enricher is a small trait with a deterministic/offline default
//! implementation, constructed once per run and shared via `Arc`
//! across concurrently-processed entries.

pub mod geo;
pub mod hostname;
pub mod lang;
pub mod ner;
pub mod topic;
pub mod translate;

pub use geo::{GazetteerGeoResolver, GeoResolver};
pub use hostname::extract_hostname;
pub use lang::{LanguageGuess, LanguageIdentifier, StopwordLanguageIdentifier};
pub use ner::{EntityExtractor, HeuristicEntityExtractor};
pub use topic::{KeywordTopicClassifier, TopicClassifier, TopicGuess};
pub use translate::{CopyFallbackTranslator, TitleTranslator};
