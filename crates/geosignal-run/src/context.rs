use std::sync::Arc;

use geosignal_config::PipelineConfig;
use geosignal_embed::Embedder;
use geosignal_enrich::{EntityExtractor, GeoResolver, LanguageIdentifier, TitleTranslator, TopicClassifier};
use geosignal_fetcher::Fetcher;
use geosignal_score::AlertDispatcher;
use geosignal_store::Store;
use geosignal_summarize::{LocalSummarizer, SummaryOracle};
use tokio_util::sync::CancellationToken;

/// Everything a stage needs, constructed once per `run()` invocation
/// and threaded through by reference — the Rust rendering of
/// spec.md's "explicit Context value constructed at run start" (§9
/// Design Notes). Model handles and the fetcher's state are
/// module-scoped and shared via `Arc` across concurrently processed
/// entries, not reconstructed per entry.
pub struct PipelineContext {
    pub config: Arc<PipelineConfig>,
    pub store: Store,
    pub fetcher: Arc<Fetcher>,
    pub language_identifier: Arc<dyn LanguageIdentifier>,
    pub translator: Arc<dyn TitleTranslator>,
    pub entity_extractor: Arc<dyn EntityExtractor>,
    pub geo_resolver: Arc<dyn GeoResolver>,
    /// Runs whenever configured, independent of `tier` (SPEC_FULL.md §3).
    pub topic_classifier: Option<Arc<dyn TopicClassifier>>,
    pub embedder: Arc<dyn Embedder>,
    pub local_summarizer: Arc<dyn LocalSummarizer>,
    pub oracle: Option<Arc<dyn SummaryOracle>>,
    /// Higher-quality oracle variant for the premium pass (spec.md
    /// §4.8): re-submits only the top-10%-by-size clusters, and its
    /// result supersedes the regular stage-2 summary on success.
    pub premium_oracle: Option<Arc<dyn SummaryOracle>>,
    pub alert_dispatcher: Arc<dyn AlertDispatcher>,
    pub cancel: CancellationToken,
}

impl PipelineContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PipelineConfig,
        store: Store,
        fetcher: Fetcher,
        language_identifier: Arc<dyn LanguageIdentifier>,
        translator: Arc<dyn TitleTranslator>,
        entity_extractor: Arc<dyn EntityExtractor>,
        geo_resolver: Arc<dyn GeoResolver>,
        topic_classifier: Option<Arc<dyn TopicClassifier>>,
        embedder: Arc<dyn Embedder>,
        local_summarizer: Arc<dyn LocalSummarizer>,
        oracle: Option<Arc<dyn SummaryOracle>>,
        premium_oracle: Option<Arc<dyn SummaryOracle>>,
        alert_dispatcher: Arc<dyn AlertDispatcher>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            fetcher: Arc::new(fetcher),
            language_identifier,
            translator,
            entity_extractor,
            geo_resolver,
            topic_classifier,
            embedder,
            local_summarizer,
            oracle,
            premium_oracle,
            alert_dispatcher,
            cancel: CancellationToken::new(),
        }
    }
}
