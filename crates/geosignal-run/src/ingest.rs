use geosignal_enrich::TopicGuess;
use geosignal_types::{FailureReason, FeedEntry};

use crate::context::PipelineContext;

pub struct IngestOutcome {
    pub entry: FeedEntry,
    pub extraction_method: &'static str,
    pub topics: Vec<TopicGuess>,
}

/// Runs fetch -> extract -> enrich for one entry, in that fixed order
/// (spec.md §5: "stages run strictly in order per entry"). Any stage
/// failure maps to a [`FailureReason`] and the entry is isolated —
/// this function never panics or propagates a raw stage error.
pub async fn ingest_entry(ctx: &PipelineContext, mut entry: FeedEntry) -> Result<IngestOutcome, FailureReason> {
    let page = ctx
        .fetcher
        .fetch(&entry.url, &ctx.cancel)
        .await
        .map_err(|e| FailureReason::from(&e))?;

    let extraction = geosignal_extractor::extract(&page.body, ctx.config.min_content_length)
        .map_err(FailureReason::from)?;

    let lang_guess = ctx.language_identifier.identify(&extraction.text);
    let source_lang = if entry.language.trim().is_empty() {
        lang_guess.code.clone()
    } else {
        entry.language.clone()
    };

    let title_en = ctx
        .translator
        .translate_title(&entry.title, &source_lang)
        .unwrap_or_else(|| entry.title.clone());

    let hostname = geosignal_enrich::extract_hostname(&entry.url);

    let entities = ctx.entity_extractor.extract(&extraction.text);
    let loc_and_gpe: Vec<&str> = entities
        .by_class
        .get("LOC")
        .into_iter()
        .chain(entities.by_class.get("GPE"))
        .flatten()
        .map(String::as_str)
        .collect();
    let geo_entities = ctx.geo_resolver.resolve(&loc_and_gpe);

    let topics = ctx
        .topic_classifier
        .as_ref()
        .map(|classifier| classifier.classify(&extraction.text))
        .unwrap_or_default();

    entry.content = Some(extraction.text);
    entry.title_en = Some(title_en);
    entry.hostname = hostname;
    entry.entities = Some(entities);
    entry.geo_entities = geo_entities;

    Ok(IngestOutcome {
        entry,
        extraction_method: extraction.method,
        topics,
    })
}
