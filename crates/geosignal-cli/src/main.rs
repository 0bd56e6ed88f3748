//! geosignal — command-line entry point for the enrichment and
//! clustering pipeline.
//!
//! Reads all tunables from the environment via
//! `geosignal_config::PipelineConfig::from_env` (see that crate's docs
//! for the full variable list). This binary owns process wiring only:
//! constructing the store, fetcher, enrichers and model handles once,
//! then handing them to `geosignal_run::RunController` for one run.

use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use geosignal_config::PipelineConfig;
use geosignal_embed::{BgeEmbedder, DeterministicEmbedder, Embedder};
use geosignal_enrich::{
    CopyFallbackTranslator, GazetteerGeoResolver, HeuristicEntityExtractor, KeywordTopicClassifier,
    StopwordLanguageIdentifier, TopicClassifier,
};
use geosignal_fetcher::Fetcher;
use geosignal_run::{PipelineContext, RunController};
use geosignal_score::{AlertDispatcher, NullAlertDispatcher, WebhookAlertDispatcher};
use geosignal_store::Store;
use geosignal_summarize::{HttpSummaryOracle, LeadingSentenceSummarizer, SummaryOracle};
use geosignal_types::Tier;

#[derive(Parser)]
#[command(name = "geosignal", about = "Daily news enrichment and clustering pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once for a target date.
    Run {
        /// Target date (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Overrides PIPELINE_TIER for this invocation (A, B, or C).
        #[arg(long)]
        tier: Option<String>,
    },
    /// Mark any run stuck RUNNING past the abandoned-run timeout as
    /// FAILED, without starting a new run.
    Sweep,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,geosignal=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = PipelineConfig::from_env()?;

    match cli.command {
        Command::Sweep => {
            let store = Store::connect(&config.database_url, config.db_pool_max_connections).await?;
            let controller = RunController::new(build_context(config, store).await?);
            let abandoned = controller.sweep_abandoned_runs().await?;
            println!("swept {} abandoned run(s)", abandoned.len());
        }
        Command::Run { date, tier } => {
            if let Some(tier) = tier {
                config.tier = tier.parse::<Tier>().map_err(anyhow::Error::msg)?;
            }
            let target_date = date.unwrap_or_else(|| chrono::Utc::now().date_naive());
            let run_budget = config.run_budget;

            let store = Store::connect(&config.database_url, config.db_pool_max_connections).await?;
            let tier = config.tier;
            let ctx = build_context(config, store).await?;
            let cancel = ctx.cancel.clone();
            let controller = RunController::new(ctx);

            controller.sweep_abandoned_runs().await?;

            let deadline = tokio::spawn(async move {
                tokio::time::sleep(run_budget).await;
                cancel.cancel();
            });

            let run = controller.run(target_date, tier).await?;
            deadline.abort();

            println!(
                "run {} finished as {:?}: selected={} processed={} failed={}",
                run.run_id, run.status, run.selected_count, run.processed_count, run.failed_count
            );
            if let Some(message) = &run.error_message {
                eprintln!("error: {message}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn build_context(config: PipelineConfig, store: Store) -> anyhow::Result<PipelineContext> {
    let fetcher = Fetcher::new(&config)?;

    let embedder: Arc<dyn Embedder> = if config.tier.embeds_and_clusters() {
        Arc::new(BgeEmbedder::load()?)
    } else {
        Arc::new(DeterministicEmbedder::new(config.embedding_dim))
    };

    let oracle: Option<Arc<dyn SummaryOracle>> = if config.tier.summarizes_with_oracle() {
        let oracle = oracle_from_env("ORACLE");
        if oracle.is_none() {
            tracing::warn!("tier C configured but ORACLE_ENDPOINT/ORACLE_API_KEY/ORACLE_MODEL are not all set, cluster summaries will fall back to the local pass");
        }
        oracle
    } else {
        None
    };

    // Premium pass (spec.md §4.8): an optional higher-quality variant
    // re-submitted only for the top-10%-by-size clusters. Absent this
    // config, every cluster simply keeps its stage-2 summary.
    let premium_oracle: Option<Arc<dyn SummaryOracle>> =
        if config.tier.summarizes_with_oracle() { oracle_from_env("PREMIUM_ORACLE") } else { None };

    let topic_classifier: Option<Arc<dyn TopicClassifier>> = match std::env::var("TOPIC_CLASSIFIER_ENABLED") {
        Ok(value) if value == "1" || value.eq_ignore_ascii_case("true") => Some(Arc::new(KeywordTopicClassifier)),
        _ => None,
    };

    let alert_dispatcher: Arc<dyn AlertDispatcher> = match &config.alert_webhook_url {
        Some(url) => Arc::new(WebhookAlertDispatcher::new(url.clone())),
        None => Arc::new(NullAlertDispatcher),
    };

    Ok(PipelineContext::new(
        config,
        store,
        fetcher,
        Arc::new(StopwordLanguageIdentifier),
        Arc::new(CopyFallbackTranslator),
        Arc::new(HeuristicEntityExtractor),
        Arc::new(GazetteerGeoResolver),
        topic_classifier,
        embedder,
        Arc::new(LeadingSentenceSummarizer),
        oracle,
        premium_oracle,
        alert_dispatcher,
    ))
}

/// Builds an `HttpSummaryOracle` from `{prefix}_ENDPOINT/_API_KEY/_MODEL`
/// (and optional `{prefix}_PROVIDER`, default anthropic-style). `None`
/// if any of the three required variables is unset.
fn oracle_from_env(prefix: &str) -> Option<Arc<dyn SummaryOracle>> {
    let endpoint = std::env::var(format!("{prefix}_ENDPOINT")).ok()?;
    let api_key = std::env::var(format!("{prefix}_API_KEY")).ok()?;
    let model = std::env::var(format!("{prefix}_MODEL")).ok()?;
    let provider = std::env::var(format!("{prefix}_PROVIDER")).unwrap_or_else(|_| "anthropic-style".to_string());

    let oracle: Arc<dyn SummaryOracle> = if provider == "openai-style" {
        Arc::new(HttpSummaryOracle::openai_style(endpoint, api_key, model))
    } else {
        Arc::new(HttpSummaryOracle::anthropic_style(endpoint, api_key, model))
    };
    Some(oracle)
}
