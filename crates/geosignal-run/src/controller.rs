use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use geosignal_cluster::Clusterer;
use geosignal_dedupe::{DedupeIndex, DedupeVerdict};
use geosignal_embed::embed_all;
use geosignal_error::StoreError;
use geosignal_score::{score_clusters, top_k_flagged, AlertPayload, ClusterScoreInputs, ScoreWeights};
use geosignal_store::{feed_entries_table, news_clusters_table};
use geosignal_summarize::{fallback_summary, select_premium_clusters, summarize_many, synthesize_with_retry};
use geosignal_types::{
    ClusterMember, ClusterOutput, EntryVector, FailureReason, FeedEntry, FeedEntryJob, JobStatus,
    ProcessingRun, RunStatus, Tier,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::PipelineContext;
use crate::ingest::{ingest_entry, IngestOutcome};
use crate::metrics::MetricsAccumulator;
use crate::run_id::generate_run_id;

/// Token budget for the local extractive pass. Not operator-tunable —
/// unlike the oracle's model/endpoint, this is an implementation
/// detail of the bundled extractive summarizer.
const LOCAL_SUMMARY_MAX_TOKENS: usize = 120;

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("stage aborted: {0}")]
    StageFatal(String),
}

struct ExecutionSummary {
    selected_count: u32,
    processed_count: u32,
    failed_count: u32,
    metrics: geosignal_types::RunMetrics,
}

/// Orchestrates one pipeline run end to end (spec.md §4.1): opens the
/// run, resolves this run's date-partitioned tables, claims entries,
/// and dispatches each stage in order, gated by the run's tier. A
/// stage-global failure marks the run FAILED rather than panicking or
/// leaving the run row stuck RUNNING.
pub struct RunController {
    ctx: PipelineContext,
}

impl RunController {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Marks any run still RUNNING past `abandoned_run_timeout` as
    /// FAILED. Call once at process startup, before a new run begins
    /// (spec.md §4.1 Recovery policy).
    pub async fn sweep_abandoned_runs(&self) -> Result<Vec<String>, StoreError> {
        let timeout = chrono::Duration::from_std(self.ctx.config.abandoned_run_timeout)
            .unwrap_or_else(|_| chrono::Duration::hours(2));
        let abandoned = self.ctx.store.runs().sweep_abandoned(timeout).await?;
        for run_id in &abandoned {
            warn!(run_id, "marked abandoned run as failed at startup");
        }
        Ok(abandoned)
    }

    /// Runs the full pipeline for `target_date` at `tier`. Returns
    /// `Ok(run)` whenever the run record itself could be opened and
    /// closed, regardless of whether the pipeline completed or
    /// failed — `run.status` is the authoritative outcome. Only a
    /// failure to read or write the run's own bookkeeping rows
    /// propagates as `Err`.
    pub async fn run(&self, target_date: NaiveDate, tier: Tier) -> Result<ProcessingRun, StoreError> {
        let run_id = generate_run_id(Utc::now());
        let mut run = ProcessingRun::new(run_id.clone(), target_date, tier);
        self.ctx.store.runs().insert(&run).await?;
        info!(run_id = %run_id, %target_date, tier = tier.as_str(), "run started");

        match self.execute(&run_id, target_date, tier).await {
            Ok(summary) => {
                run.selected_count = summary.selected_count;
                run.processed_count = summary.processed_count;
                run.failed_count = summary.failed_count;
                run.metrics = summary.metrics;
                run.complete();
                self.ctx
                    .store
                    .runs()
                    .update_status(&run_id, RunStatus::Completed, run.completed_at, None)
                    .await?;
                self.ctx
                    .store
                    .runs()
                    .update_counters(&run_id, run.selected_count, run.processed_count, run.failed_count, &run.metrics)
                    .await?;
                info!(run_id = %run_id, processed = run.processed_count, failed = run.failed_count, "run completed");
            }
            Err(error) => {
                warn!(run_id = %run_id, error = %error, "run failed");
                run.fail(error.to_string());
                self.ctx
                    .store
                    .runs()
                    .update_status(&run_id, RunStatus::Failed, run.completed_at, run.error_message.as_deref())
                    .await?;
            }
        }

        Ok(run)
    }

    fn check_cancelled(&self) -> Result<(), RunError> {
        if self.ctx.cancel.is_cancelled() {
            Err(RunError::StageFatal("run was cancelled".to_string()))
        } else {
            Ok(())
        }
    }

    async fn execute(&self, run_id: &str, target_date: NaiveDate, tier: Tier) -> Result<ExecutionSummary, RunError> {
        let feed_table = feed_entries_table(target_date);
        let output_table = news_clusters_table(target_date);

        let entries_repo = self.ctx.store.feed_entries(feed_table)?;
        let clusters_repo = self.ctx.store.clusters(output_table)?;
        clusters_repo.ensure_output_table().await?;

        let selected = entries_repo.select_unprocessed(self.ctx.config.max_selected_entries).await?;
        let selected_count = selected.len() as u32;

        let mut metrics = MetricsAccumulator::default();
        let jobs_repo = self.ctx.store.jobs();

        let mut jobs: HashMap<Uuid, FeedEntryJob> = HashMap::with_capacity(selected.len());
        let mut claimed_entries = Vec::with_capacity(selected.len());
        for entry in selected {
            if jobs_repo.claim(run_id, entry.entry_id).await? {
                jobs.insert(entry.entry_id, FeedEntryJob::new(run_id, entry.entry_id));
                claimed_entries.push(entry);
            }
        }

        self.check_cancelled()?;

        // Stage: ingest (fetch -> extract -> enrich), fanned out with
        // the fetcher's own global/per-host semaphores as the true
        // concurrency bound.
        let ctx = &self.ctx;
        let ingestion_results: Vec<(Uuid, Result<IngestOutcome, FailureReason>)> = stream::iter(
            claimed_entries.into_iter().map(|entry| {
                let entry_id = entry.entry_id;
                async move { (entry_id, ingest_entry(ctx, entry).await) }
            }),
        )
        .buffer_unordered(self.ctx.config.max_concurrent_fetches.max(1))
        .collect()
        .await;

        let mut failed_count = 0u32;
        let mut extracted: Vec<FeedEntry> = Vec::new();

        for (entry_id, result) in ingestion_results {
            let job = jobs.get_mut(&entry_id).expect("job claimed above");
            match result {
                Ok(outcome) => {
                    job.fetch_completed_at = Some(Utc::now());
                    job.extract_completed_at = Some(Utc::now());
                    job.extraction_method = Some(outcome.extraction_method.to_string());
                    job.transition(JobStatus::Extracted);
                    jobs_repo.transition(job).await?;
                    entries_repo.write_enrichment(&outcome.entry).await?;
                    for guess in &outcome.topics {
                        self.ctx
                            .store
                            .topics()
                            .insert(&geosignal_store::TopicLabel {
                                entry_id,
                                topic: guess.topic.clone(),
                                confidence: guess.confidence,
                            })
                            .await?;
                    }
                    metrics.record_stage("extracted");
                    extracted.push(outcome.entry);
                }
                Err(reason) => {
                    job.transition(JobStatus::Failed { reason });
                    jobs_repo.transition(job).await?;
                    metrics.record_failure(reason);
                    failed_count += 1;
                }
            }
        }

        self.check_cancelled()?;

        // Stage: dedupe, scoped to this run's extracted bodies.
        let dedupe_pairs: Vec<(Uuid, String)> = extracted
            .iter()
            .map(|e| (e.entry_id, e.content.clone().unwrap_or_default()))
            .collect();
        let dedupe_index = DedupeIndex::new(self.ctx.config.minhash_threshold, self.ctx.config.minhash_shingle_size);
        let verdicts = dedupe_index.classify(&dedupe_pairs);

        let mut unique_entries: Vec<FeedEntry> = Vec::new();
        for entry in extracted {
            let job = jobs.get_mut(&entry.entry_id).expect("job claimed above");
            match verdicts.get(&entry.entry_id).expect("every extracted entry was classified") {
                DedupeVerdict::Duplicate { of, content_hash } => {
                    job.is_duplicate = true;
                    job.duplicate_of = Some(*of);
                    job.content_hash = Some(content_hash.clone());
                    job.transition(JobStatus::SkippedDuplicate);
                    jobs_repo.transition(job).await?;
                    metrics.record_stage("skipped_duplicate");
                }
                DedupeVerdict::Unique { content_hash, minhash_signature } => {
                    job.content_hash = Some(content_hash.clone());
                    job.minhash_signature = Some(minhash_signature.clone());
                    job.transition(JobStatus::Deduped);
                    jobs_repo.transition(job).await?;
                    metrics.record_stage("deduped");
                    unique_entries.push(entry);
                }
            }
        }

        self.check_cancelled()?;

        let mut cluster_outputs: Vec<ClusterOutput> = Vec::new();
        let mut alert_payloads: Vec<AlertPayload> = Vec::new();

        if tier.embeds_and_clusters() && !unique_entries.is_empty() {
            // Stage: embed, reusing the content-addressed vector cache
            // so a re-processed entry skips a fresh model call.
            let existing_ids: Vec<Uuid> = unique_entries.iter().map(|e| e.entry_id).collect();
            let existing = self.ctx.store.vectors().find_many(&existing_ids).await?;
            let mut vectors_by_id: HashMap<Uuid, EntryVector> =
                existing.into_iter().map(|v| (v.entry_id, v)).collect();

            let to_embed: Vec<&FeedEntry> = unique_entries
                .iter()
                .filter(|e| !vectors_by_id.contains_key(&e.entry_id))
                .collect();

            if !to_embed.is_empty() {
                let texts: Vec<String> = to_embed.iter().map(|e| e.content.clone().unwrap_or_default()).collect();
                let embeddings = embed_all(self.ctx.embedder.as_ref(), &texts, self.ctx.config.embedding_batch_size)
                    .await
                    .map_err(|e| RunError::StageFatal(format!("embedding failed: {e}")))?;

                for (entry, values) in to_embed.iter().zip(embeddings.into_iter()) {
                    let vector = EntryVector::new(entry.entry_id, values);
                    self.ctx.store.vectors().upsert(&vector).await?;
                    vectors_by_id.insert(entry.entry_id, vector);
                }
            }

            for entry in &unique_entries {
                if let Some(job) = jobs.get_mut(&entry.entry_id) {
                    job.embed_completed_at = Some(Utc::now());
                    job.transition(JobStatus::Embedded);
                    jobs_repo.transition(job).await?;
                    metrics.record_stage("embedded");
                }
            }

            self.check_cancelled()?;

            // Stage: cluster, strictly partitioned by flashpoint.
            let mut vectors_by_flashpoint: BTreeMap<Uuid, Vec<EntryVector>> = BTreeMap::new();
            let entries_by_id: HashMap<Uuid, &FeedEntry> =
                unique_entries.iter().map(|e| (e.entry_id, e)).collect();

            for entry in &unique_entries {
                let flashpoint_id = entry
                    .flashpoint_id
                    .expect("select_unprocessed only returns entries with flashpoint_id set");
                if let Some(vector) = vectors_by_id.get(&entry.entry_id) {
                    vectors_by_flashpoint.entry(flashpoint_id).or_default().push(vector.clone());
                }
            }

            let clusterer = Clusterer::new(self.ctx.config.cluster_knn_k, self.ctx.config.cluster_cosine_threshold);
            let clusters_by_flashpoint = clusterer.cluster_by_flashpoint(&vectors_by_flashpoint);

            let mut members_rows: Vec<ClusterMember> = Vec::new();
            for (flashpoint_id, clusters) in &clusters_by_flashpoint {
                for cluster in clusters {
                    let cluster_uuid = Uuid::new_v4();
                    for entry_id in &cluster.members {
                        members_rows.push(ClusterMember {
                            run_id: run_id.to_string(),
                            flashpoint_id: *flashpoint_id,
                            cluster_uuid,
                            entry_id: *entry_id,
                        });
                    }
                }
            }
            clusters_repo.replace_members(run_id, &members_rows).await?;

            for member in &members_rows {
                if let Some(job) = jobs.get_mut(&member.entry_id) {
                    job.cluster_completed_at = Some(Utc::now());
                    job.transition(JobStatus::Clustered);
                    jobs_repo.transition(job).await?;
                    metrics.record_stage("clustered");
                }
            }

            self.check_cancelled()?;

            // Stage: summarize (local extractive pass, then an
            // optional oracle synthesis pass over the largest
            // clusters).
            let mut stage1_by_id: HashMap<Uuid, String> = HashMap::new();
            if tier.summarizes_locally() {
                let texts: Vec<(Uuid, String)> = unique_entries
                    .iter()
                    .map(|e| (e.entry_id, e.content.clone().unwrap_or_default()))
                    .collect();
                let summaries = summarize_many(
                    Arc::clone(&self.ctx.local_summarizer),
                    texts,
                    LOCAL_SUMMARY_MAX_TOKENS,
                    self.ctx.config.local_summarizer_workers,
                )
                .await;
                stage1_by_id = summaries.into_iter().collect();
            }

            let cluster_sizes: Vec<(Uuid, u32, usize)> = clusters_by_flashpoint
                .iter()
                .flat_map(|(fp, clusters)| clusters.iter().map(move |c| (*fp, c.cluster_id, c.members.len())))
                .collect();
            let premium_set = if tier.summarizes_with_oracle() {
                select_premium_clusters(&cluster_sizes, self.ctx.config.premium_pass_fraction)
            } else {
                HashSet::new()
            };

            let mut summary_by_cluster: HashMap<(Uuid, u32), String> = HashMap::new();
            for (flashpoint_id, clusters) in &clusters_by_flashpoint {
                for cluster in clusters {
                    let stage1_summaries: Vec<String> = cluster
                        .members
                        .iter()
                        .map(|id| stage1_by_id.get(id).cloned().unwrap_or_default())
                        .collect();
                    let payload = stage1_summaries.join("\n\n");
                    let key = (*flashpoint_id, cluster.cluster_id);

                    // Stage 2: the oracle is called for every cluster
                    // in tier C, not just the premium set.
                    let mut summary = if let Some(oracle) = &self.ctx.oracle {
                        match synthesize_with_retry(oracle.as_ref(), &payload, self.ctx.config.oracle_max_retries).await {
                            Ok(synthesized) => synthesized,
                            Err(e) => {
                                warn!(
                                    run_id,
                                    flashpoint_id = %flashpoint_id,
                                    cluster_id = cluster.cluster_id,
                                    error = %e,
                                    "oracle exhausted, using fallback summary"
                                );
                                fallback_summary(&stage1_summaries).unwrap_or_default().to_string()
                            }
                        }
                    } else {
                        fallback_summary(&stage1_summaries).unwrap_or_default().to_string()
                    };

                    // Premium pass: the top 10% by pre-summarization
                    // size are optionally re-submitted to a
                    // higher-quality oracle variant, whose result
                    // supersedes stage 2 on success.
                    if premium_set.contains(&key) {
                        if let Some(premium_oracle) = &self.ctx.premium_oracle {
                            match synthesize_with_retry(premium_oracle.as_ref(), &payload, self.ctx.config.oracle_max_retries).await {
                                Ok(synthesized) => summary = synthesized,
                                Err(e) => warn!(
                                    run_id,
                                    flashpoint_id = %flashpoint_id,
                                    cluster_id = cluster.cluster_id,
                                    error = %e,
                                    "premium oracle exhausted, keeping stage 2 summary"
                                ),
                            }
                        }
                    }

                    summary_by_cluster.insert(key, summary);

                    for entry_id in &cluster.members {
                        if let Some(job) = jobs.get_mut(entry_id) {
                            job.summarize_completed_at = Some(Utc::now());
                            job.transition(JobStatus::Summarized);
                            jobs_repo.transition(job).await?;
                            metrics.record_stage("summarized");
                        }
                    }
                }
            }

            self.check_cancelled()?;

            // Stage: score, then top-K alert dispatch.
            let weights = ScoreWeights {
                member_count: self.ctx.config.score_weight_member_count,
                domain_diversity: self.ctx.config.score_weight_domain_diversity,
                language_diversity: self.ctx.config.score_weight_language_diversity,
                temporal_burstiness: self.ctx.config.score_weight_temporal_burstiness,
            };

            let mut score_inputs: Vec<ClusterScoreInputs> = Vec::new();
            for (flashpoint_id, clusters) in &clusters_by_flashpoint {
                for cluster in clusters {
                    let members: Vec<&FeedEntry> = cluster
                        .members
                        .iter()
                        .filter_map(|id| entries_by_id.get(id).copied())
                        .collect();
                    let domain_count = members.iter().map(|e| e.domain.as_str()).collect::<HashSet<_>>().len();
                    let language_count = members.iter().map(|e| e.language.as_str()).collect::<HashSet<_>>().len();
                    let seen_dates: Vec<NaiveDate> = cluster
                        .members
                        .iter()
                        .map(|id| {
                            jobs.get(id)
                                .and_then(|j| j.fetch_completed_at)
                                .map(|t| t.date_naive())
                                .unwrap_or(target_date)
                        })
                        .collect();

                    score_inputs.push(ClusterScoreInputs {
                        flashpoint_id: *flashpoint_id,
                        cluster_id: cluster.cluster_id,
                        member_count: cluster.members.len(),
                        domain_count,
                        language_count,
                        seen_dates,
                    });
                }
            }

            let scored = score_clusters(&score_inputs, &weights);
            let flagged = top_k_flagged(&scored, self.ctx.config.alert_top_k);

            for (flashpoint_id, clusters) in &clusters_by_flashpoint {
                for cluster in clusters {
                    let mut members: Vec<&FeedEntry> = cluster
                        .members
                        .iter()
                        .filter_map(|id| entries_by_id.get(id).copied())
                        .collect();
                    members.sort_by_key(|e| e.entry_id);

                    let key = (*flashpoint_id, cluster.cluster_id);
                    let output = ClusterOutput {
                        run_id: run_id.to_string(),
                        flashpoint_id: *flashpoint_id,
                        cluster_id: cluster.cluster_id,
                        summary: summary_by_cluster.get(&key).cloned(),
                        article_count: cluster.members.len() as u32,
                        top_domains: members.iter().map(|e| e.domain.clone()).collect(),
                        languages: members.iter().map(|e| e.language.clone()).collect(),
                        urls: members.iter().map(|e| e.url.clone()).collect(),
                        images: members.iter().flat_map(|e| e.images.clone()).collect(),
                        created_at: Utc::now(),
                    };
                    clusters_repo.upsert_output(&output).await?;
                    cluster_outputs.push(output);

                    for entry_id in &cluster.members {
                        if let Some(job) = jobs.get_mut(entry_id) {
                            job.score_completed_at = Some(Utc::now());
                            job.transition(JobStatus::Scored);
                            jobs_repo.transition(job).await?;
                            metrics.record_stage("scored");
                        }
                    }
                }
            }

            for item in &flagged {
                let inputs = &item.0;
                let score = &item.1;
                let key = (inputs.flashpoint_id, inputs.cluster_id);
                let top_domains = cluster_outputs
                    .iter()
                    .find(|c| c.flashpoint_id == inputs.flashpoint_id && c.cluster_id == inputs.cluster_id)
                    .map(|c| c.top_domains.clone())
                    .unwrap_or_default();

                alert_payloads.push(AlertPayload {
                    run_id: run_id.to_string(),
                    flashpoint_id: inputs.flashpoint_id,
                    cluster_id: inputs.cluster_id,
                    score: score.total,
                    summary: summary_by_cluster.get(&key).cloned(),
                    member_count: inputs.member_count,
                    top_domains,
                });
            }
        }

        if let Err(e) = self.ctx.alert_dispatcher.dispatch(run_id, &alert_payloads).await {
            warn!(run_id, error = %e, "alert dispatch failed, continuing");
        }

        let processed_count = jobs
            .values()
            .filter(|job| !matches!(job.status, JobStatus::Failed { .. }))
            .count() as u32;

        Ok(ExecutionSummary {
            selected_count,
            processed_count,
            failed_count,
            metrics: metrics.finish(self.ctx.fetcher.high_water_mark() as u32),
        })
    }
}
