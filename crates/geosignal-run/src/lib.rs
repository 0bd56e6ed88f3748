//! Run lifecycle, per-entry stage dispatch, and the run's own job
//! state machine. Everything upstream (fetch, extract, enrich, dedupe,
//! embed, cluster, summarize, score) is a pure or narrowly-scoped
//! library; this crate is where those libraries get wired into one
//! resumable, tier-gated, per-date pipeline run (spec.md §4.1).

mod context;
mod controller;
mod ingest;
mod metrics;
mod run_id;

pub use context::PipelineContext;
pub use controller::RunController;
pub use ingest::{ingest_entry, IngestOutcome};
pub use run_id::generate_run_id;
