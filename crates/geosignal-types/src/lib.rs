//! Core domain types shared by every stage of the enrichment and
//! clustering pipeline.
//!
//! Nothing in this crate talks to a database or the network — it is the
//! vocabulary the rest of the workspace is written against.

pub mod cluster;
pub mod failure;
pub mod feed_entry;
pub mod flashpoint;
pub mod job;
pub mod run;
pub mod vector;

pub use cluster::{ClusterMember, ClusterOutput};
pub use failure::FailureReason;
pub use feed_entry::{Entities, FeedEntry, GeoEntity};
pub use flashpoint::Flashpoint;
pub use job::{FeedEntryJob, JobStatus};
pub use run::{ProcessingRun, RunMetrics, RunStatus, Tier};
pub use vector::EntryVector;
