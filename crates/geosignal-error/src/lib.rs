//! Stage-boundary error types.
//!
//! Every stage catches its own internal failures and maps them into
//! [`geosignal_types::FailureReason`] before they cross into the run
//! controller — no stage-internal error variant is ever matched on
//! outside the stage that produced it.

use geosignal_types::FailureReason;
use thiserror::Error;

/// Distinguishes an entry-scoped failure (isolate the entry, keep the
/// run going) from a stage-global failure (abort the stage and the
/// run). Implemented by every stage error type.
pub trait StageFatal {
    fn is_stage_fatal(&self) -> bool;
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connect/transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("http 4xx: {0}")]
    Http4xx(u16),
    #[error("http 5xx: {0}")]
    Http5xx(u16),
    #[error("circuit breaker open for host {0}")]
    DomainBlocked(String),
    #[error("run was cancelled")]
    Cancelled,
}

impl StageFatal for FetchError {
    fn is_stage_fatal(&self) -> bool {
        false
    }
}

impl From<&FetchError> for FailureReason {
    fn from(e: &FetchError) -> Self {
        match e {
            FetchError::Transport(_) => FailureReason::FetchError,
            FetchError::Timeout => FailureReason::Timeout,
            FetchError::Http4xx(_) => FailureReason::Http4xx,
            FetchError::Http5xx(_) => FailureReason::Http5xx,
            FetchError::DomainBlocked(_) => FailureReason::DomainBlocked,
            FetchError::Cancelled => FailureReason::Cancelled,
        }
    }
}

/// The extractor is pure and total: it either produces text or a
/// classified [`ExtractFailure`]. There is no "internal error" variant
/// because the cascade never performs I/O.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExtractFailure {
    #[error("no method produced enough content")]
    TooShort,
    #[error("page requires javascript rendering")]
    JsRequired,
    #[error("page is behind a paywall")]
    Paywall,
    #[error("page is blocked by a consent wall")]
    ConsentWall,
    #[error("no extractable text found")]
    NoText,
    #[error("document could not be parsed")]
    ParseError,
}

impl StageFatal for ExtractFailure {
    fn is_stage_fatal(&self) -> bool {
        false
    }
}

impl From<ExtractFailure> for FailureReason {
    fn from(e: ExtractFailure) -> Self {
        match e {
            ExtractFailure::TooShort => FailureReason::TooShort,
            ExtractFailure::JsRequired => FailureReason::JsRequired,
            ExtractFailure::Paywall => FailureReason::Paywall,
            ExtractFailure::ConsentWall => FailureReason::ConsentWall,
            ExtractFailure::NoText => FailureReason::NoText,
            ExtractFailure::ParseError => FailureReason::ParseError,
        }
    }
}

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding model error: {0}")]
    Model(String),
    #[error("vector store unreachable: {0}")]
    StoreUnreachable(String),
}

impl StageFatal for EmbedError {
    fn is_stage_fatal(&self) -> bool {
        matches!(self, Self::StoreUnreachable(_))
    }
}

impl From<&EmbedError> for FailureReason {
    fn from(_: &EmbedError) -> Self {
        FailureReason::EmbedError
    }
}

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("clustering failed for flashpoint {flashpoint_id}: {reason}")]
    Failed {
        flashpoint_id: uuid::Uuid,
        reason: String,
    },
}

impl StageFatal for ClusterError {
    fn is_stage_fatal(&self) -> bool {
        false
    }
}

impl From<&ClusterError> for FailureReason {
    fn from(_: &ClusterError) -> Self {
        FailureReason::ClusterError
    }
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("local summarizer error: {0}")]
    Local(String),
    #[error("oracle call failed after retries: {0}")]
    OracleExhausted(String),
    #[error("oracle provider unauthorized: {0}")]
    OracleUnauthorized(String),
}

impl StageFatal for SummarizeError {
    fn is_stage_fatal(&self) -> bool {
        matches!(self, Self::OracleUnauthorized(_))
    }
}

impl From<&SummarizeError> for FailureReason {
    fn from(_: &SummarizeError) -> Self {
        FailureReason::SummarizeError
    }
}

/// Stage-global failures: database unreachable, vector store down,
/// oracle provider unauthorized. These abort the stage and the run;
/// the run's `error_message` records the root cause.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database unreachable: {0}")]
    Unreachable(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_map_to_expected_reasons() {
        assert_eq!(
            FailureReason::from(&FetchError::Timeout),
            FailureReason::Timeout
        );
        assert_eq!(
            FailureReason::from(&FetchError::Http5xx(503)),
            FailureReason::Http5xx
        );
    }

    #[test]
    fn extract_failures_map_to_expected_reasons() {
        assert_eq!(
            FailureReason::from(ExtractFailure::JsRequired),
            FailureReason::JsRequired
        );
    }

    #[test]
    fn only_store_unreachable_embed_error_is_stage_fatal() {
        assert!(EmbedError::StoreUnreachable("down".into()).is_stage_fatal());
        assert!(!EmbedError::Model("oom".into()).is_stage_fatal());
    }
}
