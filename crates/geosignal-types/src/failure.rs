use serde::{Deserialize, Serialize};

/// The taxonomy of terminal per-entry failure reasons, persisted on the
/// job row. Every stage boundary maps its internal error type into one
/// of these; the run controller never matches on stage-internal error
/// variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    FetchError,
    Timeout,
    Http4xx,
    Http5xx,
    DomainBlocked,
    NoText,
    TooShort,
    Paywall,
    JsRequired,
    ConsentWall,
    ParseError,
    EmbedError,
    ClusterError,
    SummarizeError,
    Cancelled,
    Unknown,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchError => "fetch_error",
            Self::Timeout => "timeout",
            Self::Http4xx => "http_4xx",
            Self::Http5xx => "http_5xx",
            Self::DomainBlocked => "domain_blocked",
            Self::NoText => "no_text",
            Self::TooShort => "too_short",
            Self::Paywall => "paywall",
            Self::JsRequired => "js_required",
            Self::ConsentWall => "consent_wall",
            Self::ParseError => "parse_error",
            Self::EmbedError => "embed_error",
            Self::ClusterError => "cluster_error",
            Self::SummarizeError => "summarize_error",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FailureReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fetch_error" => Ok(Self::FetchError),
            "timeout" => Ok(Self::Timeout),
            "http_4xx" => Ok(Self::Http4xx),
            "http_5xx" => Ok(Self::Http5xx),
            "domain_blocked" => Ok(Self::DomainBlocked),
            "no_text" => Ok(Self::NoText),
            "too_short" => Ok(Self::TooShort),
            "paywall" => Ok(Self::Paywall),
            "js_required" => Ok(Self::JsRequired),
            "consent_wall" => Ok(Self::ConsentWall),
            "parse_error" => Ok(Self::ParseError),
            "embed_error" => Ok(Self::EmbedError),
            "cluster_error" => Ok(Self::ClusterError),
            "summarize_error" => Ok(Self::SummarizeError),
            "cancelled" => Ok(Self::Cancelled),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown failure reason: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for reason in [
            FailureReason::FetchError,
            FailureReason::DomainBlocked,
            FailureReason::ConsentWall,
            FailureReason::Cancelled,
            FailureReason::Unknown,
        ] {
            let s = reason.as_str();
            let parsed: FailureReason = s.parse().unwrap();
            assert_eq!(parsed, reason);
        }
    }

    #[test]
    fn unknown_string_is_an_error_not_unknown_variant() {
        assert!("bogus".parse::<FailureReason>().is_err());
    }
}
