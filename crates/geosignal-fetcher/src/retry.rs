use rand::Rng;
use std::time::Duration;

const BASE_DELAY_MS: u64 = 500;
const MAX_ATTEMPTS: u32 = 4;
const JITTER_FRACTION: f64 = 0.25;

/// Exponential backoff with +/-25% jitter: `base * 2^attempt`, jittered.
/// `attempt` is zero-based (0 = first retry delay).
pub fn backoff_delay(attempt: u32) -> Duration {
    let base = BASE_DELAY_MS as f64 * 2f64.powi(attempt as i32);
    let jitter = base * JITTER_FRACTION;
    let jittered = rand::thread_rng().gen_range((base - jitter)..=(base + jitter));
    Duration::from_millis(jittered.max(0.0) as u64)
}

pub fn max_attempts() -> u32 {
    MAX_ATTEMPTS
}

/// Whether an HTTP status is worth retrying at all. 4xx is non-retryable
/// except 408 (request timeout) and 429 (rate limited).
pub fn is_retryable_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..600).contains(&status)
}

/// Parses a `Retry-After` header value into a delay, per RFC 9110
/// §10.2.3: either a delay in seconds, or an HTTP-date to wait until.
/// Unparseable values are ignored.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let target = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let delta = target.with_timezone(&chrono::Utc) - chrono::Utc::now();
    delta.to_std().ok()
}

/// The delay to use for the next attempt: the larger of the usual
/// exponential backoff and the server's requested `Retry-After`, so a
/// server-specified floor is always honoured.
pub fn delay_with_retry_after(attempt: u32, retry_after: Option<Duration>) -> Duration {
    let backoff = backoff_delay(attempt);
    match retry_after {
        Some(floor) => backoff.max(floor),
        None => backoff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_stays_within_jitter_band() {
        for attempt in 0..max_attempts() {
            let base = BASE_DELAY_MS as f64 * 2f64.powi(attempt as i32);
            let delay = backoff_delay(attempt).as_millis() as f64;
            let lo = base * (1.0 - JITTER_FRACTION);
            let hi = base * (1.0 + JITTER_FRACTION);
            assert!(delay >= lo - 1.0 && delay <= hi + 1.0, "attempt {attempt}: {delay} not in [{lo}, {hi}]");
        }
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(408));
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(200));
    }

    #[test]
    fn retry_after_parses_seconds() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
    }

    #[test]
    fn retry_after_ignores_garbage() {
        assert_eq!(parse_retry_after("not-a-date-or-number"), None);
    }

    #[test]
    fn retry_after_floor_wins_when_larger_than_backoff() {
        let delay = delay_with_retry_after(0, Some(Duration::from_secs(30)));
        assert!(delay >= Duration::from_secs(30));
    }

    #[test]
    fn backoff_wins_when_retry_after_is_smaller() {
        let delay = delay_with_retry_after(3, Some(Duration::from_millis(1)));
        assert!(delay >= backoff_delay(3));
    }
}
