use chrono::{DateTime, Utc};
use rand::Rng;

/// A lexicographically sortable run id that encodes its UTC start
/// time, per spec.md §3 (`ProcessingRun.run_id`). The millisecond-
/// precision timestamp prefix is the sort key; the trailing hex
/// suffix only disambiguates runs started within the same
/// millisecond and plays no role in ordering runs across different
/// instants.
pub fn generate_run_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..8).map(|_| std::char::from_digit(rng.gen_range(0..16), 16).unwrap()).collect();
    format!("{}-{}", now.format("%Y%m%dT%H%M%S%3f"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn earlier_timestamps_sort_before_later_ones() {
        let earlier = generate_run_id(Utc.with_ymd_and_hms(2026, 7, 30, 12, 0, 0).unwrap());
        let later = generate_run_id(Utc.with_ymd_and_hms(2026, 7, 31, 9, 0, 0).unwrap());
        assert!(earlier < later);
    }
}
