use once_cell::sync::Lazy;
use regex::Regex;

use geosignal_error::StoreError;

static SAFE_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// Validates that `identifier` is safe to interpolate directly into a
/// SQL statement as a table or column name. Postgres cannot
/// parameterize identifiers, so date-partitioned table names are
/// whitelisted here rather than bound as values (spec.md §9 Design
/// Notes: "Dynamic table names").
pub fn validate_identifier(identifier: &str) -> Result<(), StoreError> {
    if identifier.is_empty() || !SAFE_IDENTIFIER.is_match(identifier) {
        return Err(StoreError::InvalidIdentifier(identifier.to_string()));
    }
    Ok(())
}

/// `flash_point_<YYYYMMDD>` for a given date.
pub fn flashpoint_table(date: chrono::NaiveDate) -> String {
    format!("flash_point_{}", date.format("%Y%m%d"))
}

/// `feed_entries_<YYYYMMDD>` for a given date.
pub fn feed_entries_table(date: chrono::NaiveDate) -> String {
    format!("feed_entries_{}", date.format("%Y%m%d"))
}

/// `news_clusters_<YYYYMMDD>` for a given date.
pub fn news_clusters_table(date: chrono::NaiveDate) -> String {
    format!("news_clusters_{}", date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_partitioned_names_are_formatted_and_safe() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        assert_eq!(feed_entries_table(date), "feed_entries_20260731");
        validate_identifier(&feed_entries_table(date)).unwrap();
    }

    #[test]
    fn rejects_identifiers_with_sql_metacharacters() {
        assert!(validate_identifier("feed_entries_20260731; DROP TABLE x;--").is_err());
        assert!(validate_identifier("feed entries").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn accepts_plain_alphanumeric_and_underscore() {
        assert!(validate_identifier("processing_runs").is_ok());
        assert!(validate_identifier("feed_entry_jobs_v2").is_ok());
    }
}
