use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct OracleSummaryResponse {
    pub summary: String,
}

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").unwrap());
static SUMMARY_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r#""summary"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap());
static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Fault-tolerant parse of an oracle's cluster-summary response:
/// strict parse, then a repair pass (strip code fences, drop trailing
/// commas), then a relaxed regex extraction of the `summary` field.
/// Only if all three fail does the caller treat the summary as
/// missing (spec.md §4.8).
pub fn parse_oracle_response(raw: &str) -> Option<OracleSummaryResponse> {
    if let Ok(parsed) = serde_json::from_str::<OracleSummaryResponse>(raw) {
        return Some(parsed);
    }

    let repaired = repair(raw);
    if let Ok(parsed) = serde_json::from_str::<OracleSummaryResponse>(&repaired) {
        return Some(parsed);
    }

    relaxed_extract(raw)
}

fn repair(raw: &str) -> String {
    let unfenced = match CODE_FENCE.captures(raw) {
        Some(caps) => caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_else(|| raw.to_string()),
        None => raw.to_string(),
    };
    TRAILING_COMMA.replace_all(unfenced.trim(), "$1").to_string()
}

fn relaxed_extract(raw: &str) -> Option<OracleSummaryResponse> {
    SUMMARY_FIELD.captures(raw).map(|caps| OracleSummaryResponse {
        summary: caps[1].replace("\\\"", "\"").replace("\\n", "\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_succeeds_on_clean_json() {
        let raw = r#"{"summary": "Tensions rise along the border."}"#;
        let parsed = parse_oracle_response(raw).unwrap();
        assert_eq!(parsed.summary, "Tensions rise along the border.");
    }

    #[test]
    fn repair_pass_strips_code_fences_and_trailing_comma() {
        let raw = "```json\n{\"summary\": \"A ceasefire was announced.\",}\n```";
        let parsed = parse_oracle_response(raw).unwrap();
        assert_eq!(parsed.summary, "A ceasefire was announced.");
    }

    #[test]
    fn relaxed_pass_extracts_summary_field_from_malformed_json() {
        let raw = r#"here is your result: {"summary": "Peace talks resume", "extra": }"#;
        let parsed = parse_oracle_response(raw).unwrap();
        assert_eq!(parsed.summary, "Peace talks resume");
    }

    #[test]
    fn unparseable_garbage_returns_none() {
        assert!(parse_oracle_response("not json at all, no fields either").is_none());
    }
}
