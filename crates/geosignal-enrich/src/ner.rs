use std::collections::BTreeMap;

use geosignal_types::{Entities, EntitiesMeta};

const MIN_TEXT_LENGTH: usize = 50;
const MODEL_ID: &str = "heuristic-capitalized-span-tagger-v1";

/// Multilingual entity tagger: text -> class -> ordered, deduplicated
/// surface forms, plus a meta block describing the tagger run.
///
/// Implementations are expected to be deterministic and CPU-only
/// (spec.md calls the production tagger "transformer-based... runs on
/// CPU"; the default here is a cheap stand-in with the same contract
/// so the rest of the pipeline, and its tests, don't need a model
/// download to run).
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Entities;
}

/// Tags capitalized word spans and buckets them by a small gazetteer
/// and suffix heuristics. Texts under [`MIN_TEXT_LENGTH`] chars skip
/// tagging entirely and return an empty mapping, matching spec.md's
/// "entries too short to NER are skipped with an empty mapping."
pub struct HeuristicEntityExtractor;

const ORG_SUFFIXES: &[&str] = &[
    "Inc", "Inc.", "Corp", "Corp.", "Ltd", "Ltd.", "LLC", "Co", "Co.", "Group", "Holdings",
    "Organization", "Organisation", "Union", "Agency", "Ministry", "Council", "Authority",
    "Party", "Coalition", "Force", "Forces", "Command",
];

const GPE_GAZETTEER: &[&str] = &[
    "United States",
    "United Kingdom",
    "Ukraine",
    "Russia",
    "China",
    "Taiwan",
    "Israel",
    "Gaza",
    "Palestine",
    "Iran",
    "Iraq",
    "Syria",
    "Lebanon",
    "Yemen",
    "Sudan",
    "France",
    "Germany",
    "Poland",
    "India",
    "Pakistan",
    "Japan",
    "Korea",
    "Brazil",
    "Mexico",
    "Egypt",
    "Turkey",
    "Armenia",
    "Azerbaijan",
    "Georgia",
    "Belarus",
    "Moldova",
    "Venezuela",
    "Nigeria",
    "Ethiopia",
    "Somalia",
    "Myanmar",
    "Kashmir",
];

fn is_capitalized_word(word: &str) -> bool {
    word.chars()
        .next()
        .map(|c| c.is_uppercase())
        .unwrap_or(false)
        && word.chars().skip(1).any(|c| c.is_lowercase())
}

/// A maximal run of adjacent capitalized tokens, e.g. "United
/// Nations Security Council".
fn capitalized_spans(text: &str) -> Vec<String> {
    let mut spans = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for raw_word in text.split_whitespace() {
        let word = raw_word.trim_matches(|c: char| !c.is_alphanumeric() && c != '.');
        if word.is_empty() {
            continue;
        }
        if is_capitalized_word(word) {
            current.push(word);
        } else {
            if current.len() >= 1 {
                spans.push(current.join(" "));
            }
            current.clear();
        }
    }
    if current.len() >= 1 {
        spans.push(current.join(" "));
    }
    spans
}

fn classify_span(span: &str) -> &'static str {
    if GPE_GAZETTEER.iter().any(|g| span.contains(g)) {
        return "GPE";
    }
    if ORG_SUFFIXES
        .iter()
        .any(|suf| span.split_whitespace().last() == Some(*suf))
    {
        return "ORG";
    }
    let word_count = span.split_whitespace().count();
    if word_count >= 2 {
        return "PERSON";
    }
    "MISC"
}

impl EntityExtractor for HeuristicEntityExtractor {
    fn extract(&self, text: &str) -> Entities {
        if text.trim().chars().count() < MIN_TEXT_LENGTH {
            return Entities::default();
        }

        let mut by_class: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for span in capitalized_spans(text) {
            let class = classify_span(&span);
            let bucket = by_class.entry(class.to_string()).or_default();
            if !bucket.contains(&span) {
                bucket.push(span);
            }
        }

        Entities {
            by_class,
            meta: EntitiesMeta {
                score: Some(1.0),
                model_id: Some(MODEL_ID.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_ENOUGH: &str = "Officials in Washington said the United Nations Security Council will meet to discuss the escalation near the border region, as reported by several outlets this week.";

    #[test]
    fn short_text_yields_empty_mapping() {
        let entities = HeuristicEntityExtractor.extract("Too short.");
        assert!(entities.by_class.is_empty());
    }

    #[test]
    fn tags_gpe_from_gazetteer() {
        let text = format!("{LONG_ENOUGH} Russia and Ukraine both sent delegations.");
        let entities = HeuristicEntityExtractor.extract(&text);
        let gpe = entities.by_class.get("GPE").expect("GPE bucket");
        assert!(gpe.iter().any(|s| s == "Russia"));
        assert!(gpe.iter().any(|s| s == "Ukraine"));
    }

    #[test]
    fn tags_org_by_suffix() {
        let text = format!("{LONG_ENOUGH} Example Holdings Group announced a new policy.");
        let entities = HeuristicEntityExtractor.extract(&text);
        let org = entities.by_class.get("ORG").expect("ORG bucket");
        assert!(org.iter().any(|s| s.ends_with("Group")));
    }

    #[test]
    fn deduplicates_surface_forms_within_a_class() {
        let text = format!("{LONG_ENOUGH} Russia said Russia would respond.");
        let entities = HeuristicEntityExtractor.extract(&text);
        let gpe = entities.by_class.get("GPE").unwrap();
        assert_eq!(gpe.iter().filter(|s| *s == "Russia").count(), 1);
    }
}
