use std::collections::BTreeMap;

/// A single topic label with a confidence in `[0, 1]`. One text can
/// carry more than one label — this classifier is not exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicGuess {
    pub topic: String,
    pub confidence: f32,
}

/// Optional, tier-independent topic classification (SPEC_FULL.md §3):
/// it runs whenever a model is configured, regardless of A/B/C, and
/// never blocks the pipeline on failure — callers drop its output
/// rather than fail the entry.
pub trait TopicClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Vec<TopicGuess>;
}

const KEYWORDS: &[(&str, &[&str])] = &[
    ("military-conflict", &["troops", "offensive", "airstrike", "ceasefire", "shelling", "militia"]),
    ("diplomacy", &["summit", "treaty", "ambassador", "negotiation", "sanctions", "envoy"]),
    ("elections", &["ballot", "election", "candidate", "parliament", "referendum", "voters"]),
    ("economy", &["inflation", "tariff", "trade deal", "gdp", "market", "currency"]),
    ("humanitarian", &["refugee", "famine", "displaced", "aid convoy", "humanitarian"]),
];

/// Scores each topic by keyword hit count over the text length,
/// keeping only topics with at least one hit. Deterministic and
/// offline, same contract as [`crate::HeuristicEntityExtractor`].
pub struct KeywordTopicClassifier;

impl TopicClassifier for KeywordTopicClassifier {
    fn classify(&self, text: &str) -> Vec<TopicGuess> {
        let lower = text.to_lowercase();
        let word_count = lower.split_whitespace().count().max(1) as f32;

        let mut hits: BTreeMap<&'static str, usize> = BTreeMap::new();
        for (topic, keywords) in KEYWORDS {
            let count = keywords.iter().filter(|kw| lower.contains(*kw)).count();
            if count > 0 {
                hits.insert(topic, count);
            }
        }

        let mut guesses: Vec<TopicGuess> = hits
            .into_iter()
            .map(|(topic, count)| TopicGuess {
                topic: topic.to_string(),
                confidence: (count as f32 / word_count * 20.0).min(1.0),
            })
            .collect();
        guesses.sort_by(|a, b| a.topic.cmp(&b.topic));
        guesses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_keyword_topics() {
        let guesses = KeywordTopicClassifier.classify("Troops launched an offensive after the ceasefire collapsed.");
        assert!(guesses.iter().any(|g| g.topic == "military-conflict"));
    }

    #[test]
    fn unrelated_text_has_no_guesses() {
        let guesses = KeywordTopicClassifier.classify("A local bakery reopened after renovations this spring.");
        assert!(guesses.is_empty());
    }

    #[test]
    fn confidence_is_bounded() {
        let text = "ceasefire ceasefire ceasefire shelling shelling airstrike troops offensive militia";
        let guesses = KeywordTopicClassifier.classify(text);
        assert!(guesses.iter().all(|g| g.confidence <= 1.0));
    }
}
