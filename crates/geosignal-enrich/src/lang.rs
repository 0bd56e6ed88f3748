use once_cell::sync::Lazy;
use std::collections::HashMap;

const MIN_TEXT_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageGuess {
    pub code: String,
    pub confidence: f32,
}

impl LanguageGuess {
    pub fn unknown() -> Self {
        Self {
            code: "unknown".to_string(),
            confidence: 0.0,
        }
    }
}

/// Detects the dominant language of a text. Implementations are
/// expected to be deterministic and CPU-only.
pub trait LanguageIdentifier: Send + Sync {
    fn identify(&self, text: &str) -> LanguageGuess;
}

/// Stopword-frequency identifier: offline, deterministic, and good
/// enough to route the title translator and geo resolver correctly
/// for the languages this table covers. Texts under
/// [`MIN_TEXT_LENGTH`] chars are non-fatally `unknown`.
pub struct StopwordLanguageIdentifier;

static STOPWORDS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "en",
        &[
            "the", "and", "of", "to", "in", "is", "that", "for", "on", "with", "as", "was",
        ][..],
    );
    m.insert(
        "es",
        &["el", "la", "de", "que", "y", "en", "los", "del", "las", "un", "una", "por"][..],
    );
    m.insert(
        "fr",
        &["le", "la", "de", "et", "les", "des", "un", "une", "est", "dans", "pour", "que"][..],
    );
    m.insert(
        "de",
        &["der", "die", "das", "und", "ist", "den", "von", "mit", "auf", "ein", "eine", "zu"][..],
    );
    m.insert(
        "pt",
        &["o", "a", "de", "que", "e", "do", "da", "em", "um", "para", "com", "os"][..],
    );
    m.insert(
        "it",
        &["il", "la", "di", "che", "e", "un", "una", "per", "con", "del", "della", "non"][..],
    );
    m.insert(
        "ru",
        &["и", "в", "не", "на", "что", "с", "по", "это", "как", "из", "его", "к"][..],
    );
    m.insert(
        "ar",
        &["في", "من", "على", "إلى", "أن", "هذا", "مع", "عن", "كان", "التي", "هو", "بعد"][..],
    );
    m
});

impl LanguageIdentifier for StopwordLanguageIdentifier {
    fn identify(&self, text: &str) -> LanguageGuess {
        if text.trim().chars().count() < MIN_TEXT_LENGTH {
            return LanguageGuess::unknown();
        }

        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower.split_whitespace().collect();
        if tokens.is_empty() {
            return LanguageGuess::unknown();
        }

        let mut best: Option<(&str, usize)> = None;
        for (&code, words) in STOPWORDS.iter() {
            let hits = tokens.iter().filter(|t| words.contains(t)).count();
            if best.map(|(_, best_hits)| hits > best_hits).unwrap_or(hits > 0) {
                best = Some((code, hits));
            }
        }

        match best {
            Some((code, hits)) if hits > 0 => LanguageGuess {
                code: code.to_string(),
                confidence: (hits as f32 / tokens.len() as f32).min(1.0),
            },
            _ => LanguageGuess::unknown(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unknown() {
        let guess = StopwordLanguageIdentifier.identify("too short");
        assert_eq!(guess.code, "unknown");
    }

    #[test]
    fn identifies_english_by_stopword_density() {
        let text = "The government and the military of the country said that the war was going on in the region for the people";
        let guess = StopwordLanguageIdentifier.identify(text);
        assert_eq!(guess.code, "en");
        assert!(guess.confidence > 0.0);
    }

    #[test]
    fn identifies_spanish_by_stopword_density() {
        let text = "El gobierno de la ciudad y los ministros del pais dijeron que la situacion en la region era muy dificil para la gente";
        let guess = StopwordLanguageIdentifier.identify(text);
        assert_eq!(guess.code, "es");
    }
}
