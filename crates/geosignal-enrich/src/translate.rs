/// Translates an article title to English. Implementations may wire a
/// real translation model; [`CopyFallbackTranslator`] is the degraded
/// path the spec calls for when no model is available for the source
/// language — this is non-fatal, never an [`ExtractFailure`]-style error.
pub trait TitleTranslator: Send + Sync {
    /// `source_lang` is the ISO-639 code from the language identifier.
    /// Returns `None` if `source_lang` is already English — callers
    /// should treat that as "no translation needed", not a failure.
    fn translate_title(&self, title: &str, source_lang: &str) -> Option<String>;
}

/// Has no translation model wired in; always degrades to copying the
/// original title. This is the default used when no enricher-specific
/// translation backend is configured.
pub struct CopyFallbackTranslator;

impl TitleTranslator for CopyFallbackTranslator {
    fn translate_title(&self, title: &str, source_lang: &str) -> Option<String> {
        if source_lang == "en" {
            return None;
        }
        Some(title.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_titles_are_not_translated() {
        assert_eq!(CopyFallbackTranslator.translate_title("Hello", "en"), None);
    }

    #[test]
    fn non_english_titles_degrade_to_a_copy() {
        assert_eq!(
            CopyFallbackTranslator.translate_title("Bonjour le monde", "fr"),
            Some("Bonjour le monde".to_string())
        );
    }
}
