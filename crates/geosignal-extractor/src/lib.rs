//! Deterministic, pure extraction cascade. No network or filesystem
//! I/O happens here: given the same `body_bytes` and threshold, the
//! same [`Extraction`] or [`ExtractFailure`] is always produced.

mod methods;
mod signals;

use geosignal_error::ExtractFailure;
use methods::{BoilerPyLike, ExtractMethod, JusTextLike, ReadabilityLike, TrafilaturaLike};
use scraper::Html;
use signals::MarkupSignal;

#[derive(Debug, Clone)]
pub struct Extraction {
    pub text: String,
    pub method: &'static str,
    pub length: usize,
}

/// Runs the four-method cascade in a fixed order — trafilatura-like,
/// readability-like, justext-like, boilerpy-like — returning the first
/// result that clears `min_content_length`. The cascade order matters:
/// trafilatura-like and readability-like pick one content container
/// (higher precision); justext-like and boilerpy-like fall back to
/// coarser, higher-recall strategies.
///
/// The markup-signal classifier (paywall/consent-wall/JS-required) is a
/// fallback, not a gate: it only runs once every method in the cascade
/// has come back below threshold, so a real article that happens to
/// mention a subscribe CTA in passing still extracts normally.
pub fn extract(body_bytes: &[u8], min_content_length: usize) -> Result<Extraction, ExtractFailure> {
    let raw_html = std::str::from_utf8(body_bytes).map_err(|_| ExtractFailure::ParseError)?;
    let doc = Html::parse_document(raw_html);

    let cascade: [&dyn ExtractMethod; 4] = [
        &TrafilaturaLike,
        &ReadabilityLike,
        &JusTextLike,
        &BoilerPyLike,
    ];

    let mut best: Option<Extraction> = None;
    for method in cascade {
        if let Some(text) = method.extract(&doc) {
            let length = text.chars().count();
            if length >= min_content_length {
                return Ok(Extraction {
                    text,
                    method: method.name(),
                    length,
                });
            }
            if best.as_ref().map(|b| length > b.length).unwrap_or(true) {
                best = Some(Extraction {
                    text,
                    method: method.name(),
                    length,
                });
            }
        }
    }

    if let Some(signal) = signals::classify_markup(raw_html) {
        return Err(match signal {
            MarkupSignal::JsRequired => ExtractFailure::JsRequired,
            MarkupSignal::Paywall => ExtractFailure::Paywall,
            MarkupSignal::ConsentWall => ExtractFailure::ConsentWall,
        });
    }

    match best {
        Some(_) => Err(ExtractFailure::TooShort),
        None => Err(ExtractFailure::NoText),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_article_body_above_threshold() {
        let html = b"<html><body><article><p>This article has more than enough content to clear the minimum acceptance threshold for extraction purposes in this test.</p></article></body></html>";
        let result = extract(html, 50).unwrap();
        assert_eq!(result.method, "trafilatura-like");
        assert!(result.length >= 50);
    }

    #[test]
    fn too_short_content_is_classified() {
        let html = b"<html><body><p>Too short.</p></body></html>";
        let err = extract(html, 250).unwrap_err();
        assert_eq!(err, ExtractFailure::TooShort);
    }

    #[test]
    fn empty_body_yields_no_text() {
        let html = b"<html><body></body></html>";
        let err = extract(html, 10).unwrap_err();
        assert_eq!(err, ExtractFailure::NoText);
    }

    #[test]
    fn js_shell_is_classified_once_cascade_finds_nothing() {
        let html = br#"<html><body><div id="root"></div><script src="app.js"></script></body></html>"#;
        let err = extract(html, 10).unwrap_err();
        assert_eq!(err, ExtractFailure::JsRequired);
    }

    #[test]
    fn article_with_incidental_subscribe_cta_still_extracts() {
        let html = b"<html><body><article><p>This article has more than enough content to clear the minimum acceptance threshold for extraction purposes in this test.</p><p>Subscribe to read more of our coverage.</p></article></body></html>";
        let result = extract(html, 50).unwrap();
        assert!(result.text.contains("more than enough content"));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let bytes: &[u8] = &[0xff, 0xfe, 0xfd];
        let err = extract(bytes, 10).unwrap_err();
        assert_eq!(err, ExtractFailure::ParseError);
    }
}
