use once_cell::sync::Lazy;
use regex::Regex;

static PAYWALL_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(subscribe to (read|continue)|paywall|metered-content|this article is for subscribers|piano-inline)")
        .unwrap()
});

static CONSENT_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(accept (all )?cookies|consent[- _]?(wall|banner|manager)|gdpr|we use cookies)").unwrap()
});

static JS_APP_ROOT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<div[^>]+id=["'](root|app|__next)["'][^>]*>\s*</div>"#).unwrap()
});

static NOSCRIPT_REQUIRED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(please enable javascript|you need to enable javascript|javascript is required)")
        .unwrap()
});

/// Signature checks on the raw markup, run only once every method in
/// the extraction cascade has come back below `min_content_length` —
/// explains *why* nothing usable was extracted rather than gating
/// extraction itself.
pub fn classify_markup(raw_html: &str) -> Option<MarkupSignal> {
    if NOSCRIPT_REQUIRED.is_match(raw_html) || is_empty_spa_shell(raw_html) {
        return Some(MarkupSignal::JsRequired);
    }
    if PAYWALL_MARKERS.is_match(raw_html) {
        return Some(MarkupSignal::Paywall);
    }
    if CONSENT_MARKERS.is_match(raw_html) && text_outside_tags_len(raw_html) < 400 {
        return Some(MarkupSignal::ConsentWall);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupSignal {
    JsRequired,
    Paywall,
    ConsentWall,
}

fn is_empty_spa_shell(raw_html: &str) -> bool {
    JS_APP_ROOT.is_match(raw_html) && text_outside_tags_len(raw_html) < 200
}

/// Rough char count of text outside markup, used only for the cheap
/// pre-checks above (the real cascade uses `scraper`-parsed text).
fn text_outside_tags_len(raw_html: &str) -> usize {
    static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
    TAG.replace_all(raw_html, "").trim().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_js_required_shell() {
        let html = r#"<html><body><div id="root"></div><script src="bundle.js"></script></body></html>"#;
        assert_eq!(classify_markup(html), Some(MarkupSignal::JsRequired));
    }

    #[test]
    fn detects_paywall_marker() {
        let html = "<html><body><p>Subscribe to read the rest of this story.</p></body></html>";
        assert_eq!(classify_markup(html), Some(MarkupSignal::Paywall));
    }

    #[test]
    fn ignores_ordinary_article() {
        let html = "<html><body><article><p>A long enough article body about something real.</p></article></body></html>";
        assert_eq!(classify_markup(html), None);
    }
}
