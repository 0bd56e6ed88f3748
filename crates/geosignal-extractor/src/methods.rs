use scraper::{ElementRef, Html, Selector};

/// A single extraction strategy in the cascade. Each is deterministic
/// and pure: given the same DOM, it always returns the same text.
pub trait ExtractMethod {
    fn name(&self) -> &'static str;
    fn extract(&self, doc: &Html) -> Option<String>;
}

fn collect_text(el: ElementRef) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn link_density(el: ElementRef) -> f64 {
    let total_len = collect_text(el).len();
    if total_len == 0 {
        return 1.0;
    }
    let a_sel = Selector::parse("a").unwrap();
    let link_len: usize = el.select(&a_sel).map(|a| collect_text(a).len()).sum();
    link_len as f64 / total_len as f64
}

/// Prefers a semantic `<article>` element or the densest common
/// content container, named after trafilatura's content-first approach.
pub struct TrafilaturaLike;

impl ExtractMethod for TrafilaturaLike {
    fn name(&self) -> &'static str {
        "trafilatura-like"
    }

    fn extract(&self, doc: &Html) -> Option<String> {
        let article_sel = Selector::parse("article").unwrap();
        if let Some(article) = doc.select(&article_sel).next() {
            let text = collect_text(article);
            if !text.is_empty() {
                return Some(text);
            }
        }

        let candidates = Selector::parse(
            "[class*=article], [class*=content], [id*=article], [id*=content], main",
        )
        .unwrap();
        doc.select(&candidates)
            .map(|el| (collect_text(el), el))
            .filter(|(text, _)| text.len() > 200)
            .max_by_key(|(text, _)| text.len())
            .map(|(text, _)| text)
    }
}

/// Readability's heuristic: score every block container by text
/// length minus link density, keep the highest scorer.
pub struct ReadabilityLike;

impl ExtractMethod for ReadabilityLike {
    fn name(&self) -> &'static str {
        "readability-like"
    }

    fn extract(&self, doc: &Html) -> Option<String> {
        let block_sel = Selector::parse("div, section, article, main").unwrap();
        doc.select(&block_sel)
            .map(|el| {
                let text = collect_text(el);
                let density = link_density(el);
                let score = text.len() as f64 * (1.0 - density);
                (score, text)
            })
            .filter(|(_, text)| text.len() > 200)
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
            .map(|(_, text)| text)
    }
}

/// jusText's paragraph classifier: keep only `<p>` blocks whose link
/// density is low and whose length clears a minimum, dropping boilerplate
/// nav/footer paragraphs individually rather than picking one container.
pub struct JusTextLike;

impl ExtractMethod for JusTextLike {
    fn name(&self) -> &'static str {
        "justext-like"
    }

    fn extract(&self, doc: &Html) -> Option<String> {
        let p_sel = Selector::parse("p").unwrap();
        let good_paragraphs: Vec<String> = doc
            .select(&p_sel)
            .filter(|p| link_density(*p) < 0.3)
            .map(|p| collect_text(p))
            .filter(|text| text.split_whitespace().count() >= 8)
            .collect();

        if good_paragraphs.is_empty() {
            return None;
        }
        Some(good_paragraphs.join("\n\n"))
    }
}

/// boilerpy's coarser fallback: the whole body's text, stripped of
/// nav/header/footer/aside, used when the structured methods above
/// found nothing usable.
pub struct BoilerPyLike;

impl ExtractMethod for BoilerPyLike {
    fn name(&self) -> &'static str {
        "boilerpy-like"
    }

    fn extract(&self, doc: &Html) -> Option<String> {
        let body_sel = Selector::parse("body").unwrap();
        let skip_sel = Selector::parse("nav, header, footer, aside, script, style").unwrap();
        let body = doc.select(&body_sel).next()?;

        let skip_texts: std::collections::HashSet<String> =
            body.select(&skip_sel).map(collect_text).collect();

        let text = collect_text(body);
        let text = skip_texts
            .iter()
            .fold(text, |acc, skip| acc.replace(skip.as_str(), ""));

        let trimmed = text.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn trafilatura_prefers_article_tag() {
        let html = doc(
            "<html><body><nav>home about</nav><article><p>The real story content goes here, long enough to pass thresholds with room to spare.</p></article></body></html>",
        );
        let text = TrafilaturaLike.extract(&html).unwrap();
        assert!(text.contains("real story content"));
    }

    #[test]
    fn justext_drops_link_heavy_paragraphs() {
        let html = doc(
            "<html><body><p><a href=\"/a\">link</a> <a href=\"/b\">link</a> <a href=\"/c\">link</a></p><p>This is a genuine paragraph of real article prose with enough words in it.</p></body></html>",
        );
        let text = JusTextLike.extract(&html).unwrap();
        assert!(text.contains("genuine paragraph"));
        assert!(!text.contains("link link"));
    }

    #[test]
    fn boilerpy_strips_nav_and_footer() {
        let html = doc(
            "<html><body><nav>Home About Contact</nav><p>Body text that should survive extraction intact.</p><footer>Copyright 2026</footer></body></html>",
        );
        let text = BoilerPyLike.extract(&html).unwrap();
        assert!(text.contains("Body text"));
        assert!(!text.contains("Copyright"));
    }
}
