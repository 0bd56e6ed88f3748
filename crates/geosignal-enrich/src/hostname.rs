/// Pure URL parse: strips a leading `www.` and any explicit port.
/// Returns `None` if the URL has no host.
pub fn extract_hostname(raw_url: &str) -> Option<String> {
    let parsed = url::Url::parse(raw_url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_www_prefix() {
        assert_eq!(
            extract_hostname("https://www.example.com/a/b").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn strips_port() {
        assert_eq!(
            extract_hostname("https://example.com:8443/a").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn leaves_non_www_subdomains_alone() {
        assert_eq!(
            extract_hostname("https://news.example.com/a").unwrap(),
            "news.example.com"
        );
    }

    #[test]
    fn invalid_url_returns_none() {
        assert!(extract_hostname("not a url").is_none());
    }
}
