use sha2::{Digest, Sha256};

/// Canonicalizes text for exact-hash comparison: lowercases, collapses
/// runs of whitespace to a single space, and strips surrounding
/// punctuation from the result. Deterministic and order-independent
/// across whitespace variants (spec.md §8).
pub fn canonicalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_string()
}

/// `SHA-256(canonicalize(text))`, hex-encoded.
pub fn content_hash(text: &str) -> String {
    let canon = canonicalize(text);
    let digest = Sha256::digest(canon.as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_collapses_whitespace_variants() {
        let a = canonicalize("Hello   World\n\nFoo\tbar.");
        let b = canonicalize("hello world foo bar");
        assert_eq!(a, b);
    }

    #[test]
    fn content_hash_is_deterministic() {
        let h1 = content_hash("The Quick Brown Fox.");
        let h2 = content_hash("the   quick brown   fox");
        assert_eq!(h1, h2);
    }

    #[test]
    fn content_hash_differs_for_different_text() {
        assert_ne!(content_hash("alpha beta"), content_hash("gamma delta"));
    }

    #[test]
    fn strips_surrounding_punctuation() {
        assert_eq!(canonicalize("  \"Quoted text!\"  "), "quoted text");
    }
}
