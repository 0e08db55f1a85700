//! Utility functions and helpers.

pub mod http;

use url::Url;
use url::form_urlencoded::byte_serialize;

use crate::error::Result;

/// Ensure the base path ends with '/' so joins append instead of replace.
pub fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// Join a resource path onto the API base, keeping the base path prefix.
pub fn join_url(base: &Url, path: &str) -> Result<Url> {
    Ok(base.join(path.trim_start_matches('/'))?)
}

/// Percent-encode a single path segment (ids, genres).
pub fn encode_segment(segment: &str) -> String {
    byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_keeps_api_prefix() {
        let base = normalize_base(Url::parse("http://localhost:3000/api").unwrap());
        assert_eq!(base.as_str(), "http://localhost:3000/api/");
        assert_eq!(
            join_url(&base, "/reviews/r1/like").unwrap().as_str(),
            "http://localhost:3000/api/reviews/r1/like"
        );
        assert_eq!(
            join_url(&base, "clubs").unwrap().as_str(),
            "http://localhost:3000/api/clubs"
        );
    }

    #[test]
    fn test_normalize_base_is_idempotent() {
        let base = normalize_base(Url::parse("https://books.example.com/api/").unwrap());
        assert_eq!(base.as_str(), "https://books.example.com/api/");
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("r1"), "r1");
        assert_eq!(encode_segment("science fiction"), "science%20fiction");
        assert_eq!(encode_segment("a/b?c"), "a%2Fb%3Fc");
    }
}
