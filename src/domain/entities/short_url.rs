//! ShortUrl entity representing a code-to-URL mapping.

use chrono::{DateTime, Utc};

/// A shortened URL record.
///
/// `original_url` is stored verbatim as the client supplied it; only the
/// fingerprint in `url_hash` is computed over the normalized form.
/// `url_hash` is `None` for records created by the token strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortUrl {
    pub code: String,
    pub original_url: String,
    pub url_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ShortUrl {
    pub fn new(
        code: String,
        original_url: String,
        url_hash: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            code,
            original_url,
            url_hash,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_record_has_no_hash() {
        let record = ShortUrl::new(
            "abc12345".to_string(),
            "https://example.com".to_string(),
            None,
            Utc::now(),
        );

        assert_eq!(record.code, "abc12345");
        assert!(record.url_hash.is_none());
    }

    #[test]
    fn test_hash_record_carries_fingerprint() {
        let record = ShortUrl::new(
            "xyz98765".to_string(),
            "https://example.com/page".to_string(),
            Some("a".repeat(64)),
            Utc::now(),
        );

        assert_eq!(record.url_hash.as_deref().unwrap().len(), 64);
    }
}
