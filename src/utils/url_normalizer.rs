//! URL normalization and content fingerprinting.
//!
//! The hash strategy deduplicates URLs by fingerprinting a canonical form,
//! so two spellings of the same address map to the same short code.

use sha2::{Digest, Sha256};
use url::Url;

/// Errors that can occur during URL normalization.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Failed to normalize URL: {0}")]
    NormalizationFailed(String),
}

/// Normalizes a URL to a canonical form.
///
/// # Normalization Rules
///
/// 1. **Scheme and host**: lowercased
/// 2. **Default ports**: removed (80 for HTTP, 443 for HTTPS)
/// 3. **Path**: a single trailing `/` is stripped, unless the path is `/`
/// 4. **Fragments**: removed (e.g., `#section`)
/// 5. **Query string**: preserved byte-for-byte
///
/// The transformation is idempotent: normalizing an already-normalized
/// URL returns it unchanged.
///
/// # Errors
///
/// Returns [`UrlNormalizationError::InvalidFormat`] for unparseable input.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     normalize_url("HTTPS://EXAMPLE.COM:443/Path/").unwrap(),
///     "https://example.com/Path"
/// );
/// ```
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let mut url =
        Url::parse(input).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    // Url::parse already lowercases the scheme; hosts are lowercased here
    // to cover the rare cases the parser leaves untouched.
    if let Some(host) = url.host_str() {
        let host_lowercase = host.to_ascii_lowercase();
        url.set_host(Some(&host_lowercase)).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to set normalized host".to_string())
        })?;
    }

    let is_default_port = matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    );
    if is_default_port {
        url.set_port(None).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to remove default port".to_string())
        })?;
    }

    // Strip one trailing slash, keeping the root path intact.
    let path = url.path().to_owned();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(&path[..path.len() - 1]);
    }

    url.set_fragment(None);

    Ok(url.to_string())
}

/// Computes the content fingerprint of a normalized URL.
///
/// SHA-256 over the UTF-8 bytes, lowercase hex-encoded (64 characters).
pub fn hash_url(normalized: &str) -> String {
    let digest = Sha256::digest(normalized.as_bytes());

    format!("{:x}", digest)
}
