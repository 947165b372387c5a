use crate::{UrlError, UrlResult};
use url::Url;

/// Canonicalizes URLs so that equivalent spellings compare equal
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Drop the fragment
/// 3. Force the canonical scheme
/// 4. Strip a single trailing slash from the serialized form
///
/// Host case is already folded by the parser, so `HTTP://Docs.Example.com/`
/// and `https://docs.example.com` normalize to the same string.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    canonical_scheme: String,
}

impl Default for UrlNormalizer {
    fn default() -> Self {
        Self::new("https")
    }
}

impl UrlNormalizer {
    /// Creates a normalizer that rewrites every URL to `canonical_scheme`
    pub fn new(canonical_scheme: impl Into<String>) -> Self {
        Self {
            canonical_scheme: canonical_scheme.into(),
        }
    }

    /// Normalizes a URL string
    ///
    /// # Examples
    ///
    /// ```
    /// use docharvest::url::UrlNormalizer;
    ///
    /// let normalizer = UrlNormalizer::default();
    /// let url = normalizer.normalize("http://docs.example.com/guide/#intro").unwrap();
    /// assert_eq!(url, "https://docs.example.com/guide");
    /// ```
    pub fn normalize(&self, url_str: &str) -> UrlResult<String> {
        let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
        self.normalize_parsed(&mut url)?;
        Ok(strip_trailing_slash(url.as_str()))
    }

    fn normalize_parsed(&self, url: &mut Url) -> UrlResult<()> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                url.scheme()
            )));
        }

        if url.host_str().is_none() {
            return Err(UrlError::MissingDomain);
        }

        url.set_fragment(None);

        if url.scheme() != self.canonical_scheme {
            url.set_scheme(&self.canonical_scheme).map_err(|_| {
                UrlError::InvalidScheme(format!(
                    "Cannot switch scheme to {}",
                    self.canonical_scheme
                ))
            })?;
        }

        Ok(())
    }
}

fn strip_trailing_slash(serialized: &str) -> String {
    serialized
        .strip_suffix('/')
        .unwrap_or(serialized)
        .to_string()
}
