use url::Url;

/// Extracts the domain key from a URL
///
/// The key is the lowercase host, followed by `:port` when the URL carries a
/// non-default port. It is used for allowed-domain checks, token lookup and
/// per-domain auth state, so two URLs share auth state exactly when they share
/// this key.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use docharvest::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Parses `url` and extracts its domain key in one step
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(extract_domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://intranet.example.com/post").unwrap();
        assert_eq!(
            extract_domain(&url),
            Some("intranet.example.com".to_string())
        );
    }

    #[test]
    fn test_extract_keeps_explicit_port() {
        let url = Url::parse("https://example.com:8443/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com:8443".to_string()));
    }

    #[test]
    fn test_default_port_is_dropped() {
        let url = Url::parse("https://example.com:443/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Example.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_domain_of_rejects_garbage() {
        assert_eq!(domain_of("not a url"), None);
        assert_eq!(
            domain_of("https://docs.example.com/a?b=c#d"),
            Some("docs.example.com".to_string())
        );
    }
}
