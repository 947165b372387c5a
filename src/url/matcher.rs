/// Checks if a domain is covered by an allowed-domain pattern
///
/// Two pattern forms are accepted:
/// 1. Plain: "example.com" matches "example.com" and any subdomain of it
/// 2. Wildcard: "*.example.com" behaves the same way; the prefix is accepted
///    for readability in configuration files
///
/// # Arguments
///
/// * `pattern` - The allowed domain pattern
/// * `candidate` - The domain key to check (lowercase, as produced by `extract_domain`)
///
/// # Examples
///
/// ```
/// use docharvest::url::domain_allowed;
///
/// assert!(domain_allowed("example.com", "example.com"));
/// assert!(domain_allowed("example.com", "docs.example.com"));
/// assert!(domain_allowed("*.example.com", "api.v2.example.com"));
/// assert!(!domain_allowed("example.com", "badexample.com"));
/// assert!(!domain_allowed("example.com", "example.org"));
/// ```
pub fn domain_allowed(pattern: &str, candidate: &str) -> bool {
    let base = pattern.strip_prefix("*.").unwrap_or(pattern);
    candidate == base || candidate.ends_with(&format!(".{}", base))
}

/// Returns true if `candidate` is covered by any of `patterns`
pub fn domain_allowed_by_any<S: AsRef<str>>(patterns: &[S], candidate: &str) -> bool {
    patterns
        .iter()
        .any(|p| domain_allowed(p.as_ref(), candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(domain_allowed("example.com", "example.com"));
        assert!(domain_allowed("127.0.0.1:3000", "127.0.0.1:3000"));
    }

    #[test]
    fn test_subdomain_match() {
        assert!(domain_allowed("example.com", "blog.example.com"));
        assert!(domain_allowed("*.example.com", "example.com"));
        assert!(domain_allowed("*.example.com", "blog.example.com"));
    }

    #[test]
    fn test_no_suffix_confusion() {
        assert!(!domain_allowed("example.com", "notexample.com"));
        assert!(!domain_allowed("*.example.com", "notexample.com"));
        assert!(!domain_allowed("blog.example.com", "example.com"));
    }

    #[test]
    fn test_different_port_is_a_different_domain() {
        assert!(!domain_allowed("127.0.0.1:3000", "127.0.0.1:3001"));
    }

    #[test]
    fn test_any_pattern() {
        let patterns = vec!["docs.example.com".to_string(), "*.example.org".to_string()];
        assert!(domain_allowed_by_any(&patterns, "docs.example.com"));
        assert!(domain_allowed_by_any(&patterns, "files.example.org"));
        assert!(!domain_allowed_by_any(&patterns, "www.example.com"));

        let empty: Vec<String> = Vec::new();
        assert!(!domain_allowed_by_any(&empty, "docs.example.com"));
    }
}
