use crate::config::types::{AuthConfig, Config, CrawlConfig, FilterConfig, HttpConfig};
use crate::ConfigError;
use reqwest::header::HeaderName;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_http_config(&config.http)?;
    validate_auth_config(&config.auth)?;
    validate_filter_config(&config.filter)?;
    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;

    if let Some(sitemap_url) = &config.sitemap_url {
        validate_http_url("sitemap-url", sitemap_url)?;
    }

    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if !config.crawl_delay.is_finite() || config.crawl_delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "crawl-delay must be a non-negative number of seconds, got {}",
            config.crawl_delay
        )));
    }

    if config.canonical_scheme != "https" && config.canonical_scheme != "http" {
        return Err(ConfigError::Validation(format!(
            "canonical-scheme must be 'http' or 'https', got '{}'",
            config.canonical_scheme
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 || config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeouts must be at least one second".to_string(),
        ));
    }

    Ok(())
}

/// Validates authentication configuration
fn validate_auth_config(config: &AuthConfig) -> Result<(), ConfigError> {
    HeaderName::from_bytes(config.header.as_bytes()).map_err(|_| {
        ConfigError::Validation(format!("'{}' is not a valid header name", config.header))
    })?;

    if config.max_auth_failures < 1 {
        return Err(ConfigError::Validation(format!(
            "max-auth-failures must be >= 1, got {}",
            config.max_auth_failures
        )));
    }

    for domain in config.tokens.keys() {
        validate_domain_string(domain)?;
    }

    if config.login_indicators.iter().any(|i| i.is_empty()) {
        return Err(ConfigError::Validation(
            "login-indicators cannot contain empty strings".to_string(),
        ));
    }

    Ok(())
}

/// Validates filter configuration
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    for pattern in &config.allowed_domains {
        validate_domain_pattern(pattern)?;
    }

    let lists = [
        ("skip-patterns", &config.skip_patterns),
        ("skip-extensions", &config.skip_extensions),
        ("priority-patterns", &config.priority_patterns),
    ];
    for (name, list) in lists {
        if list.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::Validation(format!(
                "{} cannot contain empty strings",
                name
            )));
        }
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use HTTP or HTTPS",
            field, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            field, value
        )));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    match pattern.strip_prefix("*.") {
        Some(domain) => validate_domain_string(domain),
        None => validate_domain_string(pattern),
    }
}

/// Validates a domain string (without wildcard prefix, optional `:port`)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    let (host, port) = match domain.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (domain, None),
    };

    if let Some(port) = port {
        if port.is_empty() || port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidPattern(format!(
                "Domain '{}' has an invalid port",
                domain
            )));
        }
    }

    if host.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !host.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("example.com").is_ok());
        assert!(validate_domain_pattern("*.example.com").is_ok());
        assert!(validate_domain_pattern("sub.example.com").is_ok());
        assert!(validate_domain_pattern("127.0.0.1:8080").is_ok());

        assert!(validate_domain_pattern("").is_err());
        assert!(validate_domain_pattern("*.").is_err());
        assert!(validate_domain_pattern("example").is_err());
        assert!(validate_domain_pattern(".example.com").is_err());
        assert!(validate_domain_pattern("example.com.").is_err());
        assert!(validate_domain_pattern("example.com:http").is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::new("https://docs.example.com");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = Config::new("ftp://docs.example.com");
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_canonical_scheme() {
        let mut config = Config::new("https://docs.example.com");
        config.crawl.canonical_scheme = "gopher".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_bad_header_name() {
        let mut config = Config::new("https://docs.example.com");
        config.auth.header = "X Crawl Token".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_auth_failures() {
        let mut config = Config::new("https://docs.example.com");
        config.auth.max_auth_failures = 0;
        assert!(validate(&config).is_err());
    }
}
