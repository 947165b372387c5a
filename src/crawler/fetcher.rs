//! Auth-safe HTTP fetcher
//!
//! This module handles every HTTP request the crawler makes, including:
//! - Building the shared HTTP client (automatic redirects disabled)
//! - Attaching per-domain crawl tokens
//! - Resolving redirects manually so login redirects are never followed
//! - Detecting login pages served with a 200 status
//! - The per-domain auth-failure circuit breaker

use crate::config::{Config, HttpConfig};
use crate::events::{CrawlEvent, EventSink};
use crate::state::AuthLedger;
use crate::url::extract_domain;
use crate::{ConfigError, FetchError, FetchResult, HarvestError};
use reqwest::header::{HeaderName, LOCATION};
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Selectors whose presence marks a response body as a login page
const LOGIN_FORM_SELECTORS: &[&str] = &[
    "input[type=\"password\"]",
    "form#loginform",
    "form[name=\"loginform\"]",
    ".login-form",
];

/// Builds an HTTP client with proper configuration
///
/// Redirects are never followed by the client itself; `AuthGuard` inspects
/// every 3xx before deciding what to do with it.
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Guarded fetcher shared by the crawl loop, the sitemap ingester and
/// document downloads
///
/// # Request Flow
///
/// | Condition | Action |
/// |-----------|--------|
/// | Domain blocked | `DomainBlocked`, no request sent |
/// | 3xx to a login-like URL | auth failure, `AuthRedirectBlocked` |
/// | 3xx past the redirect budget | `TooManyRedirects` |
/// | 3xx to another domain | `CrossDomainRedirectBlocked` |
/// | 3xx to the same domain | pause, then follow |
/// | 401 / 403 | auth failure, `AccessDenied` |
/// | Other non-200 | `HttpError` |
/// | 200 with a login form | auth failure, `AuthContentDetected` |
/// | 200 | body returned |
pub struct AuthGuard {
    client: Client,
    header: HeaderName,
    tokens: BTreeMap<String, String>,
    ledger: AuthLedger,
    max_redirects: u32,
    redirect_delay: Duration,
    login_indicators: Vec<String>,
    events: Arc<dyn EventSink>,
}

impl AuthGuard {
    /// Creates a guard from the crawl configuration
    pub fn from_config(config: &Config, events: Arc<dyn EventSink>) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.http)?;
        let header = HeaderName::from_bytes(config.auth.header.as_bytes()).map_err(|_| {
            ConfigError::Validation(format!(
                "'{}' is not a valid header name",
                config.auth.header
            ))
        })?;

        Ok(Self {
            client,
            header,
            tokens: config
                .auth
                .tokens
                .iter()
                .map(|(domain, token)| (domain.to_lowercase(), token.clone()))
                .collect(),
            ledger: AuthLedger::new(config.auth.max_auth_failures),
            max_redirects: config.auth.max_redirects,
            redirect_delay: Duration::from_millis(config.auth.redirect_delay_ms),
            login_indicators: config
                .auth
                .login_indicators
                .iter()
                .map(|i| i.to_lowercase())
                .collect(),
            events,
        })
    }

    /// Per-domain auth state accumulated so far
    pub fn ledger(&self) -> &AuthLedger {
        &self.ledger
    }

    /// Returns true if a crawl token is configured for the domain
    pub fn has_token_for(&self, domain: &str) -> bool {
        self.tokens.contains_key(domain)
    }

    /// Fetches a page and returns its body as text
    ///
    /// A 200 response that contains a login form counts as an auth failure.
    pub async fn fetch(&mut self, url: &str) -> FetchResult<String> {
        let (domain, response) = self.request(url).await?;
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if contains_login_form(&body) {
            self.record_auth_failure(&domain);
            return Err(FetchError::AuthContentDetected);
        }

        Ok(body)
    }

    /// Fetches a binary resource such as a linked document
    ///
    /// Same redirect and status rules as `fetch`, without the login-form scan.
    pub async fn download(&mut self, url: &str) -> FetchResult<Vec<u8>> {
        let (_, response) = self.request(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Runs the bounded redirect loop and returns the final 200 response
    /// together with the domain it was served from
    async fn request(&mut self, url: &str) -> FetchResult<(String, Response)> {
        let mut current =
            Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        let mut redirects = 0u32;

        loop {
            let domain = extract_domain(&current)
                .ok_or_else(|| FetchError::InvalidUrl(current.to_string()))?;

            if self.ledger.is_blocked(&domain) {
                return Err(FetchError::DomainBlocked(domain));
            }

            let mut request = self.client.get(current.clone());
            if let Some(token) = self.tokens.get(&domain) {
                request = request.header(self.header.clone(), token.as_str());
            }

            tracing::debug!("GET {}", current);
            let response = request
                .send()
                .await
                .map_err(|e| FetchError::Network(describe_transport_error(&e)))?;
            let status = response.status();

            if is_redirect(status) {
                let target = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|location| current.join(location).ok())
                    .ok_or(FetchError::HttpError(status.as_u16()))?;

                if self.is_login_url(&target) {
                    self.record_auth_failure(&domain);
                    return Err(FetchError::AuthRedirectBlocked {
                        location: target.to_string(),
                    });
                }

                if redirects >= self.max_redirects {
                    return Err(FetchError::TooManyRedirects);
                }

                if extract_domain(&target).as_deref() != Some(domain.as_str()) {
                    return Err(FetchError::CrossDomainRedirectBlocked {
                        location: target.to_string(),
                    });
                }

                redirects += 1;
                self.events.emit(CrawlEvent::RedirectFollowed {
                    from: current.to_string(),
                    to: target.to_string(),
                });
                tokio::time::sleep(self.redirect_delay).await;
                current = target;
                continue;
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                self.record_auth_failure(&domain);
                return Err(FetchError::AccessDenied(status.as_u16()));
            }

            if status != StatusCode::OK {
                return Err(FetchError::HttpError(status.as_u16()));
            }

            return Ok((domain, response));
        }
    }

    fn is_login_url(&self, target: &Url) -> bool {
        let lower = target.as_str().to_lowercase();
        self.login_indicators
            .iter()
            .any(|indicator| lower.contains(indicator.as_str()))
    }

    fn record_auth_failure(&mut self, domain: &str) {
        let record = self.ledger.record_failure(domain);

        self.events.emit(CrawlEvent::AuthFailure {
            domain: domain.to_string(),
            failures: record.failure_count,
            max_failures: self.ledger.max_failures(),
        });

        if record.newly_blocked {
            self.events.emit(CrawlEvent::DomainBlocked {
                domain: domain.to_string(),
                failures: record.failure_count,
            });
        }
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}

/// Returns true if the HTML contains a login form
pub fn contains_login_form(html: &str) -> bool {
    let document = Html::parse_document(html);

    LOGIN_FORM_SELECTORS.iter().any(|css| {
        Selector::parse(css)
            .map(|selector| document.select(&selector).next().is_some())
            .unwrap_or(false)
    })
}
