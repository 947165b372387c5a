//! Shared fixtures for the integration tests

use docharvest::config::{Config, CrawlMode};
use std::path::Path;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A configuration pointed at the mock server with every delay disabled
pub fn test_config(server: &MockServer, output: &Path, mode: CrawlMode) -> Config {
    let mut config = Config::new(server.uri());
    config.crawl.mode = mode;
    config.crawl.output_dir = output.display().to_string();
    config.crawl.crawl_delay = 0.0;
    config.crawl.sitemap_delay_ms = 0;
    config.crawl.canonical_scheme = "http".to_string();
    config.crawl.min_content_length = 20;
    config.auth.redirect_delay_ms = 0;
    config
}

pub fn domain(server: &MockServer) -> String {
    docharvest::url::domain_of(&server.uri()).unwrap()
}

/// A page whose main region holds `body`
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><header>Site header</header><main>{}</main><footer>Footer</footer></body></html>",
        title, body
    )
}

pub fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

pub fn urlset(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|u| format!("<url><loc>{}</loc></url>", u))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

pub async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// A shutdown receiver that never fires
pub fn no_shutdown() -> watch::Receiver<bool> {
    watch::channel(false).1
}
