//! Lockout protection through a full crawl

use crate::support::*;
use docharvest::config::CrawlMode;
use docharvest::run_crawl;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_login_redirects_block_domain() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&[
            format!("{}/p1", base),
            format!("{}/p2", base),
            format!("{}/p3", base),
        ])))
        .mount(&server)
        .await;
    for route in ["/p1", "/p2"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/login?next=/"))
            .expect(1)
            .mount(&server)
            .await;
    }
    // Never requested: the domain is blocked by then
    Mock::given(method("GET"))
        .and(path("/p3"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/login"))
        .expect(0)
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let mut config = test_config(&server, output.path(), CrawlMode::Sitemap);
    config.auth.max_auth_failures = 2;

    let outcome = run_crawl(config, None, no_shutdown()).await.unwrap();
    let summary = &outcome.summary;
    let domain = domain(&server);

    assert_eq!(summary.files_saved, 0);
    assert_eq!(summary.errors.len(), 3);
    assert!(summary.errors[0].error.starts_with("Redirect to login page blocked"));
    assert!(summary.errors[2].error.starts_with("Domain blocked"));
    assert_eq!(summary.blocked_domains, vec![domain.clone()]);
    assert_eq!(summary.auth_failures_by_domain.get(&domain), Some(&2));

    let report = read_json(&output.path().join(docharvest::output::SUMMARY_FILE));
    assert_eq!(report["blockedDomains"][0], domain.as_str());
}

#[tokio::test]
async fn test_token_is_sent_to_its_domain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("X-Crawl-Token", "secret"))
        .respond_with(html(page(
            "Members",
            "<p>Content that only shows up with a valid crawl token.</p>",
        )))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let mut config = test_config(&server, output.path(), CrawlMode::StartUrl);
    config
        .auth
        .tokens
        .insert(domain(&server), "secret".to_string());

    let outcome = run_crawl(config, None, no_shutdown()).await.unwrap();
    assert_eq!(outcome.summary.files_saved, 1);
    assert!(outcome.summary.auth_failures_by_domain.is_empty());

    let output = TempDir::new().unwrap();
    let config = test_config(&server, output.path(), CrawlMode::StartUrl);

    let outcome = run_crawl(config, None, no_shutdown()).await.unwrap();
    assert_eq!(outcome.summary.files_saved, 0);
    assert_eq!(outcome.summary.errors[0].error, "Access denied (HTTP 403)");
    assert_eq!(
        outcome.summary.auth_failures_by_domain.get(&domain(&server)),
        Some(&1)
    );
}

#[tokio::test]
async fn test_login_form_page_is_not_saved() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        page(
            "Sign in",
            r#"<p>Please sign in to continue to the staff handbook.</p>
               <form><input type="text" name="user"><input type="password" name="pass"></form>"#,
        ),
    )
    .await;

    let output = TempDir::new().unwrap();
    let config = test_config(&server, output.path(), CrawlMode::StartUrl);

    let outcome = run_crawl(config, None, no_shutdown()).await.unwrap();

    assert_eq!(outcome.summary.files_saved, 0);
    assert_eq!(
        outcome.summary.errors[0].error,
        "Login form detected in response"
    );
    assert!(!output.path().join("index.md").exists());
}
