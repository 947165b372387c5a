//! End-to-end crawl tests

use crate::support::*;
use docharvest::config::CrawlMode;
use docharvest::events::{CrawlEvent, RecordingSink};
use docharvest::output::{DOCUMENT_LINKS_FILE, METADATA_FILE, RELATIONSHIPS_FILE, SUMMARY_FILE};
use docharvest::{run_crawl, Coordinator};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_sitemap_crawl_end_to_end() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&[
            format!("{}/", base),
            format!("{}/news/update", base),
            format!("{}/forms/leave", base),
        ])))
        .mount(&server)
        .await;

    mount_page(
        &server,
        "/",
        page(
            "Staff Portal",
            r#"<h1>Welcome</h1><p>Start here for everything about working with us.</p>
               <a href="/about">About us</a>
               <a href="/files/leave-form.pdf">Leave request form</a>"#,
        ),
    )
    .await;
    mount_page(
        &server,
        "/forms/leave",
        page("Leave", "<p>How to request annual and sick leave from your manager.</p>"),
    )
    .await;
    mount_page(
        &server,
        "/news/update",
        page("Update", "<p>The office will be closed on the first Monday of May.</p>"),
    )
    .await;
    mount_page(
        &server,
        "/about",
        page("About", "<p>We are a small team that supports staff across the region.</p>"),
    )
    .await;

    let corpus = TempDir::new().unwrap();
    fs::write(corpus.path().join("leave-form.md"), "# Leave Form\n\nFill in.\n").unwrap();

    let output = TempDir::new().unwrap();
    let mut config = test_config(&server, output.path(), CrawlMode::Sitemap);
    config.documents.corpus_dirs = vec![corpus.path().display().to_string()];

    let outcome = run_crawl(config, Some("cafebabe".to_string()), no_shutdown())
        .await
        .unwrap();

    let summary = &outcome.summary;
    assert_eq!(summary.files_saved, 4);
    assert_eq!(summary.pages_crawled, 4);
    assert!(summary.errors.is_empty());
    assert_eq!(summary.document_links_found, 1);
    assert_eq!(summary.corpus.map(|c| c.documents), Some(1));

    // Priority sections are crawled before everything else
    let metadata = read_json(&output.path().join(METADATA_FILE));
    let files = metadata["files"].as_array().unwrap();
    assert_eq!(files.len(), 4);
    assert_eq!(files[0]["filename"], "forms-leave.md");
    assert_eq!(files[3]["filename"], "about.md");

    let index = fs::read_to_string(output.path().join("index.md")).unwrap();
    assert!(index.contains("title: Staff Portal\n"));
    assert!(index.contains("Start here for everything"));
    assert!(!index.contains("Site header"));
    assert!(index.contains("## Related Documents"));
    assert!(index.contains("filename_exact, 0.95)"));

    let report = read_json(&output.path().join(SUMMARY_FILE));
    assert_eq!(report["status"], "completed");
    assert_eq!(report["configHash"], "cafebabe");
    assert!(report["sitemapUrl"].as_str().unwrap().ends_with("/sitemap.xml"));

    let links = read_json(&output.path().join(DOCUMENT_LINKS_FILE));
    assert_eq!(links[0]["text"], "Leave request form");

    let relationships = read_json(&output.path().join(RELATIONSHIPS_FILE));
    assert_eq!(relationships[0]["pageTitle"], "Staff Portal");
    assert_eq!(relationships[0]["linkedDocumentCount"], 1);
    assert_eq!(relationships[0]["isDocumentPortal"], false);
    assert_eq!(
        relationships[0]["linkedDocuments"][0]["matchType"],
        "filename_exact"
    );
}

#[tokio::test]
async fn test_missing_sitemap_falls_back_to_base_url() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        page("Home", "<p>The only page this site has, reached without a sitemap.</p>"),
    )
    .await;

    let output = TempDir::new().unwrap();
    let sink = Arc::new(RecordingSink::new());
    let config = test_config(&server, output.path(), CrawlMode::Sitemap);

    let outcome = Coordinator::new(config, sink.clone())
        .unwrap()
        .run(no_shutdown())
        .await
        .unwrap();

    assert_eq!(outcome.summary.files_saved, 1);
    assert!(sink
        .events()
        .iter()
        .any(|e| matches!(e, CrawlEvent::SitemapFallback { .. })));
}

#[tokio::test]
async fn test_page_budget_stops_crawl() {
    let server = MockServer::start().await;
    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="/p{}">Page {}</a>"#, i, i))
        .collect();
    mount_page(
        &server,
        "/",
        page("Home", &format!("<p>Links to every page of the handbook.</p>{}", links)),
    )
    .await;
    for i in 1..=5 {
        mount_page(
            &server,
            &format!("/p{}", i),
            page("Page", "<p>One chapter of the handbook with plenty of text.</p>"),
        )
        .await;
    }

    let output = TempDir::new().unwrap();
    let mut config = test_config(&server, output.path(), CrawlMode::StartUrl);
    config.crawl.max_pages = 2;

    let outcome = run_crawl(config, None, no_shutdown()).await.unwrap();

    assert_eq!(outcome.summary.files_saved, 2);
    assert_eq!(outcome.summary.pages_crawled, 2);
    assert!(output.path().join("index.md").exists());
    assert!(output.path().join("p1.md").exists());
    assert!(!output.path().join("p2.md").exists());
}

#[tokio::test]
async fn test_pages_too_short_to_save_still_spend_the_budget() {
    let server = MockServer::start().await;
    let base = server.uri();
    let pages: Vec<String> = (1..=3).map(|i| format!("{}/stub{}", base, i)).collect();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&pages)))
        .mount(&server)
        .await;
    for (i, expected) in [(1, 1), (2, 0), (3, 0)] {
        Mock::given(method("GET"))
            .and(path(format!("/stub{}", i)))
            .respond_with(html(page("Stub", "<p>TBD</p>")))
            .expect(expected)
            .mount(&server)
            .await;
    }

    let output = TempDir::new().unwrap();
    let mut config = test_config(&server, output.path(), CrawlMode::Sitemap);
    config.crawl.max_pages = 1;

    let outcome = run_crawl(config, None, no_shutdown()).await.unwrap();

    assert_eq!(outcome.summary.pages_crawled, 1);
    assert_eq!(outcome.summary.files_saved, 0);
    assert_eq!(outcome.summary.errors.len(), 1);
    assert!(outcome.summary.errors[0].error.starts_with("Content too short"));
}

#[tokio::test]
async fn test_depth_limit_is_respected() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        page("Home", r#"<p>The root of a chain of linked pages.</p><a href="/a">Next</a>"#),
    )
    .await;
    mount_page(
        &server,
        "/a",
        page("A", r#"<p>First level below the root page here.</p><a href="/b">Next</a>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html(page("B", "<p>Too deep to be crawled at all.</p>")))
        .expect(0)
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let mut config = test_config(&server, output.path(), CrawlMode::StartUrl);
    config.crawl.max_depth = 1;

    let outcome = run_crawl(config, None, no_shutdown()).await.unwrap();

    assert_eq!(outcome.summary.files_saved, 2);
    assert_eq!(outcome.summary.urls_visited, 2);
}

#[tokio::test]
async fn test_output_dir_that_cannot_be_created_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("taken");
    fs::write(&blocker, "a file, not a directory").unwrap();

    let config = test_config(&server, &blocker, CrawlMode::StartUrl);
    let result = run_crawl(config, None, no_shutdown()).await;

    assert!(matches!(result, Err(docharvest::HarvestError::Output(_))));
}
