//! Content extraction for crawled pages
//!
//! Turns a fetched HTML page into a markdown body plus the links it carries.
//! Links are always read from the page as fetched; boilerplate removal only
//! affects the markdown body.

use crate::mapping::{classify_links, DocumentLink, DocumentResolver, PageType};
use crate::url::is_document_url;
use crate::{cached_regex, ExtractError};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Regions removed before locating the main content, in removal order
const BOILERPLATE_SELECTORS: &[&str] = &[
    "script",
    "style",
    "nav",
    "footer",
    "header",
    "iframe",
    "noscript",
    "svg",
    "aside",
    ".navigation",
    ".menu",
    ".sidebar",
    ".breadcrumb",
    "#nav",
    "#menu",
    "#sidebar",
    ".footer",
    "#footer",
    ".site-header",
    ".site-footer",
    "#site-navigation",
    ".widget",
    ".comment-form",
    "#comments",
    ".wp-block-navigation",
    ".entry-footer",
    ".social-share",
    ".related-posts",
];

/// Candidate main-content regions, most specific first
const MAIN_CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role=\"main\"]",
    ".content",
    ".entry-content",
    ".post-content",
    "#content",
    ".main-content",
    "body",
];

/// Everything the crawl keeps from one page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    pub title: String,
    pub markdown: String,

    /// Absolute HTTP(S) links in order of first appearance
    pub links: Vec<String>,

    /// Links to documents, each resolved against the corpus
    pub document_links: Vec<DocumentLink>,

    pub classification: PageType,
}

/// Extracts markdown content and links from HTML pages
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    min_content_length: usize,
}

impl ContentExtractor {
    pub fn new(min_content_length: usize) -> Self {
        Self { min_content_length }
    }

    /// Extracts a page
    ///
    /// # Arguments
    ///
    /// * `html` - The page body as fetched
    /// * `page_url` - The URL the page was fetched from, used to resolve links
    /// * `resolver` - Resolves document links to local corpus files
    ///
    /// # Returns
    ///
    /// * `Ok(ExtractedPage)` - The page has enough main content to keep
    /// * `Err(ExtractError)` - The page yields no record
    pub fn extract(
        &self,
        html: &str,
        page_url: &Url,
        resolver: &dyn DocumentResolver,
    ) -> Result<ExtractedPage, ExtractError> {
        let mut document = Html::parse_document(html);

        let title = extract_title(&document).unwrap_or_else(|| fallback_title(page_url));
        let (links, document_anchors) = extract_links(&document, page_url);

        let document_links: Vec<DocumentLink> = document_anchors
            .into_iter()
            .map(|(url, text)| {
                let found = resolver.find_matching_document(&url, &text);
                DocumentLink::new(url, text, found)
            })
            .collect();

        remove_boilerplate(&mut document);

        let region_html = main_content(&document)
            .filter(|region| !region.text().collect::<String>().trim().is_empty())
            .map(|region| region.html())
            .ok_or(ExtractError::NoMainContent)?;

        let markdown = collapse_blank_lines(&html_to_markdown(&region_html))
            .trim()
            .to_string();

        let length = markdown.chars().count();
        if length < self.min_content_length {
            return Err(ExtractError::ContentTooShort {
                length,
                minimum: self.min_content_length,
            });
        }

        let classification = classify_links(&document_links);

        Ok(ExtractedPage {
            title,
            markdown,
            links,
            document_links,
            classification,
        })
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn fallback_title(page_url: &Url) -> String {
    match page_url.path() {
        "" | "/" => page_url.to_string(),
        path => path.to_string(),
    }
}

/// Collects outbound links and document anchors, both deduplicated by URL
fn extract_links(document: &Html, page_url: &Url) -> (Vec<String>, Vec<(String, String)>) {
    let mut links = Vec::new();
    let mut seen_links = HashSet::new();
    let mut documents = Vec::new();
    let mut seen_documents = HashSet::new();

    let a_selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return (links, documents),
    };

    for element in document.select(&a_selector) {
        let absolute = match element.value().attr("href").and_then(|h| resolve_link(h, page_url)) {
            Some(url) => url,
            None => continue,
        };

        if is_document_url(&absolute) && seen_documents.insert(absolute.to_string()) {
            documents.push((absolute.to_string(), anchor_text(&element)));
        }

        // Download links are documents, never pages
        if element.value().attr("download").is_some() {
            continue;
        }

        if seen_links.insert(absolute.to_string()) {
            links.push(absolute.to_string());
        }
    }

    (links, documents)
}

fn anchor_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves an href against the page URL
///
/// Returns None for `javascript:`, `mailto:`, `tel:` and `data:` links,
/// fragment-only links, and anything that is not HTTP(S) once resolved.
fn resolve_link(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    page_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}

fn remove_boilerplate(document: &mut Html) {
    for selector_str in BOILERPLATE_SELECTORS {
        let selector = match Selector::parse(selector_str) {
            Ok(s) => s,
            Err(_) => continue,
        };

        let ids: Vec<_> = document.select(&selector).map(|element| element.id()).collect();
        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

fn main_content(document: &Html) -> Option<ElementRef<'_>> {
    MAIN_CONTENT_SELECTORS.iter().find_map(|selector_str| {
        Selector::parse(selector_str)
            .ok()
            .and_then(|selector| document.select(&selector).next())
    })
}

fn html_to_markdown(html: &str) -> String {
    htmd::convert(html).unwrap_or_else(|e| {
        tracing::debug!("Markdown conversion failed, using plain text: {}", e);
        Html::parse_fragment(html)
            .root_element()
            .text()
            .collect::<String>()
    })
}

/// Collapses runs of three or more newlines to a single blank line
fn collapse_blank_lines(markdown: &str) -> String {
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();

    cached_regex(&BLANK_RUNS, r"\n{3,}")
        .replace_all(markdown, "\n\n")
        .into_owned()
}
