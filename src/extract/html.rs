//! HTML parser for extracting links and page signals
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from `<a>` tags)
//! - Page title and meta description
//! - Visible text for field extraction and intent detection
//! - Markup fragments used for technology detection
//! - `mailto:` / `tel:` contact links

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Upper bound on the visible text kept per page (characters)
pub const MAX_PAGE_TEXT_CHARS: usize = 10_000;

/// Elements whose text is never part of the visible page text
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "nav", "footer", "head", "template"];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from `<title>` tag)
    pub title: Option<String>,

    /// `<meta name="description">` content
    pub meta_description: Option<String>,

    /// `<meta name="generator">` content
    pub generator: Option<String>,

    /// All followable links (absolute, fragment-free, deduplicated, document order)
    pub links: Vec<String>,

    /// `src` of every `<script>` element
    pub script_sources: Vec<String>,

    /// `mailto:` and `tel:` hrefs, deduplicated
    pub contact_links: Vec<String>,

    /// Whitespace-collapsed visible text, truncated to `MAX_PAGE_TEXT_CHARS`
    pub text: String,
}

/// Parses HTML content and extracts links and page signals
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, `rel="nofollow"` included
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:`, `data:` links
/// - Fragment-only links and links back to the same document
/// - Non-HTTP(S) URLs after resolution
///
/// # Example
///
/// ```
/// use leadscout::extract::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: select_text(&document, "title"),
        meta_description: meta_content(&document, "description"),
        generator: meta_content(&document, "generator"),
        links: extract_links(&document, base_url),
        script_sources: select_attr(&document, "script[src]", "src"),
        contact_links: extract_contact_links(&document),
        text: extract_visible_text(&document),
    }
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn meta_content(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse("meta[name][content]").ok()?;

    document
        .select(&selector)
        .find(|element| {
            element
                .value()
                .attr("name")
                .map_or(false, |n| n.eq_ignore_ascii_case(name))
        })
        .and_then(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut page = base_url.clone();
    page.set_fragment(None);

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&a_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve_link(href, base_url) else {
            continue;
        };

        // `/page#team` on `/page` points back at this document
        if href.contains('#') && absolute == page {
            continue;
        }

        let absolute = absolute.to_string();
        if seen.insert(absolute.clone()) {
            links.push(absolute);
        }
    }

    links
}

/// Resolves a link href to an absolute, fragment-free URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel:, data: schemes
/// - Fragment-only hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
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

    let mut absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }
    absolute.set_fragment(None);
    Some(absolute)
}

fn extract_contact_links(document: &Html) -> Vec<String> {
    let mut seen = HashSet::new();
    select_attr(document, "a[href]", "href")
        .into_iter()
        .filter(|href| {
            let lower = href.to_ascii_lowercase();
            lower.starts_with("mailto:") || lower.starts_with("tel:")
        })
        .filter(|href| seen.insert(href.clone()))
        .collect()
}

/// Collects text nodes outside hidden elements
fn extract_visible_text(document: &Html) -> String {
    let mut chunks: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if !hidden {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed);
            }
        }
    }

    truncate_chars(&collapse_whitespace(&chunks.join(" ")), MAX_PAGE_TEXT_CHARS)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates on a character boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
