//! Site structure collected by map crawls

use crate::crawler::PageResult;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Rough purpose of a page, guessed from its URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Contact,
    Content,
    Product,
    Pricing,
    Page,
    Other,
}

impl PageType {
    /// Classifies a URL by keyword, first match wins
    pub fn classify(url: &str) -> Self {
        let lower = url.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has(&["contact", "about", "team"]) {
            Self::Contact
        } else if has(&["blog", "news", "article"]) {
            Self::Content
        } else if has(&["product", "service", "solution"]) {
            Self::Product
        } else if has(&["pricing", "plan"]) {
            Self::Pricing
        } else if lower.ends_with('/') || lower.ends_with(".html") {
            Self::Page
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Contact => "contact",
            Self::Content => "content",
            Self::Product => "product",
            Self::Pricing => "pricing",
            Self::Page => "page",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// One fetched page in the site tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteMapNode {
    pub url: String,
    pub depth: u32,
    pub parent: Option<String>,
    /// Fetched pages first reached from this one, in fetch order
    pub children: Vec<String>,
    pub page_type: PageType,
    pub title: Option<String>,
    pub status_code: Option<u16>,
}

/// Tree of fetched pages (url -> children)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SiteMap {
    pub nodes: Vec<SiteMapNode>,
}

impl SiteMap {
    /// Builds the tree from pages in fetch order
    pub fn from_pages(pages: &[PageResult]) -> Self {
        let mut nodes: Vec<SiteMapNode> = pages
            .iter()
            .map(|page| SiteMapNode {
                url: page.url.clone(),
                depth: page.depth,
                parent: page.parent_url.clone(),
                children: Vec::new(),
                page_type: PageType::classify(&page.url),
                title: page
                    .extracted_fields
                    .get(crate::extract::signal_keys::PAGE_TITLE)
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                status_code: page.status_code,
            })
            .collect();

        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.url.clone(), i))
            .collect();

        for i in 0..nodes.len() {
            let Some(parent) = nodes[i].parent.clone() else {
                continue;
            };
            if let Some(&p) = index.get(&parent) {
                let child = nodes[i].url.clone();
                nodes[p].children.push(child);
            }
        }

        Self { nodes }
    }

    /// Depth-0 nodes
    pub fn roots(&self) -> impl Iterator<Item = &SiteMapNode> {
        self.nodes.iter().filter(|node| node.parent.is_none())
    }

    pub fn get(&self, url: &str) -> Option<&SiteMapNode> {
        self.nodes.iter().find(|node| node.url == url)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
