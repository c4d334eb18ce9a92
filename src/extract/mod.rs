//! Extraction of links, page signals and schema fields
//!
//! Link discovery always runs. Schema fields are delegated to the AI
//! collaborator and coerced to their declared kinds; a collaborator failure
//! degrades the page to links-only instead of failing the crawl.

mod coerce;
mod collaborator;
mod html;
mod schema;

pub use coerce::coerce;
pub use collaborator::{parse_fields, FieldExtractor, OpenAiExtractor};
pub use html::{parse_html, resolve_link, truncate_chars, ParsedPage, MAX_PAGE_TEXT_CHARS};
pub use schema::{ExtractionSchema, FieldKind};

use crate::crawler::PageResult;
use crate::ExtractionError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

/// Reserved keys under which page signals are stored in the extracted fields
pub mod signal_keys {
    pub const PAGE_TITLE: &str = "page_title";
    pub const META_DESCRIPTION: &str = "meta_description";
    pub const PAGE_TEXT: &str = "page_text";
    pub const MARKUP_SIGNALS: &str = "markup_signals";
    pub const CONTACT_LINKS: &str = "contact_links";
    pub const OUTBOUND_LINKS: &str = "outbound_links";
}

/// Response headers that identify the serving stack
const STACK_HEADERS: &[&str] = &["server", "x-powered-by", "x-generator"];

/// Output of extracting one page
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Absolute, deduplicated links in document order
    pub links: Vec<String>,
    /// Page signals plus coerced schema fields
    pub fields: BTreeMap<String, Value>,
    /// Set when schema fields could not be extracted
    pub error: Option<ExtractionError>,
}

impl Extraction {
    /// True when schema extraction ran without a collaborator failure
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Turns fetched pages into links and fields
#[derive(Clone, Default)]
pub struct Extractor {
    collaborator: Option<Arc<dyn FieldExtractor>>,
}

impl Extractor {
    pub fn new(collaborator: Option<Arc<dyn FieldExtractor>>) -> Self {
        Self { collaborator }
    }

    /// An extractor without a collaborator; non-empty schemas degrade to links-only
    pub fn links_only() -> Self {
        Self::default()
    }

    /// Extracts links, signals and schema fields from a fetched page
    ///
    /// Failed and non-HTML pages yield an empty extraction. An empty schema
    /// never calls the collaborator.
    pub async fn extract(&self, page: &PageResult, schema: &ExtractionSchema) -> Extraction {
        if !page.is_success() || !page.is_html() || page.raw_content.is_empty() {
            return Extraction::default();
        }

        let Ok(base) = Url::parse(&page.final_url).or_else(|_| Url::parse(&page.url)) else {
            return Extraction::default();
        };

        let parsed = parse_html(&page.raw_content, &base);
        let mut fields = page_signals(page, &parsed, &base);

        let error = if schema.is_empty() {
            None
        } else {
            match &self.collaborator {
                None => Some(ExtractionError::CollaboratorUnavailable(
                    "no extraction collaborator configured".to_string(),
                )),
                Some(collaborator) => {
                    let text = collaborator_input(&parsed);
                    match collaborator.extract_fields(&text, schema).await {
                        Ok(raw) => {
                            for (name, value) in raw {
                                let Some(kind) = schema.kind_of(&name) else {
                                    continue;
                                };
                                match coerce(&value, kind) {
                                    Some(coerced) => {
                                        fields.insert(name, coerced);
                                    }
                                    None => tracing::trace!(
                                        "Dropping field {} on {}: not a {}",
                                        name,
                                        page.url,
                                        kind
                                    ),
                                }
                            }
                            None
                        }
                        Err(e) => Some(e),
                    }
                }
            }
        };

        if let Some(e) = &error {
            tracing::warn!("Extraction degraded to links-only for {}: {}", page.url, e);
        }

        Extraction {
            links: parsed.links,
            fields,
            error,
        }
    }
}

/// Builds the reserved signal fields for a parsed page
fn page_signals(page: &PageResult, parsed: &ParsedPage, base: &Url) -> BTreeMap<String, Value> {
    let mut fields = BTreeMap::new();

    if let Some(title) = &parsed.title {
        fields.insert(signal_keys::PAGE_TITLE.to_string(), Value::from(title.clone()));
    }
    if let Some(description) = &parsed.meta_description {
        fields.insert(
            signal_keys::META_DESCRIPTION.to_string(),
            Value::from(description.clone()),
        );
    }
    if !parsed.text.is_empty() {
        fields.insert(signal_keys::PAGE_TEXT.to_string(), Value::from(parsed.text.clone()));
    }

    let mut markup: Vec<String> = parsed.script_sources.clone();
    if let Some(generator) = &parsed.generator {
        markup.push(format!("generator: {}", generator));
    }
    for name in STACK_HEADERS {
        if let Some(value) = page.header(name) {
            markup.push(format!("{}: {}", name, value));
        }
    }
    if !markup.is_empty() {
        fields.insert(signal_keys::MARKUP_SIGNALS.to_string(), Value::from(markup));
    }

    if !parsed.contact_links.is_empty() {
        fields.insert(
            signal_keys::CONTACT_LINKS.to_string(),
            Value::from(parsed.contact_links.clone()),
        );
    }

    let outbound: Vec<String> = parsed
        .links
        .iter()
        .filter(|link| {
            Url::parse(link)
                .map(|url| url.host_str() != base.host_str())
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    if !outbound.is_empty() {
        fields.insert(signal_keys::OUTBOUND_LINKS.to_string(), Value::from(outbound));
    }

    fields
}

fn collaborator_input(parsed: &ParsedPage) -> String {
    let mut parts = Vec::new();
    if let Some(title) = &parsed.title {
        parts.push(title.as_str());
    }
    if let Some(description) = &parsed.meta_description {
        parts.push(description.as_str());
    }
    parts.push(parsed.text.as_str());
    parts.join("\n\n")
}
