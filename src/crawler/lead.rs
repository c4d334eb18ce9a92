//! Lead records emitted by the crawler
//!
//! A lead is built from a page whose extracted fields contain at least one of
//! the configured identifying fields. Derived attributes (size bucket,
//! technologies, social profiles) are filled in later by the enricher.

use crate::crawler::PageResult;
use crate::url::origin_of;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use url::Url;

/// Company size bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SizeBucket {
    #[serde(rename = "1-10")]
    Micro,
    #[serde(rename = "11-50")]
    Small,
    #[serde(rename = "51-200")]
    Medium,
    #[serde(rename = "201-500")]
    Large,
    #[serde(rename = "500+")]
    Enterprise,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl SizeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Micro => "1-10",
            Self::Small => "11-50",
            Self::Medium => "51-200",
            Self::Large => "201-500",
            Self::Enterprise => "500+",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a bucket label such as "51-200"
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "1-10" => Some(Self::Micro),
            "11-50" => Some(Self::Small),
            "51-200" => Some(Self::Medium),
            "201-500" => Some(Self::Large),
            "500+" => Some(Self::Enterprise),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Self::Unknown
    }
}

impl fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A company lead candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Lead {
    /// Opaque id derived from the source URL
    pub id: String,
    pub company_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub company_size_bucket: SizeBucket,
    pub technologies: BTreeSet<String>,
    /// Platform -> profile URL
    pub social_profiles: BTreeMap<String, String>,
    pub raw_extracted_fields: BTreeMap<String, Value>,
    /// Page the lead was extracted from
    pub source_url: String,
    pub crawl_depth: u32,
    /// Same-host links discovered on the source page
    pub internal_links: usize,
}

impl Lead {
    /// Builds a lead from a page if it carries an identifying field
    ///
    /// # Arguments
    ///
    /// * `page` - Fetched page with extracted fields filled in
    /// * `identifying_fields` - Fields of which at least one must be present
    ///
    /// # Returns
    ///
    /// * `Some(Lead)` - The page identifies a company or contact
    /// * `None` - The page is only useful for link discovery
    pub fn from_page(page: &PageResult, identifying_fields: &[String]) -> Option<Self> {
        let fields = &page.extracted_fields;
        let identified = identifying_fields
            .iter()
            .any(|name| fields.get(name).map_or(false, is_present));
        if !identified {
            return None;
        }

        let source = Url::parse(&page.final_url).or_else(|_| Url::parse(&page.url)).ok();
        let internal_links = match &source {
            Some(source) => page
                .discovered_links
                .iter()
                .filter_map(|link| Url::parse(link).ok())
                .filter(|link| link.host_str() == source.host_str())
                .count(),
            None => 0,
        };

        let technologies = list_field(fields, "technologies")
            .into_iter()
            .map(|tech| tech.to_lowercase())
            .collect();

        Some(Self {
            id: lead_id(&page.url),
            company_name: text_field(fields, "company_name"),
            contact_email: text_field(fields, "contact_email"),
            contact_phone: text_field(fields, "contact_phone"),
            website: text_field(fields, "website").or_else(|| source.as_ref().and_then(origin_of)),
            industry: text_field(fields, "industry"),
            location: text_field(fields, "location").or_else(|| text_field(fields, "address")),
            company_size_bucket: SizeBucket::Unknown,
            technologies,
            social_profiles: BTreeMap::new(),
            raw_extracted_fields: fields.clone(),
            source_url: page.url.clone(),
            crawl_depth: page.depth,
            internal_links,
        })
    }

    /// Raw field as text, if present
    pub fn raw_text(&self, key: &str) -> Option<String> {
        text_field(&self.raw_extracted_fields, key)
    }

    /// Raw field as a list of strings (scalars become one-element lists)
    pub fn raw_list(&self, key: &str) -> Vec<String> {
        list_field(&self.raw_extracted_fields, key)
    }

    /// Host of the lead's website, lowercased
    pub fn website_host(&self) -> Option<String> {
        let website = self.website.as_deref()?;
        let parsed = Url::parse(website)
            .or_else(|_| Url::parse(&format!("https://{}", website)))
            .ok()?;
        parsed
            .host_str()
            .map(|host| host.trim_start_matches("www.").to_lowercase())
    }
}

/// Deterministic id for a lead found on `url`
pub fn lead_id(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

fn text_field(fields: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn list_field(fields: &BTreeMap<String, Value>, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Object(map)) => map
            .values()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}
