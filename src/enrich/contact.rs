//! Contact channel normalization
//!
//! Fills a missing email or phone from the page text and `mailto:`/`tel:`
//! links, normalizes what is present, and classifies social profile URLs by
//! platform.

use crate::crawler::Lead;
use crate::extract::signal_keys;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("email regex is hardcoded and valid")
});

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\(?\d{1,4}\)?(?:[-.\s]?\(?\d{2,4}\)?){2,4}")
        .expect("phone regex is hardcoded and valid")
});

/// Address fragments that mark placeholder or unmonitored mailboxes
const IGNORED_EMAIL_FRAGMENTS: &[&str] = &["example", "test", "noreply", "no-reply"];

/// Minimum number of digits in a plausible phone number
const MIN_PHONE_DIGITS: usize = 7;

/// Platform name -> hosts serving its profiles
const SOCIAL_PLATFORMS: &[(&str, &[&str])] = &[
    ("linkedin", &["linkedin.com"]),
    ("twitter", &["twitter.com", "x.com"]),
    ("facebook", &["facebook.com", "fb.com"]),
    ("instagram", &["instagram.com"]),
    ("youtube", &["youtube.com", "youtu.be"]),
    ("github", &["github.com"]),
];

/// Path fragments of share widgets rather than profiles
const SHARE_PATHS: &[&str] = &["/share", "/sharer", "/intent/", "/home?status"];

pub(crate) fn normalize_contacts(lead: &mut Lead) {
    let contact_links = lead.raw_list(signal_keys::CONTACT_LINKS);
    let page_text = lead.raw_text(signal_keys::PAGE_TEXT).unwrap_or_default();

    lead.contact_email = lead
        .contact_email
        .as_deref()
        .and_then(normalize_email)
        .or_else(|| {
            contact_links
                .iter()
                .filter_map(|link| link.strip_prefix("mailto:"))
                .chain(EMAIL_PATTERN.find_iter(&page_text).map(|m| m.as_str()))
                .find_map(normalize_email)
        });

    lead.contact_phone = lead
        .contact_phone
        .as_deref()
        .and_then(normalize_phone)
        .or_else(|| {
            contact_links
                .iter()
                .filter_map(|link| link.strip_prefix("tel:"))
                .chain(PHONE_PATTERN.find_iter(&page_text).map(|m| m.as_str()))
                .find_map(normalize_phone)
        });

    let candidates = lead
        .raw_list("social_links")
        .into_iter()
        .chain(lead.raw_list(signal_keys::OUTBOUND_LINKS))
        .chain(contact_links);
    for candidate in candidates {
        if let Some((platform, url)) = classify_social(&candidate) {
            lead.social_profiles
                .entry(platform.to_string())
                .or_insert(url);
        }
    }
}

/// Lowercases and validates an address; placeholders yield None
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw
        .trim()
        .trim_start_matches("mailto:")
        .split('?')
        .next()?
        .trim()
        .to_lowercase();

    let matched = EMAIL_PATTERN.find(&email)?;
    if matched.start() != 0 || matched.end() != email.len() {
        return None;
    }
    if IGNORED_EMAIL_FRAGMENTS
        .iter()
        .any(|fragment| email.contains(fragment))
    {
        return None;
    }
    Some(email)
}

/// Keeps digits and a leading `+`; too-short numbers yield None
pub fn normalize_phone(raw: &str) -> Option<String> {
    let raw = raw.trim().trim_start_matches("tel:").trim();
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < MIN_PHONE_DIGITS || digits.len() > 15 {
        return None;
    }
    if raw.starts_with('+') {
        Some(format!("+{}", digits))
    } else {
        Some(digits)
    }
}

/// Maps a profile URL to its platform
pub fn classify_social(raw: &str) -> Option<(&'static str, String)> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_lowercase();
    let host = host.trim_start_matches("www.").trim_start_matches("m.");

    let path = url.path().to_lowercase();
    if path == "/" || SHARE_PATHS.iter().any(|share| path.starts_with(share)) {
        return None;
    }

    SOCIAL_PLATFORMS
        .iter()
        .find(|(_, hosts)| {
            hosts
                .iter()
                .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
        })
        .map(|(platform, _)| (*platform, url.to_string()))
}
