//! Technology detection from captured page signals
//!
//! Two passes, neither touching the network: markup signatures (script
//! sources, generator tags, stack headers) matched as substrings, and
//! technology names mentioned in the visible page text matched as whole words.

use crate::crawler::Lead;
use crate::extract::signal_keys;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Technology -> fragments identifying it in markup signals
const MARKUP_SIGNATURES: &[(&str, &[&str])] = &[
    ("react", &["react.production", "react-dom", "/react@", "react.min.js"]),
    ("vue", &["vue.min.js", "vue.global", "/vue@", "vue.runtime"]),
    ("angular", &["angular.min.js", "@angular/", "zone.js"]),
    ("nextjs", &["/_next/", "next.js"]),
    ("wordpress", &["wp-content", "wp-includes", "wordpress"]),
    ("drupal", &["drupal"]),
    ("shopify", &["cdn.shopify.com", "shopify"]),
    ("webflow", &["webflow"]),
    ("jquery", &["jquery"]),
    ("google analytics", &["google-analytics.com", "googletagmanager.com/gtag"]),
    ("google tag manager", &["googletagmanager.com/gtm"]),
    ("segment", &["cdn.segment.com"]),
    ("hotjar", &["hotjar"]),
    ("mixpanel", &["mixpanel"]),
    ("amplitude", &["cdn.amplitude.com"]),
    ("hubspot", &["js.hs-scripts.com", "hubspot"]),
    ("intercom", &["widget.intercom.io"]),
    ("stripe", &["js.stripe.com"]),
    ("cloudflare", &["cloudflare"]),
    ("aws", &["amazonaws.com", "cloudfront", "awselb"]),
    ("vercel", &["vercel"]),
    ("netlify", &["netlify"]),
    ("heroku", &["heroku"]),
    ("nginx", &["nginx"]),
    ("apache", &["apache"]),
    ("php", &["php/"]),
    ("express", &["express"]),
    ("asp.net", &["asp.net"]),
];

/// Technology names recognized in page text
const TEXT_KEYWORDS: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "java",
    "golang",
    "rust",
    "php",
    "ruby",
    "react",
    "angular",
    "vue",
    "django",
    "flask",
    "nextjs",
    "rails",
    "laravel",
    "aws",
    "azure",
    "gcp",
    "google cloud",
    "heroku",
    "vercel",
    "netlify",
    "postgresql",
    "mysql",
    "mongodb",
    "redis",
    "elasticsearch",
    "docker",
    "kubernetes",
    "terraform",
    "jenkins",
    "github actions",
    "google analytics",
    "mixpanel",
    "amplitude",
    "hotjar",
    "salesforce",
    "hubspot",
];

static KEYWORD_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    TEXT_KEYWORDS
        .iter()
        .filter_map(|keyword| {
            let pattern = format!(r"\b{}\b", regex::escape(keyword));
            Regex::new(&pattern).ok().map(|re| (*keyword, re))
        })
        .collect()
});

/// Technologies identified by markup signal fragments
pub fn detect_in_markup(signals: &[String]) -> BTreeSet<String> {
    let haystack: Vec<String> = signals.iter().map(|s| s.to_lowercase()).collect();
    MARKUP_SIGNATURES
        .iter()
        .filter(|(_, fragments)| {
            haystack
                .iter()
                .any(|signal| fragments.iter().any(|fragment| signal.contains(fragment)))
        })
        .map(|(tech, _)| tech.to_string())
        .collect()
}

/// Technologies named in free text
pub fn detect_in_text(text: &str) -> BTreeSet<String> {
    let text = text.to_lowercase();
    KEYWORD_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(&text))
        .map(|(tech, _)| tech.to_string())
        .collect()
}

pub(crate) fn detect_technologies(lead: &mut Lead) {
    let mut found = detect_in_markup(&lead.raw_list(signal_keys::MARKUP_SIGNALS));
    if let Some(text) = lead.raw_text(signal_keys::PAGE_TEXT) {
        found.extend(detect_in_text(&text));
    }
    if let Some(description) = lead.raw_text("description") {
        found.extend(detect_in_text(&description));
    }

    let before = lead.technologies.len();
    lead.technologies.extend(found);
    if lead.technologies.len() > before {
        tracing::trace!(
            lead = %lead.id,
            added = lead.technologies.len() - before,
            "Detected technologies"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_markup_signatures() {
        let signals = vec![
            "https://cdn.example.net/react-dom.production.min.js".to_string(),
            "generator: WordPress 6.4".to_string(),
            "server: nginx/1.25".to_string(),
            "x-powered-by: PHP/8.2".to_string(),
        ];
        let found = detect_in_markup(&signals);
        let found: Vec<&str> = found.iter().map(String::as_str).collect();
        assert_eq!(found, vec!["nginx", "php", "react", "wordpress"]);
    }

    #[test]
    fn test_text_keywords_match_whole_words() {
        let found = detect_in_text("We build on Python and AWS. Trusted by JavaScript teams.");
        assert!(found.contains("python"));
        assert!(found.contains("aws"));
        assert!(found.contains("javascript"));
        assert!(!found.contains("java"));
        assert!(!found.contains("rust"));
    }

    #[test]
    fn test_detected_technologies_merge_with_extracted() {
        let mut lead = Lead {
            technologies: ["kubernetes".to_string()].into_iter().collect(),
            ..Lead::default()
        };
        lead.raw_extracted_fields.insert(
            signal_keys::MARKUP_SIGNALS.to_string(),
            json!(["https://js.stripe.com/v3/"]),
        );
        lead.raw_extracted_fields.insert(
            signal_keys::PAGE_TEXT.to_string(),
            json!("Our platform runs on Docker."),
        );

        detect_technologies(&mut lead);

        let techs: Vec<&str> = lead.technologies.iter().map(String::as_str).collect();
        assert_eq!(techs, vec!["docker", "kubernetes", "stripe"]);
    }
}
