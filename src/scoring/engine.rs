//! Deterministic multi-factor lead scoring
//!
//! Four sub-scores in [0, 100] are combined with fixed weights into a
//! composite, which maps onto a letter grade. Scoring is a pure function of
//! the lead and the profile: no I/O, no shared state, identical inputs give
//! bit-identical results.

use crate::crawler::Lead;
use crate::extract::signal_keys;
use crate::scoring::IcpConfig;
use crate::ConfigError;
use serde::Serialize;
use std::fmt;

/// Allowed distance of the weight sum from 1.0
const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Intent signal name, points, phrases indicating it
const INTENT_SIGNALS: &[(&str, f64, &[&str])] = &[
    (
        "pricing",
        25.0,
        &["pricing", "plans and pricing", "per month", "per user", "/mo"],
    ),
    (
        "demo",
        25.0,
        &[
            "request a demo",
            "book a demo",
            "schedule a demo",
            "get a demo",
            "free trial",
            "start your trial",
            "contact sales",
        ],
    ),
    (
        "funding",
        20.0,
        &[
            "raised",
            "series a",
            "series b",
            "series c",
            "seed round",
            "funding round",
            "backed by",
        ],
    ),
    (
        "hiring",
        20.0,
        &[
            "we're hiring",
            "we are hiring",
            "join our team",
            "open positions",
            "open roles",
            "careers",
        ],
    ),
];

/// Points for a lead whose extracted pain points are non-empty
const PAIN_POINT_POINTS: f64 = 10.0;

/// Social platform -> engagement points
const SOCIAL_POINTS: &[(&str, f64)] = &[("linkedin", 20.0), ("twitter", 10.0)];
const OTHER_SOCIAL_POINTS: f64 = 5.0;
const SOCIAL_CAP: f64 = 40.0;
const POINTS_PER_INTERNAL_LINK: f64 = 2.0;
const INTERNAL_LINK_CAP: f64 = 40.0;
const POINTS_PER_DEPTH: f64 = 10.0;
const DEPTH_CAP: f64 = 20.0;

/// Sub-score weights of the composite
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreWeights {
    pub fit: f64,
    pub intent: f64,
    pub engagement: f64,
    pub data_quality: f64,
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.fit + self.intent + self.engagement + self.data_quality
    }

    /// Checks that every weight is non-negative and the weights sum to 1.0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [self.fit, self.intent, self.engagement, self.data_quality];
        let sum = self.sum();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0)
            || (sum - 1.0).abs() > WEIGHT_TOLERANCE
        {
            return Err(ConfigError::InvalidWeights { sum });
        }
        Ok(())
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            fit: 0.35,
            intent: 0.30,
            engagement: 0.20,
            data_quality: 0.15,
        }
    }
}

/// Letter grade of a composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Maps a composite onto its band; lower bounds are inclusive
    pub fn from_composite(composite: u8) -> Self {
        match composite {
            90.. => Self::APlus,
            80..=89 => Self::A,
            70..=79 => Self::B,
            60..=69 => Self::C,
            50..=59 => Self::D,
            _ => Self::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores of one lead against one profile
///
/// Derived data: recompute it from the lead and profile instead of editing it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeadScore {
    pub fit: f64,
    pub intent: f64,
    pub engagement: f64,
    pub data_quality: f64,
    pub composite: u8,
    pub grade: Grade,
}

/// Scoring engine with validated weights
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    weights: ScoreWeights,
}

impl ScoringEngine {
    /// Engine with the default weights
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with custom weights, rejected unless they sum to 1.0
    pub fn with_weights(weights: ScoreWeights) -> Result<Self, ConfigError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    pub fn score(&self, lead: &Lead, icp: &IcpConfig) -> LeadScore {
        let fit = fit_score(lead, icp);
        let intent = intent_score(lead);
        let engagement = engagement_score(lead);
        let data_quality = data_quality_score(lead);

        let w = &self.weights;
        let weighted = w.fit * fit
            + w.intent * intent
            + w.engagement * engagement
            + w.data_quality * data_quality;
        let composite = weighted.round().clamp(0.0, 100.0) as u8;

        LeadScore {
            fit,
            intent,
            engagement,
            data_quality,
            composite,
            grade: Grade::from_composite(composite),
        }
    }
}

/// Scores a lead with the default weights
pub fn score(lead: &Lead, icp: &IcpConfig) -> LeadScore {
    ScoringEngine::new().score(lead, icp)
}

/// Share of configured profile dimensions the lead matches, scaled to 100
///
/// Unconfigured dimensions are left out of the denominator. Technologies
/// contribute their overlap ratio rather than a full match.
pub fn fit_score(lead: &Lead, icp: &IcpConfig) -> f64 {
    let mut matched = 0.0;
    let mut dimensions = 0u32;

    if !icp.company_sizes.is_empty() {
        dimensions += 1;
        if icp.company_sizes.contains(lead.company_size_bucket.as_str()) {
            matched += 1.0;
        }
    }

    if !icp.industries.is_empty() {
        dimensions += 1;
        if let Some(industry) = lower(&lead.industry) {
            if icp
                .industries
                .iter()
                .any(|target| industry.contains(target.as_str()) || target.contains(&industry))
            {
                matched += 1.0;
            }
        }
    }

    if !icp.technologies.is_empty() {
        dimensions += 1;
        let overlap = lead
            .technologies
            .iter()
            .filter(|tech| icp.technologies.contains(&tech.to_lowercase()))
            .count();
        matched += overlap as f64 / icp.technologies.len() as f64;
    }

    if !icp.locations.is_empty() {
        dimensions += 1;
        if let Some(location) = lower(&lead.location) {
            if icp
                .locations
                .iter()
                .any(|target| location.contains(target.as_str()))
            {
                matched += 1.0;
            }
        }
    }

    if dimensions == 0 {
        return 0.0;
    }
    (matched / f64::from(dimensions) * 100.0).clamp(0.0, 100.0)
}

/// Fixed points per buying-intent signal found in the captured content
pub fn intent_score(lead: &Lead) -> f64 {
    let mut content = String::new();
    for key in [
        signal_keys::PAGE_TITLE,
        signal_keys::META_DESCRIPTION,
        signal_keys::PAGE_TEXT,
        "description",
    ] {
        if let Some(text) = lead.raw_text(key) {
            content.push_str(&text.to_lowercase());
            content.push('\n');
        }
    }
    let source = lead.source_url.to_lowercase();

    let mut points = 0.0;
    for (name, value, phrases) in INTENT_SIGNALS {
        let present = phrases.iter().any(|phrase| content.contains(phrase))
            || (*name == "pricing" && source.contains("pricing"));
        if present {
            points += value;
        }
    }
    if !lead.raw_list("pain_points").is_empty() {
        points += PAIN_POINT_POINTS;
    }
    points.min(100.0)
}

/// Social presence plus how much of the site the crawl reached
pub fn engagement_score(lead: &Lead) -> f64 {
    let social: f64 = lead
        .social_profiles
        .keys()
        .map(|platform| {
            SOCIAL_POINTS
                .iter()
                .find(|(name, _)| name == platform)
                .map_or(OTHER_SOCIAL_POINTS, |(_, points)| *points)
        })
        .sum();

    let internal = lead.internal_links as f64 * POINTS_PER_INTERNAL_LINK;
    let depth = f64::from(lead.crawl_depth) * POINTS_PER_DEPTH;

    (social.min(SOCIAL_CAP) + internal.min(INTERNAL_LINK_CAP) + depth.min(DEPTH_CAP)).min(100.0)
}

/// Share of identifying fields that are filled in, scaled to 100
pub fn data_quality_score(lead: &Lead) -> f64 {
    let fields = [
        &lead.company_name,
        &lead.contact_email,
        &lead.contact_phone,
        &lead.website,
        &lead.industry,
        &lead.location,
    ];
    let filled = fields
        .iter()
        .filter(|field| field.as_deref().map_or(false, |v| !v.trim().is_empty()))
        .count();
    filled as f64 / fields.len() as f64 * 100.0
}

fn lower(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::SizeBucket;
    use serde_json::json;

    fn set(items: &[&str]) -> std::collections::BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn icp() -> IcpConfig {
        IcpConfig {
            company_sizes: set(&["51-200"]),
            industries: set(&["saas"]),
            technologies: set(&["react", "aws", "python"]),
            locations: set(&["united states"]),
        }
    }

    fn lead() -> Lead {
        Lead {
            company_size_bucket: SizeBucket::Medium,
            industry: Some("saas".to_string()),
            technologies: set(&["react", "aws"]),
            location: Some("united states".to_string()),
            ..Lead::default()
        }
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = ScoreWeights::default();
        assert!((weights.sum() - 1.0).abs() <= WEIGHT_TOLERANCE);
        assert!(ScoringEngine::with_weights(weights).is_ok());
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let weights = ScoreWeights {
            fit: 0.5,
            ..ScoreWeights::default()
        };
        assert!(matches!(
            ScoringEngine::with_weights(weights),
            Err(ConfigError::InvalidWeights { .. })
        ));

        let negative = ScoreWeights {
            fit: 0.55,
            intent: -0.2,
            engagement: 0.5,
            data_quality: 0.15,
        };
        assert!(ScoringEngine::with_weights(negative).is_err());
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(Grade::from_composite(100), Grade::APlus);
        assert_eq!(Grade::from_composite(90), Grade::APlus);
        assert_eq!(Grade::from_composite(89), Grade::A);
        assert_eq!(Grade::from_composite(80), Grade::A);
        assert_eq!(Grade::from_composite(70), Grade::B);
        assert_eq!(Grade::from_composite(60), Grade::C);
        assert_eq!(Grade::from_composite(50), Grade::D);
        assert_eq!(Grade::from_composite(49), Grade::F);
        assert_eq!(Grade::from_composite(0), Grade::F);
    }

    #[test]
    fn test_grade_bands_are_monotonic() {
        let grades: Vec<Grade> = (0..=100).map(Grade::from_composite).collect();
        assert!(grades.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn test_fit_with_partial_tech_overlap() {
        let fit = fit_score(&lead(), &icp());
        let expected = (3.0 + 2.0 / 3.0) / 4.0 * 100.0;
        assert!((fit - expected).abs() < 1e-9);
    }

    #[test]
    fn test_fit_excludes_unconfigured_dimensions() {
        let icp = IcpConfig {
            industries: set(&["saas"]),
            ..IcpConfig::default()
        };
        assert_eq!(fit_score(&lead(), &icp), 100.0);
        assert_eq!(fit_score(&lead(), &IcpConfig::default()), 0.0);
    }

    #[test]
    fn test_industry_matches_by_containment_either_way() {
        let b2b = IcpConfig {
            industries: set(&["b2b saas"]),
            ..IcpConfig::default()
        };
        assert_eq!(fit_score(&lead(), &b2b), 100.0);

        let broader = Lead {
            industry: Some("Vertical SaaS Platforms".to_string()),
            ..Lead::default()
        };
        assert_eq!(fit_score(&broader, &icp()), 100.0 / 4.0);

        let unrelated = Lead {
            industry: Some("retail".to_string()),
            ..Lead::default()
        };
        assert_eq!(fit_score(&unrelated, &b2b), 0.0);
    }

    #[test]
    fn test_location_matches_by_containment() {
        let lead = Lead {
            location: Some("Austin, United States".to_string()),
            ..Lead::default()
        };
        let icp = IcpConfig {
            locations: set(&["united states"]),
            ..IcpConfig::default()
        };
        assert_eq!(fit_score(&lead, &icp), 100.0);
    }

    #[test]
    fn test_intent_signals() {
        let mut lead = Lead {
            source_url: "https://acme.io/pricing".to_string(),
            ..Lead::default()
        };
        lead.raw_extracted_fields.insert(
            signal_keys::PAGE_TEXT.to_string(),
            json!("Book a demo today. We're hiring engineers!"),
        );
        lead.raw_extracted_fields
            .insert("pain_points".to_string(), json!(["manual reporting"]));

        assert_eq!(intent_score(&lead), 25.0 + 25.0 + 20.0 + 10.0);
        assert_eq!(intent_score(&Lead::default()), 0.0);
    }

    #[test]
    fn test_engagement_is_capped() {
        let mut lead = Lead {
            internal_links: 500,
            crawl_depth: 9,
            ..Lead::default()
        };
        for platform in ["linkedin", "twitter", "github", "youtube", "facebook"] {
            lead.social_profiles
                .insert(platform.to_string(), format!("https://{}.com/acme", platform));
        }
        assert_eq!(engagement_score(&lead), 100.0);
    }

    #[test]
    fn test_data_quality() {
        let lead = Lead {
            company_name: Some("Acme".to_string()),
            website: Some("https://acme.io".to_string()),
            contact_email: Some(" ".to_string()),
            ..Lead::default()
        };
        assert!((data_quality_score(&lead) - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_scenario_composite_is_reproducible() {
        let first = score(&lead(), &icp());
        let second = score(&lead(), &icp());

        assert_eq!(first, second);
        assert_eq!(first.fit.to_bits(), second.fit.to_bits());
        // 0.35 * 91.67 + 0.15 * 33.33
        assert_eq!(first.composite, 37);
        assert_eq!(first.grade, Grade::F);
    }

    #[test]
    fn test_composite_stays_in_range() {
        let mut best = lead();
        best.company_name = Some("Acme".to_string());
        best.contact_email = Some("sales@acme.io".to_string());
        best.contact_phone = Some("5550102030".to_string());
        best.website = Some("https://acme.io".to_string());
        best.technologies = set(&["react", "aws", "python"]);
        best.internal_links = 100;
        best.crawl_depth = 3;
        best.social_profiles
            .insert("linkedin".to_string(), "https://linkedin.com/company/acme".to_string());
        for platform in ["twitter", "github", "youtube"] {
            best.social_profiles
                .insert(platform.to_string(), format!("https://{}.com/acme", platform));
        }
        best.raw_extracted_fields
            .insert("pain_points".to_string(), json!(["slow onboarding"]));
        best.raw_extracted_fields.insert(
            signal_keys::PAGE_TEXT.to_string(),
            json!("pricing, request a demo, we raised a series a, careers"),
        );

        let top = score(&best, &icp());
        assert_eq!(top.composite, 100);
        assert_eq!(top.grade, Grade::APlus);

        let bottom = score(&Lead::default(), &IcpConfig::default());
        assert_eq!(bottom.composite, 0);
        assert_eq!(bottom.grade, Grade::F);
    }
}
