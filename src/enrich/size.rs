//! Company size bucketing from free-text descriptors
//!
//! Descriptors like "51-200 employees", "about 120 people", "500+" or
//! "over 1,000 staff" are reduced to a headcount and placed into the fixed
//! buckets {1-10, 11-50, 51-200, 201-500, 500+}. Ranges are placed by their
//! lower bound. A number followed by a word like "employees" wins over other
//! numbers in the text, and bare years are never read as a headcount.

use crate::crawler::{Lead, SizeBucket};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static HEADCOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(over|more than|above)?\s*(\d[\d,]*)\s*(k\b)?\s*(\+)?(?:\s*(?:-|–|to)\s*\d[\d,]*\s*(?:k\b)?\s*\+?)?\s*(employees?|people|staff|persons|workers|headcount)?",
    )
    .expect("headcount regex is hardcoded and valid")
});

/// One number found in a descriptor
struct Candidate {
    headcount: u64,
    /// Directly followed by a staff word such as "employees"
    labelled: bool,
    /// Four plain digits in 1900..=2099
    year_like: bool,
}

/// Raw fields that may describe the company size, in priority order
const SIZE_FIELDS: &[&str] = &["company_size", "employee_count", "employees"];

/// Places a headcount into its bucket
pub fn bucket_for_headcount(headcount: u64) -> SizeBucket {
    match headcount {
        0 => SizeBucket::Unknown,
        1..=10 => SizeBucket::Micro,
        11..=50 => SizeBucket::Small,
        51..=200 => SizeBucket::Medium,
        201..=500 => SizeBucket::Large,
        _ => SizeBucket::Enterprise,
    }
}

/// Buckets a free-text size descriptor; no recognizable headcount is `Unknown`
pub fn size_bucket(descriptor: &str) -> SizeBucket {
    if let Some(bucket) = SizeBucket::from_label(descriptor) {
        return bucket;
    }

    let candidates: Vec<Candidate> = HEADCOUNT
        .captures_iter(descriptor)
        .filter_map(|caps| {
            let digits = &caps[2];
            let mut headcount = digits.replace(',', "").parse::<u64>().ok()?;
            let scaled = caps.get(3).is_some();
            let above = caps.get(1).is_some() || caps.get(4).is_some();
            let year_like = !scaled
                && !above
                && digits.len() == 4
                && (1900..=2099).contains(&headcount);
            if scaled {
                headcount = headcount.saturating_mul(1000);
            }
            // "500+" and "over 500" lie above the bound they name
            if above {
                headcount = headcount.saturating_add(1);
            }
            Some(Candidate {
                headcount,
                labelled: caps.get(5).is_some(),
                year_like,
            })
        })
        .collect();

    candidates
        .iter()
        .find(|candidate| candidate.labelled)
        .or_else(|| candidates.iter().find(|candidate| !candidate.year_like))
        .map(|candidate| bucket_for_headcount(candidate.headcount))
        .unwrap_or(SizeBucket::Unknown)
}

pub(crate) fn assign_size_bucket(lead: &mut Lead) {
    if lead.company_size_bucket.is_known() {
        return;
    }

    let descriptor = SIZE_FIELDS.iter().find_map(|key| {
        match lead.raw_extracted_fields.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    });

    lead.company_size_bucket = descriptor
        .as_deref()
        .map(size_bucket)
        .unwrap_or(SizeBucket::Unknown);
}
