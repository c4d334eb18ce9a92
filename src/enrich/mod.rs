//! Lead enrichment
//!
//! `enrich` derives the attributes scoring relies on from fields already
//! captured during the crawl: technologies, the company size bucket and
//! normalized contact channels. It performs no I/O and never fails; inputs
//! that are missing leave the derived fields absent or `unknown`.

mod contact;
mod size;
mod tech;

pub use contact::{classify_social, normalize_email, normalize_phone};
pub use size::{bucket_for_headcount, size_bucket};
pub use tech::{detect_in_markup, detect_in_text};

use crate::crawler::Lead;

/// Fills derived attributes of a lead
pub fn enrich(mut lead: Lead) -> Lead {
    contact::normalize_contacts(&mut lead);
    tech::detect_technologies(&mut lead);
    size::assign_size_bucket(&mut lead);

    if let Some(location) = &lead.location {
        let trimmed = location.trim();
        lead.location = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    tracing::debug!(
        lead = %lead.id,
        size = %lead.company_size_bucket,
        technologies = lead.technologies.len(),
        social = lead.social_profiles.len(),
        "Enriched lead"
    );
    lead
}
