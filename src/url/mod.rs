//! URL handling module for Leadscout
//!
//! This module provides URL normalization, visited-set keys, host extraction
//! and the same-domain policy check.

mod domain;
mod normalize;

pub use domain::{extract_domain, host_key, origin_of};
pub use normalize::{normalize_url, visit_key};

use url::Url;

/// Checks whether a candidate URL satisfies the same-domain policy
///
/// The candidate's host must exactly match the seed host (case-insensitive).
/// Subdomains are different hosts.
///
/// # Examples
///
/// ```
/// use leadscout::url::is_same_host;
/// use url::Url;
///
/// let seed = Url::parse("https://ex.com/").unwrap();
/// assert!(is_same_host(&seed, &Url::parse("https://EX.com/team").unwrap()));
/// assert!(!is_same_host(&seed, &Url::parse("https://blog.ex.com/").unwrap()));
/// ```
pub fn is_same_host(seed: &Url, candidate: &Url) -> bool {
    match (extract_domain(seed), extract_domain(candidate)) {
        (Some(a), Some(b)) => a == b && seed.port_or_known_default() == candidate.port_or_known_default(),
        _ => false,
    }
}
