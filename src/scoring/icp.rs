//! Ideal customer profile

use serde::Deserialize;
use std::collections::BTreeSet;

/// Target criteria used by the fit sub-score
///
/// Every set is matched case-insensitively; an empty set means the dimension
/// is not part of the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IcpConfig {
    /// Size bucket labels such as "51-200"
    #[serde(default)]
    pub company_sizes: BTreeSet<String>,
    #[serde(default)]
    pub industries: BTreeSet<String>,
    #[serde(default)]
    pub technologies: BTreeSet<String>,
    #[serde(default)]
    pub locations: BTreeSet<String>,
}

impl IcpConfig {
    /// Returns a copy with every entry trimmed and lowercased
    pub fn normalized(self) -> Self {
        Self {
            company_sizes: normalize_set(self.company_sizes),
            industries: normalize_set(self.industries),
            technologies: normalize_set(self.technologies),
            locations: normalize_set(self.locations),
        }
    }

    /// True when no dimension is configured
    pub fn is_empty(&self) -> bool {
        self.company_sizes.is_empty()
            && self.industries.is_empty()
            && self.technologies.is_empty()
            && self.locations.is_empty()
    }
}

fn normalize_set(values: BTreeSet<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}
