//! Outreach priority derived from the composite score

use crate::crawler::Lead;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Hot,
    Warm,
    Cool,
    Cold,
}

impl Priority {
    pub fn from_composite(composite: u8) -> Self {
        match composite {
            80.. => Self::Hot,
            60..=79 => Self::Warm,
            40..=59 => Self::Cool,
            _ => Self::Cold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Warm => "warm",
            Self::Cool => "cool",
            Self::Cold => "cold",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next step suggested for a lead
pub fn recommended_action(composite: u8, lead: &Lead) -> &'static str {
    match Priority::from_composite(composite) {
        Priority::Hot if lead.contact_phone.is_some() => "Call immediately - high priority lead",
        Priority::Hot => "Send personalized email within 24 hours",
        Priority::Warm => "Add to email nurture sequence",
        Priority::Cool => "Research further before outreach",
        Priority::Cold => "Low priority - monitor for changes",
    }
}
