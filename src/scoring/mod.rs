//! Lead scoring against an ideal customer profile
//!
//! Scores are pure functions of a lead and a profile; they are safe to compute
//! from any number of concurrent callers.

mod engine;
mod icp;
mod priority;

pub use engine::{
    data_quality_score, engagement_score, fit_score, intent_score, score, Grade, LeadScore,
    ScoreWeights, ScoringEngine,
};
pub use icp::IcpConfig;
pub use priority::{recommended_action, Priority};
