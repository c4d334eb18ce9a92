//! Post-crawl lead pipeline
//!
//! Raw lead candidates go through the enricher and then the scoring engine;
//! the scored leads are handed to a `LeadSink`.

use crate::crawler::{CrawlReport, Lead};
use crate::enrich::enrich;
use crate::scoring::{recommended_action, IcpConfig, LeadScore, Priority, ScoreWeights, ScoringEngine};
use crate::storage::{LeadSink, RunSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// An enriched lead together with its score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLead {
    pub lead: Lead,
    pub score: LeadScore,
    pub priority: Priority,
    pub recommended_action: String,
    pub scored_at: DateTime<Utc>,
}

/// Enricher followed by the scoring engine
#[derive(Debug, Clone)]
pub struct LeadPipeline {
    engine: ScoringEngine,
    icp: IcpConfig,
}

impl LeadPipeline {
    /// Pipeline with the default weights, checked before any lead is scored
    pub fn new(icp: IcpConfig) -> crate::Result<Self> {
        Self::with_weights(icp, ScoreWeights::default())
    }

    /// Pipeline with custom weights; fails unless they sum to 1.0
    pub fn with_weights(icp: IcpConfig, weights: ScoreWeights) -> crate::Result<Self> {
        Ok(Self {
            engine: ScoringEngine::with_weights(weights)?,
            icp,
        })
    }

    pub fn icp(&self) -> &IcpConfig {
        &self.icp
    }

    /// Enriches and scores one lead
    pub fn process_one(&self, lead: Lead) -> ScoredLead {
        let lead = enrich(lead);
        let score = self.engine.score(&lead, &self.icp);
        ScoredLead {
            priority: Priority::from_composite(score.composite),
            recommended_action: recommended_action(score.composite, &lead).to_string(),
            score,
            lead,
            scored_at: Utc::now(),
        }
    }

    /// Enriches and scores leads, best composite first
    ///
    /// Ties keep their input order.
    pub fn process(&self, leads: Vec<Lead>) -> Vec<ScoredLead> {
        let mut scored: Vec<ScoredLead> = leads.into_iter().map(|lead| self.process_one(lead)).collect();
        scored.sort_by(|a, b| b.score.composite.cmp(&a.score.composite));
        scored
    }

    /// Scores the leads of a finished crawl and stores them in `sink`
    ///
    /// # Arguments
    ///
    /// * `report` - The finished crawl
    /// * `sink` - Receiver of the scored leads
    /// * `config_hash` - Hash of the configuration that produced the crawl
    ///
    /// # Returns
    ///
    /// * `Ok((run_id, leads))` - The run record id and the stored leads
    /// * `Err(LeadError::Storage)` - The sink rejected a write
    pub fn deliver(
        &self,
        report: &CrawlReport,
        sink: &mut dyn LeadSink,
        config_hash: &str,
    ) -> crate::Result<(i64, Vec<ScoredLead>)> {
        let scored = self.process(report.leads.clone());
        let run_id = sink.begin_run(config_hash, report.mode.name())?;

        for lead in &scored {
            sink.store_lead(run_id, lead)?;
        }

        sink.finish_run(
            run_id,
            &RunSummary {
                status: report.status,
                pages_fetched: report.fetched_count() as u64,
                pages_failed: report.failed_count() as u64,
                leads_found: scored.len() as u64,
            },
        )?;

        tracing::info!(
            run_id,
            leads = scored.len(),
            "Stored scored leads"
        );
        Ok((run_id, scored))
    }
}
