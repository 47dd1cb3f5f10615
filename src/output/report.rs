//! Report data handed to the formatters

use crate::{
    diagnostics::DiagnosticOutcome,
    error::Result,
    executor::{SamplingOutcome, SamplingSummary},
    identity::IdentityOutcome,
    models::{AggregateResult, SampleSet},
    stats::Ranking,
    types::Target,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw samples of one target, for verbose and JSON output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSamples {
    pub target: Target,
    pub samples: SampleSet,
}

/// Complete result of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyReport {
    pub generated_at: DateTime<Utc>,
    pub sample_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<IdentityOutcome>,
    pub ranking: Ranking,
    pub summary: SamplingSummary,
    #[serde(default)]
    pub diagnostics: Vec<DiagnosticOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<TargetSamples>,
}

impl LatencyReport {
    pub fn new(ranking: Ranking, summary: SamplingSummary, sample_count: u32) -> Self {
        Self {
            generated_at: Utc::now(),
            sample_count,
            identities: Vec::new(),
            ranking,
            summary,
            diagnostics: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Rank a sampling outcome, keeping its raw samples
    pub fn from_outcome(outcome: SamplingOutcome, sample_count: u32) -> Self {
        let samples = outcome
            .sample_sets
            .into_iter()
            .map(|(target, samples)| TargetSamples { target, samples })
            .collect();

        Self {
            samples,
            ..Self::new(Ranking::from_results(outcome.results), outcome.summary, sample_count)
        }
    }

    pub fn with_identities(mut self, identities: Vec<IdentityOutcome>) -> Self {
        self.identities = identities;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<DiagnosticOutcome>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Slowest reachable target
    pub fn slowest(&self) -> Option<&AggregateResult> {
        self.ranking.slowest(1).into_iter().next()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
