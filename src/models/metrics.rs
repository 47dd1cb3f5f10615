//! Sample and aggregate data models

use crate::types::{AppError, LatencyClass, ProbeStatus, Result, Target};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use chrono::{DateTime, Utc};

/// Outcome of a single probe against one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Round-trip time; only present on success
    pub rtt: Option<Duration>,

    /// Probe outcome
    pub status: ProbeStatus,

    /// 1-based index of the probe within its worker
    pub sequence: u32,

    /// When the probe finished
    pub timestamp: DateTime<Utc>,

    /// Error message if the probe failed
    pub error_message: Option<String>,
}

impl Sample {
    /// Create a successful sample
    pub fn success(sequence: u32, rtt: Duration) -> Self {
        Self {
            rtt: Some(rtt),
            status: ProbeStatus::Success,
            sequence,
            timestamp: Utc::now(),
            error_message: None,
        }
    }

    /// Create a failure sentinel
    pub fn failed(sequence: u32, error_message: String) -> Self {
        Self {
            rtt: None,
            status: ProbeStatus::Failed,
            sequence,
            timestamp: Utc::now(),
            error_message: Some(error_message),
        }
    }

    /// Create a timeout sentinel
    pub fn timeout(sequence: u32, limit: Duration) -> Self {
        Self {
            rtt: None,
            status: ProbeStatus::Timeout,
            sequence,
            timestamp: Utc::now(),
            error_message: Some(format!("Probe timed out after {}ms", limit.as_millis())),
        }
    }

    pub fn is_successful(&self) -> bool {
        matches!(self.status, ProbeStatus::Success) && self.rtt.is_some()
    }

    pub fn rtt_ms(&self) -> Option<f64> {
        self.rtt.map(|d| d.as_secs_f64() * 1000.0)
    }
}

/// Samples collected for one target, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Round-trip times of the successful samples, in arrival order
    pub fn successful_rtts(&self) -> Vec<Duration> {
        self.samples
            .iter()
            .filter(|s| s.is_successful())
            .filter_map(|s| s.rtt)
            .collect()
    }

    pub fn success_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_successful()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.samples.len() - self.success_count()
    }

    pub fn timeout_count(&self) -> usize {
        self.samples
            .iter()
            .filter(|s| matches!(s.status, ProbeStatus::Timeout))
            .count()
    }
}

/// Mean latency summary for one target.
///
/// `mean` is `None` when the target produced no successful sample; such a
/// target is reported as unreachable and never carries a numeric mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub target: Target,
    pub mean: Option<Duration>,
    pub success_count: usize,
    pub failure_count: usize,
    /// Position of the target in aggregation order; used as ranking tie-break
    pub first_seen: usize,
}

impl AggregateResult {
    pub fn is_reachable(&self) -> bool {
        self.mean.is_some()
    }

    pub fn mean_ms(&self) -> Option<f64> {
        self.mean.map(|d| d.as_secs_f64() * 1000.0)
    }

    /// The mean, or `AllSamplesFailed` for an unreachable target
    pub fn require_mean(&self) -> Result<Duration> {
        self.mean
            .ok_or_else(|| AppError::all_samples_failed(self.target.as_str()))
    }

    pub fn total_count(&self) -> usize {
        self.success_count + self.failure_count
    }

    pub fn latency_class(&self) -> Option<LatencyClass> {
        self.mean.map(LatencyClass::from_duration)
    }

    /// Format the mean for display, e.g. `20.125ms`
    pub fn format_mean(&self) -> String {
        match self.mean_ms() {
            Some(ms) => format!("{:.3}ms", ms),
            None => "unreachable".to_string(),
        }
    }
}
