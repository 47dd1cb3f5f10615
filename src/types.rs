//! Type definitions and aliases

use std::fmt;
use std::time::Duration;
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// A network endpoint identified by hostname or address.
///
/// Targets are opaque to the probing core: no normalisation is applied and
/// duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    pub fn new<S: Into<String>>(identifier: S) -> Self {
        Self(identifier.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build targets from a comma-separated list, skipping blank entries
    pub fn parse_list(list: &str) -> Vec<Target> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Target::new)
            .collect()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Outcome classification of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeStatus {
    /// Probe returned a round-trip time
    Success,
    /// Probe process failed or produced unusable output
    Failed,
    /// Probe did not finish within the per-probe timeout
    Timeout,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        }
    }
}

/// Coarse latency classification used for report coloring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyClass {
    /// Below 50 ms
    Good,
    /// 50 ms up to 150 ms
    Moderate,
    /// 150 ms and above
    Poor,
}

impl LatencyClass {
    /// Classify a mean round-trip time
    pub fn from_duration(duration: Duration) -> Self {
        let ms = duration.as_secs_f64() * 1000.0;
        if ms < 50.0 {
            Self::Good
        } else if ms < 150.0 {
            Self::Moderate
        } else {
            Self::Poor
        }
    }
}
