//! Ordering targets by mean latency

use crate::{models::AggregateResult, types::Target};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Aggregate results sorted ascending by mean latency.
///
/// Equal means keep their first-seen aggregation order. Unreachable targets
/// come after every reachable one, also in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ranking {
    entries: Vec<AggregateResult>,
}

fn compare(a: &AggregateResult, b: &AggregateResult) -> Ordering {
    match (a.mean, b.mean) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.first_seen.cmp(&b.first_seen)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.first_seen.cmp(&b.first_seen),
    }
}

impl Ranking {
    pub fn from_results(mut results: Vec<AggregateResult>) -> Self {
        results.sort_by(compare);
        Self { entries: results }
    }

    pub fn entries(&self) -> &[AggregateResult] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<AggregateResult> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn targets(&self) -> Vec<&Target> {
        self.entries.iter().map(|e| &e.target).collect()
    }

    pub fn reachable(&self) -> impl Iterator<Item = &AggregateResult> {
        self.entries.iter().filter(|e| e.is_reachable())
    }

    pub fn unreachable(&self) -> impl Iterator<Item = &AggregateResult> {
        self.entries.iter().filter(|e| !e.is_reachable())
    }

    pub fn reachable_count(&self) -> usize {
        self.reachable().count()
    }

    pub fn fastest(&self) -> Option<&AggregateResult> {
        self.reachable().next()
    }

    /// The `k` slowest reachable targets, slowest first.
    ///
    /// Returns fewer than `k` entries when fewer targets are reachable, and
    /// never includes an unreachable target.
    pub fn slowest(&self, k: usize) -> Vec<&AggregateResult> {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.is_reachable())
            .take(k)
            .collect()
    }
}
