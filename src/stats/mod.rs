//! Sample aggregation and ranking
//!
//! The [`Aggregator`] is the single consumer of the shared sample stream. It
//! is moved into one dedicated task that owns the per-target sample map
//! outright, so folding needs no locks. Once the stream closes the task
//! hands the aggregator back and means can be computed.

pub mod ranking;

pub use ranking::Ranking;

use crate::{
    models::{AggregateResult, Sample, SampleSet},
    types::Target,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};

/// One element of the shared sample stream
#[derive(Debug, Clone)]
pub struct SampleEvent {
    pub target: Target,
    pub sample: Sample,
}

impl SampleEvent {
    pub fn new(target: Target, sample: Sample) -> Self {
        Self { target, sample }
    }
}

/// Groups samples by target, preserving first-seen target order
#[derive(Debug, Default)]
pub struct Aggregator {
    order: Vec<Target>,
    index: HashMap<Target, usize>,
    sets: Vec<SampleSet>,
    received: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register targets so that each one is reported even if it never
    /// produces a sample. Duplicates collapse into one entry.
    pub fn with_targets(targets: &[Target]) -> Self {
        let mut aggregator = Self::new();
        for target in targets {
            aggregator.slot(target);
        }
        aggregator
    }

    fn slot(&mut self, target: &Target) -> usize {
        if let Some(&idx) = self.index.get(target) {
            return idx;
        }
        let idx = self.order.len();
        self.order.push(target.clone());
        self.sets.push(SampleSet::new());
        self.index.insert(target.clone(), idx);
        idx
    }

    /// Fold one sample into its target's set
    pub fn fold(&mut self, event: SampleEvent) {
        let idx = self.slot(&event.target);
        self.sets[idx].push(event.sample);
        self.received += 1;
    }

    /// Drain `receiver` until every sender is gone
    pub async fn drain(mut self, mut receiver: mpsc::Receiver<SampleEvent>) -> Self {
        while let Some(event) = receiver.recv().await {
            self.fold(event);
        }
        self
    }

    /// Move the aggregator into its own task draining `receiver`.
    ///
    /// The task finishes only after the stream is closed, i.e. after the
    /// last sender has been dropped.
    pub fn spawn(self, receiver: mpsc::Receiver<SampleEvent>) -> JoinHandle<Self> {
        tokio::spawn(self.drain(receiver))
    }

    /// Total number of samples folded so far
    pub fn received(&self) -> usize {
        self.received
    }

    pub fn target_count(&self) -> usize {
        self.order.len()
    }

    pub fn sample_set(&self, target: &Target) -> Option<&SampleSet> {
        self.index.get(target).map(|&idx| &self.sets[idx])
    }

    /// Per-target mean over successful samples, in first-seen order.
    ///
    /// A target without a successful sample gets `mean: None`.
    pub fn finish(&self) -> Vec<AggregateResult> {
        self.order
            .iter()
            .zip(&self.sets)
            .enumerate()
            .map(|(first_seen, (target, set))| AggregateResult {
                target: target.clone(),
                mean: mean_duration(&set.successful_rtts()),
                success_count: set.success_count(),
                failure_count: set.failure_count(),
                first_seen,
            })
            .collect()
    }

    /// Consume the aggregator, returning each target with its samples
    pub fn into_sample_sets(self) -> Vec<(Target, SampleSet)> {
        self.order.into_iter().zip(self.sets).collect()
    }
}

/// Arithmetic mean of `durations`, or `None` if there are none
pub fn mean_duration(durations: &[Duration]) -> Option<Duration> {
    if durations.is_empty() {
        return None;
    }
    let count = u32::try_from(durations.len()).ok()?;
    let total: Duration = durations.iter().sum();
    Some(total / count)
}
