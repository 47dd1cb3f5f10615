//! Concurrent per-target sampling
//!
//! [`TargetSampler`] fans out one worker task per target. Every worker
//! performs its probes sequentially and pushes each result onto a shared
//! bounded stream, which a single aggregation task drains. The sampler only
//! reads the aggregated map after all workers have been joined and the
//! stream has been closed.
//!
//! Failure policy: a probe that fails or times out is recorded as a
//! `Failed` or `Timeout` sample and the worker carries on with its
//! remaining probes. One misbehaving target never stops the others.

use crate::{
    defaults,
    error::{AppError, Result},
    logging::ProbeLogger,
    models::{AggregateResult, Config, Sample, SampleSet},
    probe::Prober,
    stats::{Aggregator, SampleEvent},
    types::Target,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Probes per target
    pub sample_count: u32,
    /// Upper bound for a single probe
    pub probe_timeout: Duration,
    /// Upper bound for the whole sampling phase
    pub sampling_deadline: Duration,
    /// Capacity of the shared sample stream
    pub channel_capacity: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        let sample_count = defaults::DEFAULT_SAMPLE_COUNT;
        Self {
            sample_count,
            probe_timeout: defaults::DEFAULT_PROBE_TIMEOUT,
            sampling_deadline: defaults::DEFAULT_PROBE_TIMEOUT * sample_count
                + defaults::DEFAULT_DEADLINE_SLACK,
            channel_capacity: defaults::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl From<&Config> for SamplerConfig {
    fn from(config: &Config) -> Self {
        Self {
            sample_count: config.sample_count,
            probe_timeout: config.probe_timeout(),
            sampling_deadline: config.sampling_deadline(),
            channel_capacity: config.channel_capacity,
        }
    }
}

/// Counters describing one sampling phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingSummary {
    pub total_samples: usize,
    pub successful_samples: usize,
    pub failed_samples: usize,
    pub timed_out_samples: usize,
    pub duration: Duration,
    /// The phase deadline fired before every worker finished
    pub deadline_exceeded: bool,
    /// Targets whose workers were cancelled by the deadline
    pub aborted_targets: Vec<Target>,
}

impl SamplingSummary {
    fn from_sets(
        sets: &[(Target, SampleSet)],
        duration: Duration,
        aborted_targets: Vec<Target>,
    ) -> Self {
        let mut summary = Self {
            total_samples: 0,
            successful_samples: 0,
            failed_samples: 0,
            timed_out_samples: 0,
            duration,
            deadline_exceeded: !aborted_targets.is_empty(),
            aborted_targets,
        };

        for (_, set) in sets {
            let timeouts = set.timeout_count();
            summary.total_samples += set.len();
            summary.successful_samples += set.success_count();
            summary.timed_out_samples += timeouts;
            summary.failed_samples += set.failure_count() - timeouts;
        }

        summary
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_samples == 0 {
            0.0
        } else {
            self.successful_samples as f64 / self.total_samples as f64 * 100.0
        }
    }
}

/// Everything the sampling phase produced
#[derive(Debug, Clone)]
pub struct SamplingOutcome {
    /// One entry per distinct target, in first-seen order
    pub results: Vec<AggregateResult>,
    pub sample_sets: Vec<(Target, SampleSet)>,
    pub summary: SamplingSummary,
}

/// Runs a fixed number of probes against every target concurrently
pub struct TargetSampler {
    prober: Arc<dyn Prober>,
    config: SamplerConfig,
    logger: Option<Arc<ProbeLogger>>,
}

impl TargetSampler {
    pub fn new(prober: Arc<dyn Prober>, config: SamplerConfig) -> Self {
        Self {
            prober,
            config,
            logger: None,
        }
    }

    /// Log every sample and every aborted worker through `logger`
    pub fn with_logger(mut self, logger: ProbeLogger) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Sample every target and aggregate the results.
    ///
    /// Duplicate targets each get their own worker; their samples land in
    /// the same aggregate entry. Targets cut off by the sampling deadline
    /// are still reported, as unreachable if they produced no successful
    /// sample.
    pub async fn run(&self, targets: &[Target]) -> Result<SamplingOutcome> {
        if targets.is_empty() {
            return Err(AppError::NoTargetsSupplied);
        }

        let started = Instant::now();
        let (sender, receiver) = mpsc::channel(self.config.channel_capacity.max(1));
        let aggregation = Aggregator::with_targets(targets).spawn(receiver);

        let mut progress = Vec::with_capacity(targets.len());
        let mut handles = Vec::with_capacity(targets.len());
        for target in targets {
            let completed = Arc::new(AtomicUsize::new(0));
            let worker = SampleWorker {
                prober: Arc::clone(&self.prober),
                target: target.clone(),
                sample_count: self.config.sample_count,
                probe_timeout: self.config.probe_timeout,
                sender: sender.clone(),
                completed: Arc::clone(&completed),
                logger: self.logger.clone(),
            };
            progress.push(completed);
            handles.push(tokio::spawn(worker.run()));
        }

        let barrier = join_all(handles.iter_mut());
        let joined = tokio::time::timeout(self.config.sampling_deadline, barrier).await;
        let mut aborted = Vec::new();
        match joined {
            Ok(joined) => {
                for result in joined {
                    result?;
                }
            }
            Err(_) => {
                // Handles the barrier already drove to completion must not be
                // polled again, so only the cancelled ones are awaited below
                let mut cancelled = Vec::new();
                for (idx, handle) in handles.into_iter().enumerate() {
                    if handle.is_finished() {
                        continue;
                    }
                    handle.abort();
                    if !aborted.contains(&targets[idx]) {
                        aborted.push(targets[idx].clone());
                    }
                    if let Some(logger) = &self.logger {
                        logger
                            .log_worker_aborted(
                                &targets[idx],
                                progress[idx].load(Ordering::Relaxed),
                                self.config.sample_count,
                            )
                            .await;
                    }
                    cancelled.push(handle);
                }
                // Cancelled workers release their senders once they are dropped
                for handle in cancelled {
                    if let Err(e) = handle.await {
                        if e.is_panic() {
                            return Err(e.into());
                        }
                    }
                }
            }
        }

        drop(sender);
        let aggregator = aggregation.await?;

        let results = aggregator.finish();
        let sample_sets = aggregator.into_sample_sets();
        let summary = SamplingSummary::from_sets(&sample_sets, started.elapsed(), aborted);

        Ok(SamplingOutcome {
            results,
            sample_sets,
            summary,
        })
    }
}

/// State owned by one per-target worker task
struct SampleWorker {
    prober: Arc<dyn Prober>,
    target: Target,
    sample_count: u32,
    probe_timeout: Duration,
    sender: mpsc::Sender<SampleEvent>,
    completed: Arc<AtomicUsize>,
    logger: Option<Arc<ProbeLogger>>,
}

impl SampleWorker {
    async fn run(self) {
        for sequence in 1..=self.sample_count {
            let sample = self.sample_once(sequence).await;

            if let Some(logger) = &self.logger {
                logger.log_sample(&self.target, &sample).await;
            }

            // Only fails once the aggregation task is gone
            if self
                .sender
                .send(SampleEvent::new(self.target.clone(), sample))
                .await
                .is_err()
            {
                break;
            }
            self.completed.fetch_add(1, Ordering::Relaxed);
        }
    }

    async fn sample_once(&self, sequence: u32) -> Sample {
        match tokio::time::timeout(self.probe_timeout, self.prober.probe(&self.target)).await {
            Ok(Ok(rtt)) => Sample::success(sequence, rtt),
            Ok(Err(AppError::ProbeFailed { cause, .. })) => Sample::failed(sequence, cause),
            Ok(Err(other)) => Sample::failed(sequence, other.to_string()),
            Err(_) => Sample::timeout(sequence, self.probe_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{stats::Ranking, types::ProbeStatus};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicU32;

    /// Answers with a fixed latency per target, after sleeping for it
    struct FixedProber {
        latencies: HashMap<String, Duration>,
        calls: AtomicU32,
    }

    impl FixedProber {
        fn new(latencies: &[(&str, u64)]) -> Self {
            Self {
                latencies: latencies
                    .iter()
                    .map(|(t, ms)| (t.to_string(), Duration::from_millis(*ms)))
                    .collect(),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Prober for FixedProber {
        async fn probe(&self, target: &Target) -> Result<Duration> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.latencies.get(target.as_str()) {
                Some(rtt) => {
                    tokio::time::sleep(*rtt).await;
                    Ok(*rtt)
                }
                None => Err(AppError::probe_failed(target.as_str(), "host unreachable")),
            }
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// Fails every other probe
    struct FlakyProber {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Prober for FlakyProber {
        async fn probe(&self, target: &Target) -> Result<Duration> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 0 {
                Ok(Duration::from_millis(10))
            } else {
                Err(AppError::probe_failed(target.as_str(), "packet lost"))
            }
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    /// Never answers
    struct HangingProber;

    #[async_trait]
    impl Prober for HangingProber {
        async fn probe(&self, _target: &Target) -> Result<Duration> {
            std::future::pending::<()>().await;
            Ok(Duration::ZERO)
        }

        fn name(&self) -> &str {
            "hanging"
        }
    }

    fn config(sample_count: u32) -> SamplerConfig {
        SamplerConfig {
            sample_count,
            probe_timeout: Duration::from_secs(1),
            sampling_deadline: Duration::from_secs(10),
            channel_capacity: 4,
        }
    }

    fn targets(names: &[&str]) -> Vec<Target> {
        names.iter().map(|n| Target::new(*n)).collect()
    }

    #[tokio::test]
    async fn test_empty_targets_rejected() {
        let prober = Arc::new(FixedProber::new(&[]));
        let sampler = TargetSampler::new(prober.clone(), config(3));

        let err = sampler.run(&[]).await.unwrap_err();
        assert!(matches!(err, AppError::NoTargetsSupplied));
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exact_sample_counts() {
        let prober = Arc::new(FixedProber::new(&[("A", 3), ("B", 1), ("C", 2)]));
        let sampler = TargetSampler::new(prober.clone(), config(3));

        let outcome = sampler.run(&targets(&["A", "B", "C"])).await.unwrap();

        assert_eq!(outcome.results.len(), 3);
        for (_, set) in &outcome.sample_sets {
            assert_eq!(set.len(), 3);
        }
        assert_eq!(outcome.summary.total_samples, 9);
        assert_eq!(outcome.summary.successful_samples, 9);
        assert!(!outcome.summary.deadline_exceeded);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 9);

        let a = outcome.results.iter().find(|r| r.target.as_str() == "A").unwrap();
        assert_eq!(a.mean, Some(Duration::from_millis(3)));
    }

    #[tokio::test]
    async fn test_many_targets_no_lost_samples() {
        let names: Vec<String> = (0..50).map(|i| format!("host-{}", i)).collect();
        let latencies: Vec<(&str, u64)> = names.iter().map(|n| (n.as_str(), 1)).collect();
        let prober = Arc::new(FixedProber::new(&latencies));
        let sampler = TargetSampler::new(prober, config(10));

        let list: Vec<Target> = names.iter().map(|n| Target::new(n.as_str())).collect();
        let outcome = sampler.run(&list).await.unwrap();

        assert_eq!(outcome.summary.total_samples, 500);
        assert_eq!(outcome.results.len(), 50);
        for (_, set) in &outcome.sample_sets {
            let sequences: Vec<u32> = set.samples().iter().map(|s| s.sequence).collect();
            assert_eq!(sequences, (1..=10).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn test_failures_become_sentinels() {
        let prober = Arc::new(FlakyProber { calls: AtomicU32::new(0) });
        let sampler = TargetSampler::new(prober, config(4));

        let outcome = sampler.run(&targets(&["flaky"])).await.unwrap();
        let set = &outcome.sample_sets[0].1;

        assert_eq!(set.len(), 4);
        assert_eq!(set.success_count(), 2);
        assert_eq!(outcome.summary.failed_samples, 2);
        let failed = set.samples().iter().find(|s| s.status == ProbeStatus::Failed).unwrap();
        assert_eq!(failed.error_message.as_deref(), Some("packet lost"));
        assert_eq!(outcome.results[0].mean, Some(Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn test_unreachable_target_does_not_block_others() {
        let prober = Arc::new(FixedProber::new(&[("up", 2)]));
        let sampler = TargetSampler::new(prober, config(3));

        let outcome = sampler.run(&targets(&["down", "up"])).await.unwrap();

        let down = &outcome.results[0];
        assert_eq!(down.target.as_str(), "down");
        assert!(!down.is_reachable());
        assert_eq!(down.failure_count, 3);
        assert!(outcome.results[1].is_reachable());
    }

    #[tokio::test]
    async fn test_probe_timeout_becomes_sentinel() {
        let sampler = TargetSampler::new(
            Arc::new(HangingProber),
            SamplerConfig {
                sample_count: 2,
                probe_timeout: Duration::from_millis(20),
                sampling_deadline: Duration::from_secs(5),
                channel_capacity: 1,
            },
        );

        let outcome = sampler.run(&targets(&["silent"])).await.unwrap();

        assert_eq!(outcome.summary.timed_out_samples, 2);
        assert_eq!(outcome.summary.failed_samples, 0);
        assert!(!outcome.results[0].is_reachable());
    }

    #[tokio::test]
    async fn test_sampling_deadline_aborts_workers() {
        let prober = Arc::new(FixedProber::new(&[("fast", 1), ("slow", 200)]));
        let sampler = TargetSampler::new(
            prober,
            SamplerConfig {
                sample_count: 5,
                probe_timeout: Duration::from_secs(1),
                sampling_deadline: Duration::from_millis(100),
                channel_capacity: 8,
            },
        );

        let outcome = sampler.run(&targets(&["fast", "slow"])).await.unwrap();

        assert!(outcome.summary.deadline_exceeded);
        assert_eq!(outcome.summary.aborted_targets, vec![Target::new("slow")]);
        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results[0].is_reachable());
        let slow = &outcome.results[1];
        assert_eq!(slow.target.as_str(), "slow");
        assert!(!slow.is_reachable());
        assert_eq!(slow.total_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_targets_fold_together() {
        let prober = Arc::new(FixedProber::new(&[("dup", 1), ("other", 1)]));
        let sampler = TargetSampler::new(prober.clone(), config(2));

        let outcome = sampler.run(&targets(&["dup", "other", "dup"])).await.unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0].success_count, 4);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_repeated_runs_are_independent() {
        let prober = Arc::new(FixedProber::new(&[("A", 1)]));
        let sampler = TargetSampler::new(prober, config(3));

        let first = sampler.run(&targets(&["A"])).await.unwrap();
        let second = sampler.run(&targets(&["A"])).await.unwrap();

        assert_eq!(first.summary.total_samples, 3);
        assert_eq!(second.summary.total_samples, 3);
        assert_eq!(first.results[0].mean, second.results[0].mean);
    }

    #[tokio::test]
    async fn test_repeated_runs_rank_identically() {
        // "tie-a" and "tie-b" share a mean, "down" never answers
        let prober = Arc::new(FixedProber::new(&[("tie-a", 2), ("slow", 6), ("tie-b", 2)]));
        let sampler = TargetSampler::new(prober, config(3));
        let list = targets(&["slow", "tie-b", "down", "tie-a"]);

        let first = sampler.run(&list).await.unwrap();
        let second = sampler.run(&list).await.unwrap();

        assert_eq!(first.results, second.results);

        let first_ranking = Ranking::from_results(first.results);
        let second_ranking = Ranking::from_results(second.results);
        assert_eq!(first_ranking, second_ranking);

        let order: Vec<&str> = first_ranking.targets().iter().map(|t| t.as_str()).collect();
        assert_eq!(order, vec!["tie-b", "tie-a", "slow", "down"]);
    }

    #[tokio::test]
    async fn test_aborted_duplicate_listed_once() {
        let prober = Arc::new(FixedProber::new(&[("fast", 1), ("slow", 200)]));
        let sampler = TargetSampler::new(
            prober,
            SamplerConfig {
                sample_count: 5,
                probe_timeout: Duration::from_secs(1),
                sampling_deadline: Duration::from_millis(100),
                channel_capacity: 8,
            },
        );

        let outcome = sampler.run(&targets(&["slow", "fast", "slow"])).await.unwrap();

        assert!(outcome.summary.deadline_exceeded);
        assert_eq!(outcome.summary.aborted_targets, vec![Target::new("slow")]);
        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results[1].is_reachable());
    }

    #[test]
    fn test_sampler_config_from_config() {
        let config = Config {
            sample_count: 7,
            probe_timeout_seconds: 2,
            sampling_deadline_seconds: None,
            channel_capacity: 16,
            ..Default::default()
        };

        let sampler_config = SamplerConfig::from(&config);
        assert_eq!(sampler_config.sample_count, 7);
        assert_eq!(sampler_config.probe_timeout, Duration::from_secs(2));
        assert_eq!(sampler_config.sampling_deadline, Duration::from_secs(19));
        assert_eq!(sampler_config.channel_capacity, 16);
    }
}
