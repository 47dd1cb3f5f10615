//! Performance benchmarks for the latency prober
//!
//! Covers the hot paths that do not touch the network: folding samples,
//! ranking, parsing tool output and the sampling fan-out with an instant
//! prober.

use async_trait::async_trait;
use clap::Parser;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use latency_prober::{
    cli::Cli,
    config::validate_config,
    diagnostics::extract_hops,
    error::Result,
    executor::{SamplerConfig, TargetSampler},
    models::{AggregateResult, Config, Sample},
    probe::{parse_ping_rtt, Prober},
    stats::{Aggregator, Ranking, SampleEvent},
    types::Target,
};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

const PING_OUTPUT: &str = "\
PING example.com (93.184.215.14) 56(84) bytes of data.
64 bytes from 93.184.215.14 (93.184.215.14): icmp_seq=1 ttl=56 time=20.1 ms

--- example.com ping statistics ---
1 packets transmitted, 1 received, 0% packet loss, time 0ms
rtt min/avg/max/mdev = 20.100/20.100/20.100/0.000 ms
";

const TRACEROUTE_OUTPUT: &str = "\
traceroute to example.com (93.184.215.14), 30 hops max, 60 byte packets
 1  _gateway (192.168.1.1)  0.412 ms  0.380 ms  0.366 ms
 2  10.20.0.1 (10.20.0.1)  8.114 ms  8.101 ms  8.090 ms
 3  * * *
 4  172.16.4.9 (172.16.4.9)  9.001 ms  9.120 ms  9.002 ms
 5  93.184.215.14 (93.184.215.14)  20.101 ms  20.002 ms  19.988 ms
";

/// Answers immediately with a latency derived from the target name
struct InstantProber;

#[async_trait]
impl Prober for InstantProber {
    async fn probe(&self, target: &Target) -> Result<Duration> {
        Ok(Duration::from_micros(target.as_str().len() as u64 * 100))
    }

    fn name(&self) -> &str {
        "instant"
    }
}

fn create_targets(count: usize) -> Vec<Target> {
    (0..count).map(|i| Target::new(format!("host{}.example", i))).collect()
}

/// Every tenth sample fails
fn create_events(targets: &[Target], samples_per_target: u32) -> Vec<SampleEvent> {
    let mut events = Vec::new();
    for sequence in 1..=samples_per_target {
        for (i, target) in targets.iter().enumerate() {
            let sample = if (i + sequence as usize) % 10 == 0 {
                Sample::failed(sequence, "no reply".to_string())
            } else {
                Sample::success(sequence, Duration::from_micros(1_000 + (i as u64 * 37) % 50_000))
            };
            events.push(SampleEvent::new(target.clone(), sample));
        }
    }
    events
}

fn create_results(count: usize) -> Vec<AggregateResult> {
    (0..count)
        .map(|i| AggregateResult {
            target: Target::new(format!("host{}.example", i)),
            mean: (i % 7 != 0).then(|| Duration::from_micros((i as u64 * 7919) % 100_000)),
            success_count: 3,
            failure_count: 0,
            first_seen: i,
        })
        .collect()
}

/// Benchmark folding samples and computing means
fn benchmark_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    for size in [10, 100, 1000].iter() {
        let targets = create_targets(*size);
        let events = create_events(&targets, 10);

        group.bench_with_input(BenchmarkId::new("fold_and_finish", size), size, |b, _| {
            b.iter(|| {
                let mut aggregator = Aggregator::with_targets(&targets);
                for event in events.iter().cloned() {
                    aggregator.fold(event);
                }
                black_box(aggregator.finish());
            });
        });
    }

    group.finish();
}

/// Benchmark ranking and slowest-target selection
fn benchmark_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");

    for size in [10, 100, 1000].iter() {
        let results = create_results(*size);

        group.bench_with_input(BenchmarkId::new("from_results", size), size, |b, _| {
            b.iter(|| black_box(Ranking::from_results(black_box(results.clone()))));
        });

        let ranking = Ranking::from_results(results.clone());
        group.bench_with_input(BenchmarkId::new("slowest_two", size), size, |b, _| {
            b.iter(|| black_box(ranking.slowest(black_box(2)).len()));
        });
    }

    group.finish();
}

/// Benchmark parsing of ping and traceroute output
fn benchmark_output_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("output_parsing");

    group.bench_function("parse_ping_rtt", |b| {
        b.iter(|| black_box(parse_ping_rtt(black_box(PING_OUTPUT))));
    });

    group.bench_function("extract_hops", |b| {
        b.iter(|| black_box(extract_hops(black_box(TRACEROUTE_OUTPUT))));
    });

    group.finish();
}

/// Benchmark CLI parsing and configuration validation
fn benchmark_config_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_parsing");

    group.bench_function("parse_cli_args", |b| {
        b.iter(|| {
            let cli = Cli::parse_from(black_box([
                "lprobe",
                "-a", "1.1.1.1,8.8.8.8,example.com",
                "--count", "5",
                "--timeout", "2",
            ]));
            black_box(cli);
        });
    });

    let config = Config {
        targets: (0..50).map(|i| format!("host{}.example", i)).collect(),
        ..Default::default()
    };
    group.bench_function("validate_config", |b| {
        b.iter(|| black_box(validate_config(black_box(&config)).is_ok()));
    });

    group.finish();
}

/// Benchmark the sampling fan-out with a prober that never waits
fn benchmark_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling");
    group.sample_size(10);

    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let sampler = TargetSampler::new(
        Arc::new(InstantProber),
        SamplerConfig {
            sample_count: 10,
            probe_timeout: Duration::from_secs(1),
            sampling_deadline: Duration::from_secs(30),
            channel_capacity: 64,
        },
    );

    for size in [10, 50, 200].iter() {
        let targets = create_targets(*size);
        group.bench_with_input(BenchmarkId::new("run", size), size, |b, _| {
            b.iter(|| {
                let outcome = runtime.block_on(sampler.run(&targets)).expect("sampling");
                black_box(outcome.summary.total_samples);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_aggregation,
    benchmark_ranking,
    benchmark_output_parsing,
    benchmark_config_parsing,
    benchmark_sampling
);

criterion_main!(benches);
