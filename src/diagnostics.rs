//! Path diagnostics for the slowest reachable targets
//!
//! After ranking, the slowest `k` reachable targets are handed to a
//! [`PathTracer`]. Each selected target is traced exactly once; the traces
//! run concurrently and their outcomes are returned in selection order.
//! A failed trace is reported alongside the others and never aborts the run.

use crate::{
    error::{AppError, Result},
    logging::ProbeLogger,
    probe::platform,
    stats::Ranking,
    types::Target,
};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Network path to one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathTrace {
    pub target: Target,
    /// Hop addresses in path order
    pub hops: Vec<String>,
    /// Unfiltered tool output
    pub raw_output: String,
    pub elapsed: Duration,
}

impl PathTrace {
    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }
}

/// Discovers the network path to a target
#[async_trait]
pub trait PathTracer: Send + Sync {
    async fn trace(&self, target: &Target) -> Result<PathTrace>;
}

/// Path tracer backed by the system `traceroute` (`tracert` on Windows)
#[derive(Debug, Clone)]
pub struct SystemTraceroute {
    program: String,
    timeout: Duration,
}

impl SystemTraceroute {
    pub fn new(timeout: Duration) -> Self {
        Self::with_program(platform::TRACE_PROGRAM, timeout)
    }

    pub fn with_program<S: Into<String>>(program: S, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl PathTracer for SystemTraceroute {
    async fn trace(&self, target: &Target) -> Result<PathTrace> {
        let started = Instant::now();
        let run = Command::new(&self.program)
            .args(platform::trace_args(target.as_str()))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                AppError::diagnostic_failed(
                    target.as_str(),
                    format!("{} timed out after {}s", self.program, self.timeout.as_secs()),
                )
            })?
            .map_err(|e| {
                AppError::diagnostic_failed(target.as_str(), format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::diagnostic_failed(
                target.as_str(),
                format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            ));
        }

        let raw_output = String::from_utf8_lossy(&output.stdout).into_owned();
        let hops = if cfg!(target_os = "windows") {
            extract_tracert_hops(&raw_output)
        } else {
            extract_hops(&raw_output)
        };

        Ok(PathTrace {
            target: target.clone(),
            hops,
            raw_output,
            elapsed: started.elapsed(),
        })
    }
}

/// Hop addresses from `traceroute` output.
///
/// Skips the header line and takes the second column of every other line.
/// Unanswered hops (`*`) and blank lines are dropped and consecutive
/// repeats collapse into one.
pub fn extract_hops(output: &str) -> Vec<String> {
    let mut hops: Vec<String> = Vec::new();
    for line in output.lines().skip(1) {
        let Some(hop) = line.split_whitespace().nth(1) else {
            continue;
        };
        if hop.contains('*') {
            continue;
        }
        if hops.last().map(String::as_str) != Some(hop) {
            hops.push(hop.to_string());
        }
    }
    hops
}

/// Hop addresses from Windows `tracert -d` output, where the address is
/// the last column of each numbered line
pub fn extract_tracert_hops(output: &str) -> Vec<String> {
    let mut hops: Vec<String> = Vec::new();
    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let numbered = fields.next().is_some_and(|f| f.parse::<u32>().is_ok());
        let Some(hop) = fields.last() else {
            continue;
        };
        if !numbered || hop.contains('*') || hop.ends_with('.') {
            continue;
        }
        if hops.last().map(String::as_str) != Some(hop) {
            hops.push(hop.to_string());
        }
    }
    hops
}

/// Result of tracing one selected target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticOutcome {
    pub target: Target,
    /// Mean latency that put the target among the slowest
    pub mean: Duration,
    pub result: std::result::Result<PathTrace, String>,
}

impl DiagnosticOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Selects the slowest reachable targets and traces them
pub struct DiagnosticsTrigger {
    tracer: Arc<dyn PathTracer>,
    logger: Option<ProbeLogger>,
}

impl DiagnosticsTrigger {
    pub fn new(tracer: Arc<dyn PathTracer>) -> Self {
        Self { tracer, logger: None }
    }

    pub fn with_logger(mut self, logger: ProbeLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Trace the `k` slowest reachable targets of `ranking`, slowest first.
    ///
    /// With fewer than `k` reachable targets all of them are traced;
    /// unreachable targets never are. `k == 0` traces nothing.
    pub async fn run(&self, ranking: &Ranking, k: usize) -> Vec<DiagnosticOutcome> {
        let selected = ranking.slowest(k);
        let traces = join_all(selected.iter().map(|entry| self.tracer.trace(&entry.target))).await;

        let mut outcomes = Vec::with_capacity(selected.len());
        for (entry, traced) in selected.into_iter().zip(traces) {
            let Some(mean) = entry.mean else {
                continue;
            };
            let result = traced.map_err(|e| match e {
                AppError::DiagnosticFailed { .. } => e.to_string(),
                other => AppError::diagnostic_failed(entry.target.as_str(), other.to_string()).to_string(),
            });

            if let Some(logger) = &self.logger {
                let hop_count = result.as_ref().ok().map(PathTrace::hop_count);
                logger
                    .log_trace(&entry.target, hop_count, result.as_ref().err().map(String::as_str))
                    .await;
            }

            outcomes.push(DiagnosticOutcome {
                target: entry.target.clone(),
                mean,
                result,
            });
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AggregateResult;
    use std::sync::Mutex;

    const LINUX_TRACEROUTE: &str = "\
traceroute to example.com (93.184.215.14), 30 hops max, 60 byte packets
 1  _gateway (192.168.1.1)  0.412 ms  0.380 ms  0.366 ms
 2  10.20.0.1 (10.20.0.1)  8.114 ms  8.101 ms  8.090 ms
 3  * * *
 4  10.20.0.1 (10.20.0.1)  9.001 ms  9.120 ms  9.002 ms
 5  93.184.215.14 (93.184.215.14)  20.101 ms  20.002 ms  19.988 ms

";

    const WINDOWS_TRACERT: &str = "\

Tracing route to 93.184.215.14 over a maximum of 30 hops

  1    <1 ms    <1 ms    <1 ms  192.168.1.1
  2     8 ms     8 ms     8 ms  10.20.0.1
  3     *        *        *     Request timed out.
  4    20 ms    20 ms    19 ms  93.184.215.14

Trace complete.
";

    /// Records every traced target; fails for targets in `failing`
    struct RecordingTracer {
        calls: Mutex<Vec<String>>,
        failing: Vec<String>,
    }

    impl RecordingTracer {
        fn new(failing: &[&str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failing: failing.iter().map(|s| s.to_string()).collect(),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PathTracer for RecordingTracer {
        async fn trace(&self, target: &Target) -> Result<PathTrace> {
            self.calls.lock().unwrap().push(target.to_string());
            if self.failing.iter().any(|f| f == target.as_str()) {
                return Err(AppError::diagnostic_failed(target.as_str(), "traceroute not installed"));
            }
            Ok(PathTrace {
                target: target.clone(),
                hops: vec!["192.0.2.1".to_string(), target.to_string()],
                raw_output: String::new(),
                elapsed: Duration::from_millis(1),
            })
        }
    }

    fn ranking(entries: &[(&str, Option<u64>)]) -> Ranking {
        Ranking::from_results(
            entries
                .iter()
                .enumerate()
                .map(|(i, (name, mean))| AggregateResult {
                    target: Target::new(*name),
                    mean: mean.map(Duration::from_millis),
                    success_count: usize::from(mean.is_some()),
                    failure_count: usize::from(mean.is_none()),
                    first_seen: i,
                })
                .collect(),
        )
    }

    #[test]
    fn test_extract_hops_linux() {
        assert_eq!(
            extract_hops(LINUX_TRACEROUTE),
            vec!["_gateway", "10.20.0.1", "93.184.215.14"]
        );
    }

    #[test]
    fn test_extract_hops_collapses_only_consecutive_repeats() {
        let output = "header\n 1 a\n 2 a\n 3 b\n 4 a\n";
        assert_eq!(extract_hops(output), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_extract_tracert_hops() {
        assert_eq!(
            extract_tracert_hops(WINDOWS_TRACERT),
            vec!["192.168.1.1", "10.20.0.1", "93.184.215.14"]
        );
    }

    #[test]
    fn test_extract_hops_empty() {
        assert!(extract_hops("").is_empty());
        assert!(extract_hops("traceroute to x\n").is_empty());
    }

    #[tokio::test]
    async fn test_traces_two_slowest_once_each() {
        let tracer = Arc::new(RecordingTracer::new(&[]));
        let trigger = DiagnosticsTrigger::new(tracer.clone());
        let ranking = ranking(&[("A", Some(30)), ("B", Some(10)), ("C", Some(20)), ("D", None)]);

        let outcomes = trigger.run(&ranking, 2).await;

        assert_eq!(tracer.calls().len(), 2);
        let traced: Vec<&str> = outcomes.iter().map(|o| o.target.as_str()).collect();
        assert_eq!(traced, vec!["A", "C"]);
        assert_eq!(outcomes[0].mean, Duration::from_millis(30));
        assert!(outcomes.iter().all(DiagnosticOutcome::is_success));
    }

    #[tokio::test]
    async fn test_unreachable_never_traced() {
        let tracer = Arc::new(RecordingTracer::new(&[]));
        let trigger = DiagnosticsTrigger::new(tracer.clone());
        let ranking = ranking(&[("only", Some(5)), ("down1", None), ("down2", None)]);

        let outcomes = trigger.run(&ranking, 2).await;

        assert_eq!(tracer.calls(), vec!["only".to_string()]);
        assert_eq!(outcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_reachable_or_k_zero() {
        let tracer = Arc::new(RecordingTracer::new(&[]));
        let trigger = DiagnosticsTrigger::new(tracer.clone());

        assert!(trigger.run(&ranking(&[("down", None)]), 2).await.is_empty());
        assert!(trigger.run(&ranking(&[("up", Some(1))]), 0).await.is_empty());
        assert!(tracer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_trace_is_reported_not_fatal() {
        let tracer = Arc::new(RecordingTracer::new(&["A"]));
        let trigger = DiagnosticsTrigger::new(tracer);
        let ranking = ranking(&[("A", Some(30)), ("C", Some(20))]);

        let outcomes = trigger.run(&ranking, 2).await;

        assert_eq!(outcomes.len(), 2);
        let err = outcomes[0].result.as_ref().unwrap_err();
        assert!(err.contains("traceroute not installed"));
        assert!(outcomes[1].is_success());
    }

    #[tokio::test]
    async fn test_missing_traceroute_binary() {
        let tracer = SystemTraceroute::with_program("no-such-traceroute-binary", Duration::from_secs(1));
        let err = tracer.trace(&Target::new("127.0.0.1")).await.unwrap_err();
        assert!(matches!(err, AppError::DiagnosticFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_trace_timeout() {
        // `sleep 5` never finishes within the limit
        let tracer = SystemTraceroute::with_program("sleep", Duration::from_millis(50));
        let err = tracer.trace(&Target::new("5")).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
