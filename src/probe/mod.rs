//! Round-trip latency probing
//!
//! A [`Prober`] performs exactly one measurement against one target. The
//! production implementation, [`SystemPing`], runs the platform `ping`
//! binary once per probe and extracts the reported round-trip time. There
//! are no retries: a failed probe is reported immediately and the caller
//! decides what to do with it.

pub mod platform;

use crate::{
    error::{AppError, Result},
    types::Target,
};
use async_trait::async_trait;
use regex::Regex;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::process::Command;

/// One latency measurement against one target
#[async_trait]
pub trait Prober: Send + Sync {
    /// Measure a single round trip.
    ///
    /// Returns `AppError::ProbeFailed` when the target does not answer or the
    /// probe mechanism itself fails.
    async fn probe(&self, target: &Target) -> Result<Duration>;

    /// Short name of the probe mechanism, for logs
    fn name(&self) -> &str;
}

/// Probe backed by the system `ping` binary
#[derive(Debug, Clone)]
pub struct SystemPing {
    program: String,
    wait: Duration,
}

impl SystemPing {
    /// Create a prober that asks `ping` to wait at most `wait` for a reply
    pub fn new(wait: Duration) -> Self {
        Self::with_program(platform::PING_PROGRAM, wait)
    }

    /// Use a different ping executable (e.g. `ping6` or an absolute path)
    pub fn with_program<S: Into<String>>(program: S, wait: Duration) -> Self {
        Self {
            program: program.into(),
            wait,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for a single-echo invocation against `target`
    pub fn command_args(&self, target: &Target) -> Vec<String> {
        platform::ping_args(target.as_str(), self.wait)
    }
}

#[async_trait]
impl Prober for SystemPing {
    async fn probe(&self, target: &Target) -> Result<Duration> {
        let output = Command::new(&self.program)
            .args(self.command_args(target))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::probe_failed(target.as_str(), format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            let cause = if detail.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                format!("{} exited with {}: {}", self.program, output.status, detail)
            };
            return Err(AppError::probe_failed(target.as_str(), cause));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ping_rtt(&stdout)
            .ok_or_else(|| AppError::probe_failed(target.as_str(), "no round-trip time in ping output"))
    }

    fn name(&self) -> &str {
        "ping"
    }
}

fn rtt_regex() -> &'static Regex {
    static RTT: OnceLock<Regex> = OnceLock::new();
    RTT.get_or_init(|| {
        Regex::new(r"time[=<]\s*([0-9]+(?:\.[0-9]+)?)\s*ms").expect("static regex is valid")
    })
}

/// Extract the first round-trip time from `ping` output.
///
/// Understands the Linux/BSD form `time=20.1 ms` and the Windows forms
/// `time=14ms` / `time<1ms`. Fractional milliseconds are kept to
/// microsecond precision.
pub fn parse_ping_rtt(output: &str) -> Option<Duration> {
    output.lines().find_map(|line| {
        let captures = rtt_regex().captures(line)?;
        let ms: f64 = captures.get(1)?.as_str().parse().ok()?;
        if !ms.is_finite() || ms < 0.0 {
            return None;
        }
        Some(Duration::from_micros((ms * 1000.0).round() as u64))
    })
}
