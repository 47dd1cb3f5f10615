//! Configuration data model and validation

use crate::types::{Result, AppError, Target};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Targets to probe (hostnames or addresses)
    #[serde(default)]
    pub targets: Vec<String>,

    /// Number of probes per target
    #[serde(default = "default_sample_count")]
    pub sample_count: u32,

    /// Upper bound for a single probe
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_seconds: u64,

    /// Upper bound for the whole sampling phase; derived when unset
    #[serde(default)]
    pub sampling_deadline_seconds: Option<u64>,

    /// Upper bound for a single path trace
    #[serde(default = "default_trace_timeout_secs")]
    pub trace_timeout_seconds: u64,

    /// How many of the slowest reachable targets get a path trace (0 disables)
    #[serde(default = "default_diagnostics_count")]
    pub diagnostics_count: usize,

    /// Capacity of the shared sample stream
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Look up and display the caller's public addresses
    #[serde(default = "default_identity_lookup")]
    pub identity_lookup: bool,

    /// JSON endpoint reporting the caller's address in `ip_addr`
    #[serde(default = "default_identity_url")]
    pub identity_url: String,

    /// Emit the report as JSON instead of a table
    #[serde(default)]
    pub json_output: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            sample_count: default_sample_count(),
            probe_timeout_seconds: default_probe_timeout_secs(),
            sampling_deadline_seconds: None,
            trace_timeout_seconds: default_trace_timeout_secs(),
            diagnostics_count: default_diagnostics_count(),
            channel_capacity: default_channel_capacity(),
            identity_lookup: default_identity_lookup(),
            identity_url: default_identity_url(),
            json_output: false,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets as typed identifiers, in the order supplied
    pub fn targets(&self) -> Vec<Target> {
        self.targets.iter().map(|t| Target::new(t.as_str())).collect()
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    pub fn trace_timeout(&self) -> Duration {
        Duration::from_secs(self.trace_timeout_seconds)
    }

    /// Deadline for the whole sampling phase.
    ///
    /// Without an explicit value every worker gets enough time to run all of
    /// its probes back to back at the full probe timeout, plus some slack.
    pub fn sampling_deadline(&self) -> Duration {
        match self.sampling_deadline_seconds {
            Some(secs) => Duration::from_secs(secs),
            None => self.probe_timeout() * self.sample_count + crate::defaults::DEFAULT_DEADLINE_SLACK,
        }
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        for target in &self.targets {
            validate_target(target)?;
        }

        if self.sample_count == 0 {
            return Err(AppError::config("Sample count must be greater than 0"));
        }

        if self.sample_count > crate::defaults::MAX_SAMPLE_COUNT {
            return Err(AppError::config(format!(
                "Sample count cannot exceed {}",
                crate::defaults::MAX_SAMPLE_COUNT
            )));
        }

        if self.probe_timeout_seconds == 0 {
            return Err(AppError::config("Probe timeout must be greater than 0"));
        }

        if self.probe_timeout_seconds > crate::defaults::MAX_PROBE_TIMEOUT_SECS {
            return Err(AppError::config(format!(
                "Probe timeout cannot exceed {} seconds",
                crate::defaults::MAX_PROBE_TIMEOUT_SECS
            )));
        }

        if self.sampling_deadline_seconds == Some(0) {
            return Err(AppError::config("Sampling deadline must be greater than 0"));
        }

        if self.trace_timeout_seconds == 0 || self.trace_timeout_seconds > crate::defaults::MAX_TRACE_TIMEOUT_SECS {
            return Err(AppError::config(format!(
                "Trace timeout must be between 1 and {} seconds",
                crate::defaults::MAX_TRACE_TIMEOUT_SECS
            )));
        }

        if self.channel_capacity == 0 {
            return Err(AppError::config("Channel capacity must be greater than 0"));
        }

        if self.identity_lookup {
            match url::Url::parse(&self.identity_url) {
                Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
                Ok(_) => {
                    return Err(AppError::config(format!(
                        "Identity URL must use HTTP or HTTPS: {}",
                        self.identity_url
                    )));
                }
                Err(e) => {
                    return Err(AppError::config(format!(
                        "Invalid identity URL '{}': {}",
                        self.identity_url, e
                    )));
                }
            }
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(targets) = std::env::var("TARGETS") {
            self.targets = Target::parse_list(&targets)
                .into_iter()
                .map(|t| t.as_str().to_string())
                .collect();
        }

        if let Ok(count) = std::env::var("SAMPLE_COUNT") {
            self.sample_count = count.parse()
                .map_err(|e| AppError::config(format!("Invalid SAMPLE_COUNT value '{}': {}", count, e)))?;
        }

        if let Ok(timeout) = std::env::var("PROBE_TIMEOUT_SECONDS") {
            self.probe_timeout_seconds = timeout.parse()
                .map_err(|e| AppError::config(format!("Invalid PROBE_TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Ok(deadline) = std::env::var("SAMPLING_DEADLINE_SECONDS") {
            let secs = deadline.parse()
                .map_err(|e| AppError::config(format!("Invalid SAMPLING_DEADLINE_SECONDS value '{}': {}", deadline, e)))?;
            self.sampling_deadline_seconds = Some(secs);
        }

        if let Ok(timeout) = std::env::var("TRACE_TIMEOUT_SECONDS") {
            self.trace_timeout_seconds = timeout.parse()
                .map_err(|e| AppError::config(format!("Invalid TRACE_TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Ok(slowest) = std::env::var("SLOWEST_COUNT") {
            self.diagnostics_count = slowest.parse()
                .map_err(|e| AppError::config(format!("Invalid SLOWEST_COUNT value '{}': {}", slowest, e)))?;
        }

        if let Ok(lookup) = std::env::var("IDENTITY_LOOKUP") {
            self.identity_lookup = lookup.parse()
                .map_err(|e| AppError::config(format!("Invalid IDENTITY_LOOKUP value '{}': {}", lookup, e)))?;
        }

        if let Ok(url) = std::env::var("IDENTITY_URL") {
            self.identity_url = url.trim().to_string();
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

/// Check that a target is a syntactically valid address or hostname
pub fn validate_target(target: &str) -> Result<()> {
    if target.trim().is_empty() {
        return Err(AppError::config("Target cannot be empty"));
    }

    // Bare IPv6 literals are not accepted by the URL host parser
    if target.parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    // Leading dashes would be read as options by ping/traceroute
    if target.starts_with('-') {
        return Err(AppError::config(format!("Invalid target '{}': must not start with '-'", target)));
    }

    url::Host::parse(target)
        .map(|_| ())
        .map_err(|e| AppError::config(format!("Invalid target '{}': {}", target, e)))
}

// Default value functions for serde
fn default_sample_count() -> u32 {
    crate::defaults::DEFAULT_SAMPLE_COUNT
}

fn default_probe_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_PROBE_TIMEOUT.as_secs()
}

fn default_trace_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TRACE_TIMEOUT.as_secs()
}

fn default_diagnostics_count() -> usize {
    crate::defaults::DEFAULT_DIAGNOSTICS_COUNT
}

fn default_channel_capacity() -> usize {
    crate::defaults::DEFAULT_CHANNEL_CAPACITY
}

fn default_identity_lookup() -> bool {
    true
}

fn default_identity_url() -> String {
    crate::defaults::DEFAULT_IDENTITY_URL.to_string()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
