//! Configuration validation utilities and rules

use crate::{
    error::Result,
    models::Config,
};
use colored::Colorize;
use std::collections::HashSet;
use std::net::IpAddr;

/// Configuration validator with advanced validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration with comprehensive checks
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        // Basic validation (already done in Config::validate)
        config.validate()?;

        warnings.extend(Self::validate_targets(&config.targets));
        warnings.extend(Self::validate_sampling_settings(config));
        warnings.extend(Self::validate_diagnostics_settings(config));
        warnings.extend(Self::validate_identity_settings(config));

        Ok(warnings)
    }

    /// Duplicate, loopback and private targets
    fn validate_targets(targets: &[String]) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if targets.is_empty() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "No targets configured; supply them with --addresses or TARGETS".to_string(),
            ));
            return warnings;
        }

        let mut seen = HashSet::new();
        for target in targets {
            if !seen.insert(target.as_str()) {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("Target '{}' is listed more than once; its samples will be merged", target),
                ));
            }

            if let Ok(ip) = target.parse::<IpAddr>() {
                if ip.is_loopback() {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Info,
                        format!("Target {} is a loopback address", ip),
                    ));
                } else if Self::is_private(&ip) {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Info,
                        format!("Target {} is in a private range and only reachable locally", ip),
                    ));
                } else if ip.is_unspecified() || ip.is_multicast() {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Warning,
                        format!("Target {} is not a unicast address and will likely not answer", ip),
                    ));
                }
            } else if target.eq_ignore_ascii_case("localhost") {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Target '{}' resolves to a loopback address", target),
                ));
            }
        }

        warnings
    }

    /// Sample count, probe timeout and the sampling deadline
    fn validate_sampling_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.sample_count < 3 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Sample count of {} may not provide a reliable mean (recommended: >= 3)",
                    config.sample_count
                ),
            ));
        } else if config.sample_count > 50 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("High sample count of {} will increase execution time", config.sample_count),
            ));
        }

        if config.probe_timeout_seconds < 2 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Probe timeout of {}s may record distant targets as timed out",
                    config.probe_timeout_seconds
                ),
            ));
        }

        // Each worker probes sequentially, so one slow target needs count * timeout
        let worst_case = config.probe_timeout() * config.sample_count;
        if config.sampling_deadline() < worst_case {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Sampling deadline of {}s is shorter than the worst case of {}s per target; slow targets may be cut short",
                    config.sampling_deadline().as_secs(),
                    worst_case.as_secs()
                ),
            ));
        }

        let total_probes = config.targets.len() as u64 * u64::from(config.sample_count);
        if total_probes > 500 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Configuration will send {} probes in total", total_probes),
            ));
        }

        warnings
    }

    fn validate_diagnostics_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.diagnostics_count == 0 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "Path tracing is disabled".to_string(),
            ));
        } else if !config.targets.is_empty() && config.diagnostics_count > config.targets.len() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Slowest count of {} exceeds the {} configured targets; every reachable target will be traced",
                    config.diagnostics_count,
                    config.targets.len()
                ),
            ));
        }

        warnings
    }

    fn validate_identity_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.identity_lookup && config.identity_url.starts_with("http://") {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Identity endpoint {} is queried over plain HTTP", config.identity_url),
            ));
        }

        warnings
    }

    fn is_private(ip: &IpAddr) -> bool {
        match ip {
            IpAddr::V4(ipv4) => ipv4.is_private() || ipv4.is_link_local(),
            // fc00::/7 unique local, fe80::/10 link local
            IpAddr::V6(ipv6) => {
                let first = ipv6.segments()[0];
                (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
            }
        }
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    /// Get color for terminal display
    pub fn color(&self) -> &'static str {
        match self {
            Self::Info => "blue",
            Self::Warning => "yellow",
            Self::Error => "red",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        let tag = format!("[{}]", self.level.as_str());
        if use_color {
            format!("{} {}", tag.color(self.level.color()), self.message)
        } else {
            format!("{} {}", tag, self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
