//! Command-line interface module with topic help

pub mod help;

pub use help::HelpSystem;

use clap::{ArgAction, Parser};

/// Latency Prober - probe targets in parallel, rank them by mean latency
/// and trace the path to the slowest
#[derive(Parser, Debug, Clone)]
#[command(name = "lprobe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Targets to probe, comma-separated or repeated
    #[arg(short = 'a', long = "addresses", value_name = "HOST", value_delimiter = ',', action = ArgAction::Append)]
    pub addresses: Vec<String>,

    /// Number of probes per target
    #[arg(short, long, value_parser = parse_count)]
    pub count: Option<u32>,

    /// Timeout for one probe, in seconds
    #[arg(short, long, value_parser = parse_probe_timeout)]
    pub timeout: Option<u64>,

    /// Deadline for the whole sampling phase, in seconds
    #[arg(long, value_parser = parse_seconds)]
    pub deadline: Option<u64>,

    /// How many of the slowest reachable targets to trace (0 disables)
    #[arg(short = 'k', long = "slowest", value_name = "K")]
    pub slowest: Option<usize>,

    /// Timeout for one path trace, in seconds
    #[arg(long, value_parser = parse_seconds)]
    pub trace_timeout: Option<u64>,

    /// Endpoint used to look up the public addresses
    #[arg(long, value_name = "URL")]
    pub identity_url: Option<String>,

    /// Skip the public address lookup
    #[arg(long)]
    pub no_identity: bool,

    /// Skip path traces
    #[arg(long)]
    pub no_trace: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Show help for specific topic (config, examples, timeout, output, trace)
    #[arg(long, value_name = "TOPIC")]
    pub help_topic: Option<String>,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.json && self.verbose {
            return Err("--verbose has no effect with --json; the JSON report already lists every sample".to_string());
        }

        if self.no_trace && self.slowest.is_some_and(|k| k > 0) {
            return Err("Cannot specify both --no-trace and --slowest".to_string());
        }

        if self.no_identity && self.identity_url.is_some() {
            return Err("Cannot specify both --no-identity and --identity-url".to_string());
        }

        if let Some(address) = self.addresses.iter().find(|a| a.trim().is_empty()) {
            return Err(format!("Empty target in --addresses: '{}'", address));
        }

        Ok(())
    }

    /// Targets given on the command line, trimmed
    pub fn targets(&self) -> Vec<String> {
        self.addresses.iter().map(|a| a.trim().to_string()).collect()
    }

    /// Check if help should be displayed for a specific topic
    pub fn should_show_topic_help(&self) -> bool {
        self.help_topic.is_some()
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color || self.json {
            false
        } else {
            supports_color()
        }
    }

    /// Display help for the specified topic or main help
    pub fn display_help(&self) -> String {
        let help_system = HelpSystem::new();
        let use_colors = self.use_colors();

        if let Some(topic) = &self.help_topic {
            help_system.display_topic_help(topic, use_colors).unwrap_or_else(|| {
                format!(
                    "Unknown help topic: '{}'\n\nAvailable topics: {}\n\n{}",
                    topic,
                    help::HELP_TOPICS.join(", "),
                    help_system.display_main_help(use_colors)
                )
            })
        } else {
            help_system.display_main_help(use_colors)
        }
    }
}

fn parse_count(s: &str) -> Result<u32, String> {
    let count: u32 = s.parse().map_err(|_| format!("Invalid count: {}", s))?;
    if count == 0 || count > crate::defaults::MAX_SAMPLE_COUNT {
        return Err(format!("Count must be between 1 and {}", crate::defaults::MAX_SAMPLE_COUNT));
    }
    Ok(count)
}

fn parse_probe_timeout(s: &str) -> Result<u64, String> {
    let secs = parse_seconds(s)?;
    if secs > crate::defaults::MAX_PROBE_TIMEOUT_SECS {
        return Err(format!(
            "Timeout cannot exceed {} seconds",
            crate::defaults::MAX_PROBE_TIMEOUT_SECS
        ));
    }
    Ok(secs)
}

/// Parse a positive number of seconds
fn parse_seconds(s: &str) -> Result<u64, String> {
    // Reject strings with leading + sign or other invalid formats
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    let secs: u64 = s.parse().map_err(|_| format!("Invalid duration: {}", s))?;
    if secs == 0 {
        return Err("Duration must be greater than 0".to_string());
    }
    Ok(secs)
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}
