//! Error handling for the latency prober

use thiserror::Error;

/// Custom error types for the latency prober
#[derive(Error, Debug)]
pub enum AppError {
    /// A single probe could not produce a sample
    #[error("Probe failed for {target}: {cause}")]
    ProbeFailed { target: String, cause: String },

    /// Every sample for a target failed, so it has no mean latency
    #[error("All samples failed for {target}: target is unreachable")]
    AllSamplesFailed { target: String },

    /// Path trace invocation failed
    #[error("Path trace failed for {target}: {cause}")]
    DiagnosticFailed { target: String, cause: String },

    /// The caller supplied an empty target list
    #[error("No targets supplied: specify at least one address with --addresses")]
    NoTargetsSupplied,

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Identity lookup transport errors
    #[error("Network error: {0}")]
    Network(String),

    /// Reverse DNS resolution errors
    #[error("DNS resolution error: {0}")]
    DnsResolution(String),

    /// Timeout errors (probe, trace or sampling phase)
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (process spawning, files)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (numbers, JSON, hosts)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new probe failure for a target
    pub fn probe_failed<T: Into<String>, C: Into<String>>(target: T, cause: C) -> Self {
        Self::ProbeFailed { target: target.into(), cause: cause.into() }
    }

    /// Create a new all-samples-failed error for a target
    pub fn all_samples_failed<T: Into<String>>(target: T) -> Self {
        Self::AllSamplesFailed { target: target.into() }
    }

    /// Create a new diagnostic failure for a target
    pub fn diagnostic_failed<T: Into<String>, C: Into<String>>(target: T, cause: C) -> Self {
        Self::DiagnosticFailed { target: target.into(), cause: cause.into() }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new DNS resolution error
    pub fn dns_resolution<S: Into<String>>(message: S) -> Self {
        Self::DnsResolution(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::ProbeFailed { .. } => "PROBE",
            Self::AllSamplesFailed { .. } => "UNREACHABLE",
            Self::DiagnosticFailed { .. } => "TRACE",
            Self::NoTargetsSupplied => "INPUT",
            Self::Config(_) => "CONFIG",
            Self::Network(_) => "NETWORK",
            Self::DnsResolution(_) => "DNS",
            Self::Timeout(_) => "TIMEOUT",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is recoverable (a later attempt may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ProbeFailed { .. } | Self::DiagnosticFailed { .. } => true,
            Self::Network(_) | Self::Timeout(_) | Self::DnsResolution(_) => true,
            Self::AllSamplesFailed { .. } => true,
            Self::NoTargetsSupplied | Self::Config(_) | Self::Validation(_) | Self::Parse(_) => false,
            Self::Io(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ProbeFailed { target, cause } => {
                format!("Could not measure latency to {}: {}\n\nSuggestion: Check that the host resolves and that ICMP is not blocked.", target, cause)
            }
            Self::AllSamplesFailed { target } => {
                format!("{} did not answer any probe.\n\nSuggestion: Verify the address or increase the probe timeout with --timeout.", target)
            }
            Self::DiagnosticFailed { target, cause } => {
                format!("Path trace to {} failed: {}\n\nSuggestion: Make sure 'traceroute' (or 'tracert' on Windows) is installed.", target, cause)
            }
            Self::NoTargetsSupplied => {
                "No targets to probe.\n\nSuggestion: Pass a comma-separated list with --addresses or set TARGETS in your .env file.".to_string()
            }
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file or command line arguments.", msg)
            }
            Self::Network(msg) => {
                format!("Network connectivity issue: {}\n\nSuggestion: Check your internet connection and try again.", msg)
            }
            Self::DnsResolution(msg) => {
                format!("DNS resolution failed: {}\n\nSuggestion: Reverse DNS may simply not be configured for this address.", msg)
            }
            Self::Timeout(msg) => {
                format!("Operation timed out: {}\n\nSuggestion: Increase the timeout value using --timeout or --deadline.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check the format of your addresses and numeric options.", msg)
            }
            Self::Io(msg) => {
                format!("System operation failed: {}\n\nSuggestion: Check that 'ping' is installed and on your PATH.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the format of your input data or configuration files.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoTargetsSupplied | Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Network(_) | Self::DnsResolution(_) => 2,
            Self::Timeout(_) => 3,
            Self::Io(_) => 5,
            Self::ProbeFailed { .. } | Self::AllSamplesFailed { .. } | Self::DiagnosticFailed { .. } => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::NoTargetsSupplied | Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Network(_) | Self::DnsResolution(_) | Self::ProbeFailed { .. } => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::AllSamplesFailed { .. } | Self::DiagnosticFailed { .. } => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_decode() {
            Self::parse(format!("Response decode error: {}", error))
        } else {
            Self::network(error.to_string())
        }
    }
}

impl From<trust_dns_resolver::error::ResolveError> for AppError {
    fn from(error: trust_dns_resolver::error::ResolveError) -> Self {
        Self::dns_resolution(error.to_string())
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

impl From<std::net::AddrParseError> for AppError {
    fn from(error: std::net::AddrParseError) -> Self {
        Self::parse(format!("IP address parse error: {}", error))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::internal(format!("Worker task failed: {}", error))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for structured error logging and user feedback
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());

            if error.is_recoverable() {
                eprintln!();
                if self.use_color {
                    use colored::Colorize;
                    eprintln!("{}", "This error might be temporary. You can try running the command again.".green());
                } else {
                    eprintln!("This error might be temporary. You can try running the command again.");
                }
            }
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}
