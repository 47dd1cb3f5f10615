//! Structured logging for the latency prober
//!
//! This module provides:
//! - Structured log entries with levels, fields and correlation IDs
//! - Console and JSON output formats
//! - Phase timing for the sampling, aggregation and diagnostics stages
//! - Per-probe and per-trace event logging
//! - Error event logging

use crate::error::AppError;
use crate::models::{Config, Sample};
use crate::types::Target;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }

    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    pub fields: HashMap<String, serde_json::Value>,
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub module: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
}

/// Shared logging context for correlation and session tracking
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
    current_correlation_id: Option<String>,
}

/// Logger implementation with multiple output formats
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    /// Create a logger with level and format derived from the configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Start a correlated operation
    pub async fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        {
            let mut context = self.context.write().await;
            context.current_correlation_id = Some(correlation_id.clone());
        }

        self.debug(&format!("Started operation: {}", operation_name))
            .correlation_id(&correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "start")
            .log()
            .await;

        correlation_id
    }

    /// End a correlated operation
    pub async fn end_operation(&self, correlation_id: &str, operation_name: &str, success: bool) {
        self.debug(&format!("Completed operation: {} (success: {})", operation_name, success))
            .correlation_id(correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "end")
            .field("success", success)
            .log()
            .await;

        let mut context = self.context.write().await;
        if context.current_correlation_id.as_deref() == Some(correlation_id) {
            context.current_correlation_id = None;
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry.fields.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }
        if entry.correlation_id.is_none() {
            entry.correlation_id = context.current_correlation_id.clone();
        }
        drop(context);

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry),
            LogFormat::Json => self.format_json(&entry),
        };

        // Logs never go to stdout: stdout carries the report
        let _ = writeln!(io::stderr(), "{}", output);
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}",
            timestamp,
            formatted_level,
            entry.logger,
            entry.message
        );

        if let Some(correlation_id) = &entry.correlation_id {
            let short = correlation_id.get(..8).unwrap_or(correlation_id);
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields_str: Vec<String> = entry.fields.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields_str.sort();
            output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}", entry.message),
        }
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
                location: None,
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Add the fields of a probe sample
    pub fn sample(self, sample: &Sample) -> Self {
        self.field("sequence", sample.sequence)
            .field("status", sample.status.as_str())
            .field("rtt_ms", sample.rtt_ms())
            .field("error", sample.error_message.as_deref())
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Timing logger for the stages of a run
pub struct PhaseLogger {
    logger: Logger,
    start_times: HashMap<String, DateTime<Utc>>,
}

impl PhaseLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("PHASE".to_string(), config),
            start_times: HashMap::new(),
        }
    }

    /// Start timing a phase
    pub async fn start_phase(&mut self, phase: &str) {
        let start_time = Utc::now();
        self.start_times.insert(phase.to_string(), start_time);

        self.logger.debug(&format!("Started phase: {}", phase))
            .field("phase", phase)
            .field("start_time", start_time)
            .log()
            .await;
    }

    /// End timing a phase and log the duration
    pub async fn end_phase(&mut self, phase: &str) -> Option<chrono::Duration> {
        let Some(start_time) = self.start_times.remove(phase) else {
            self.logger.warn(&format!("Attempted to end unknown phase: {}", phase))
                .field("phase", phase)
                .log()
                .await;
            return None;
        };

        let end_time = Utc::now();
        let duration = end_time - start_time;

        self.logger.info(&format!("Completed phase: {} in {}ms", phase, duration.num_milliseconds()))
            .field("phase", phase)
            .field("duration_ms", duration.num_milliseconds())
            .log()
            .await;

        Some(duration)
    }

    /// Log the outcome of the sampling phase
    pub async fn log_sampling_summary(
        &self,
        target_count: usize,
        total_samples: usize,
        successful_samples: usize,
        duration: std::time::Duration,
        deadline_exceeded: bool,
    ) {
        let level = if deadline_exceeded { LogLevel::Warn } else { LogLevel::Info };
        let message = format!(
            "Sampled {} targets: {} samples ({} successful) in {:.3}s",
            target_count,
            total_samples,
            successful_samples,
            duration.as_secs_f64()
        );

        self.logger.log(level, &message)
            .field("target_count", target_count)
            .field("total_samples", total_samples)
            .field("successful_samples", successful_samples)
            .field("duration_seconds", duration.as_secs_f64())
            .field("deadline_exceeded", deadline_exceeded)
            .log()
            .await;
    }
}

/// Logger for probe and path-trace events
pub struct ProbeLogger {
    logger: Logger,
}

impl ProbeLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("PROBE".to_string(), config),
        }
    }

    /// Log one sample; failures are warnings
    pub async fn log_sample(&self, target: &Target, sample: &Sample) {
        let level = if sample.is_successful() { LogLevel::Debug } else { LogLevel::Warn };
        if !self.logger.would_log(level) {
            return;
        }
        let message = match (sample.rtt_ms(), &sample.error_message) {
            (Some(ms), _) => format!("{} #{}: {:.3}ms", target, sample.sequence, ms),
            (None, Some(err)) => format!("{} #{}: {}", target, sample.sequence, err),
            (None, None) => format!("{} #{}: {}", target, sample.sequence, sample.status.as_str()),
        };

        self.logger.log(level, &message)
            .field("target", target)
            .sample(sample)
            .log()
            .await;
    }

    /// Log a worker that was cancelled by the sampling deadline
    pub async fn log_worker_aborted(&self, target: &Target, completed: usize, expected: u32) {
        self.logger.warn(&format!("Sampling deadline reached for {}", target))
            .field("target", target)
            .field("completed_samples", completed)
            .field("expected_samples", expected)
            .log()
            .await;
    }

    /// Log a target that produced no successful sample
    pub async fn log_unreachable(&self, error: &AppError) {
        let target = match error {
            AppError::AllSamplesFailed { target } => Some(target.as_str()),
            _ => None,
        };

        self.logger.warn(&error.to_string())
            .field("target", target)
            .error_info(error)
            .log()
            .await;
    }

    /// Log a path trace outcome
    pub async fn log_trace(&self, target: &Target, hop_count: Option<usize>, error: Option<&str>) {
        let level = if error.is_none() { LogLevel::Info } else { LogLevel::Warn };
        let message = match (hop_count, error) {
            (_, Some(err)) => format!("Path trace to {} failed: {}", target, err),
            (Some(hops), None) => format!("Path trace to {}: {} hops", target, hops),
            (None, None) => format!("Path trace to {} finished", target),
        };

        let mut builder = self.logger.log(level, &message)
            .field("target", target)
            .field("hop_count", hop_count);

        if let Some(err) = error {
            builder = builder.field("error", err);
        }

        builder.log().await;
    }
}

/// Error event logger with enhanced context
pub struct ErrorEventLogger {
    logger: Logger,
}

impl ErrorEventLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("ERR".to_string(), config),
        }
    }

    /// Log an application error with full context
    pub async fn log_error(&self, error: &AppError, context: Option<&str>, correlation_id: Option<&str>) {
        let message = match context {
            Some(ctx) => format!("{}: {}", ctx, error),
            None => error.to_string(),
        };

        let mut builder = self.logger.error(&message)
            .error_info(error);

        if let Some(id) = correlation_id {
            builder = builder.correlation_id(id);
        }

        if let Some(ctx) = context {
            builder = builder.field("context", ctx);
        }

        builder.log().await;
    }
}

/// Logger factory sharing one session ID across loggers
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub fn create_phase_logger(&self) -> PhaseLogger {
        PhaseLogger::new(&self.config)
    }

    pub fn create_probe_logger(&self) -> ProbeLogger {
        ProbeLogger::new(&self.config)
    }

    pub fn create_error_logger(&self) -> ErrorEventLogger {
        ErrorEventLogger::new(&self.config)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Convenience macros for logging with location information
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_logger_with_config() {
        let config = Config {
            debug: true,
            enable_color: false,
            ..Default::default()
        };

        let logger = Logger::with_config("TEST".to_string(), &config);
        assert_eq!(logger.min_level, LogLevel::Debug);
        assert_eq!(logger.format, LogFormat::Json);
        assert!(!logger.use_color);
        assert!(logger.include_location);

        let quiet = Logger::with_config("TEST".to_string(), &Config::default());
        assert_eq!(quiet.min_level, LogLevel::Warn);
        assert!(!quiet.would_log(LogLevel::Info));
    }

    #[tokio::test]
    async fn test_operation_correlation() {
        let logger = Logger::with_config("TEST".to_string(), &Config::default());
        let correlation_id = logger.start_operation("sampling").await;
        assert_eq!(
            logger.context.read().await.current_correlation_id.as_deref(),
            Some(correlation_id.as_str())
        );

        logger.end_operation(&correlation_id, "sampling", true).await;
        assert!(logger.context.read().await.current_correlation_id.is_none());
    }

    #[test]
    fn test_log_formats() {
        let mut fields = HashMap::new();
        fields.insert("target".to_string(), serde_json::Value::String("example.com".to_string()));
        let entry = LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Warn,
            message: "Probe failed".to_string(),
            logger: "PROBE".to_string(),
            correlation_id: Some("0123456789abcdef".to_string()),
            fields,
            location: None,
        };

        let logger = Logger::with_config(
            "PROBE".to_string(),
            &Config {
                enable_color: false,
                ..Default::default()
            },
        );

        let console = logger.format_console(&entry);
        assert!(console.contains(" WARN [PROBE] Probe failed [01234567]"));
        assert!(console.contains("target=\"example.com\""));

        let json = logger.format_json(&entry);
        let parsed: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.level, LogLevel::Warn);
        assert_eq!(parsed.message, "Probe failed");
    }

    #[tokio::test]
    async fn test_phase_timing() {
        let mut phases = PhaseLogger::new(&Config::default());

        phases.start_phase("sampling").await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        let duration = phases.end_phase("sampling").await;
        assert!(duration.is_some());

        assert!(phases.end_phase("unknown").await.is_none());
    }

    #[tokio::test]
    async fn test_probe_and_error_logging() {
        let config = Config::default();
        let probe_logger = ProbeLogger::new(&config);
        let target = Target::new("example.com");

        probe_logger.log_sample(&target, &Sample::success(1, Duration::from_millis(12))).await;
        probe_logger.log_sample(&target, &Sample::failed(2, "exit status 1".to_string())).await;
        probe_logger.log_worker_aborted(&target, 1, 3).await;
        probe_logger.log_unreachable(&AppError::all_samples_failed("example.com")).await;
        probe_logger.log_trace(&target, Some(7), None).await;
        probe_logger.log_trace(&target, None, Some("traceroute: not found")).await;

        let err_logger = ErrorEventLogger::new(&config);
        err_logger.log_error(&AppError::network("down"), Some("Identity lookup"), None).await;
    }

    #[tokio::test]
    async fn test_logger_factory() {
        let factory = LoggerFactory::new(Config::default());
        let logger = factory.create_logger("APP").await;
        assert_eq!(logger.name, "APP");
        assert!(!factory.session_id().is_empty());

        let context = logger.context.read().await;
        assert_eq!(context.session_id.as_deref(), Some(factory.session_id()));
    }
}
