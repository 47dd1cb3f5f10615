//! Latency Prober
//!
//! Measures round-trip latency to a set of targets several times in
//! parallel, ranks the targets by mean latency and traces the network path
//! to the slowest of them.

pub mod app;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod identity;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, Sample, SampleSet, AggregateResult};
pub use types::Target;
pub use probe::{Prober, SystemPing};
pub use executor::{TargetSampler, SamplerConfig, SamplingOutcome, SamplingSummary};
pub use stats::{Aggregator, Ranking};
pub use diagnostics::{PathTracer, SystemTraceroute, DiagnosticsTrigger, DiagnosticOutcome, PathTrace};
pub use identity::{IdentityLookup, IdentityOutcome};
pub use output::{LatencyReport, OutputCoordinator, OutputFormatter, OutputFormatterFactory};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_SAMPLE_COUNT: u32 = 3;
    pub const MAX_SAMPLE_COUNT: u32 = 100;
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
    pub const MAX_PROBE_TIMEOUT_SECS: u64 = 60;
    /// Added on top of `sample_count * probe_timeout` when no explicit
    /// sampling deadline is configured
    pub const DEFAULT_DEADLINE_SLACK: Duration = Duration::from_secs(5);
    pub const DEFAULT_TRACE_TIMEOUT: Duration = Duration::from_secs(60);
    pub const MAX_TRACE_TIMEOUT_SECS: u64 = 600;
    /// Number of slowest reachable targets that get a path trace
    pub const DEFAULT_DIAGNOSTICS_COUNT: usize = 2;
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
    pub const DEFAULT_IDENTITY_URL: &str = "http://ifconfig.me/all.json";
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
