//! Data models and structures for the latency prober

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::Config;
pub use metrics::{Sample, SampleSet, AggregateResult};
