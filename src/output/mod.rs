//! Output formatting and display system
//!
//! This module renders a [`LatencyReport`] as colored text, plain text with
//! table formatting, or JSON.

mod colored;
mod formatter;
mod report;

pub use self::colored::{ColorScheme, ColoredFormatter};
pub use formatter::{Alignment, Column, FormattingOptions, OutputFormatter, PlainFormatter, RowData, TableFormat};
pub use report::{LatencyReport, TargetSamples};

use crate::{error::Result, models::Config};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            table_borders: true,
            show_raw_traces: verbose,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, false)
    }
}

/// Main output coordinator that handles all report display
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter>,
    json: bool,
    verbose: bool,
}

impl OutputCoordinator {
    /// Create a new output coordinator with the specified formatter
    pub fn new(formatter: Box<dyn OutputFormatter>) -> Self {
        Self {
            formatter,
            json: false,
            verbose: false,
        }
    }

    /// Formatter, JSON mode and verbosity taken from the configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            formatter: OutputFormatterFactory::create_formatter(config.enable_color, config.verbose),
            json: config.json_output,
            verbose: config.verbose,
        }
    }

    /// Render the complete report
    pub fn display_report(&self, report: &LatencyReport) -> Result<String> {
        if self.json {
            return report.to_json();
        }

        let mut sections = vec![self.formatter.format_header("Latency Report")?];

        if !report.identities.is_empty() {
            sections.push(self.formatter.format_identities(&report.identities)?);
        }

        sections.push(self.formatter.format_ranking(&report.ranking)?);

        if self.verbose && !report.samples.is_empty() {
            sections.push(self.formatter.format_samples(&report.samples)?);
        }

        sections.push(self.formatter.format_sampling_summary(&report.summary)?);
        sections.push(self.formatter.format_diagnostics(&report.diagnostics)?);
        sections.push(self.verdict(report)?);

        Ok(sections.join("\n\n"))
    }

    /// Closing line: how many targets answered
    fn verdict(&self, report: &LatencyReport) -> Result<String> {
        let total = report.ranking.len();
        let reachable = report.ranking.reachable_count();

        if reachable == 0 {
            return self.formatter.format_error(&format!("None of the {} targets answered", total));
        }

        let unreachable: Vec<&str> = report.ranking.unreachable().map(|e| e.target.as_str()).collect();
        if !unreachable.is_empty() {
            self.formatter.format_warning(&format!(
                "{} of {} targets answered; unreachable: {}",
                reachable,
                total,
                unreachable.join(", ")
            ))
        } else if report.summary.deadline_exceeded {
            self.formatter.format_warning(&format!(
                "All {} targets answered, but sampling was cut short by the deadline",
                total
            ))
        } else {
            self.formatter.format_success(&format!("All {} targets answered", total))
        }
    }

    /// One-line announcement printed before sampling starts
    pub fn display_plan(&self, targets: &[crate::types::Target], sample_count: u32) -> String {
        let list: Vec<&str> = targets.iter().map(|t| t.as_str()).collect();
        format!("Will ping each one of {} {} times", list.join(", "), sample_count)
    }
}
