//! Colored formatter implementation with terminal color support
//!
//! Latency values are colored by [`LatencyClass`]; unreachable targets and
//! failed traces stand out in the error color.

use super::formatter::{format_duration, format_percentage, FormattingOptions, OutputFormatter};
use super::report::TargetSamples;
use crate::{
    diagnostics::DiagnosticOutcome,
    error::{AppError, Result},
    executor::SamplingSummary,
    identity::IdentityOutcome,
    stats::Ranking,
    types::{LatencyClass, ProbeStatus},
};
use colored::*;
use std::fmt::Write as _;
use std::time::Duration;

impl LatencyClass {
    /// Get color for this latency class
    pub fn color(&self) -> Color {
        match self {
            Self::Good => Color::Green,
            Self::Moderate => Color::Yellow,
            Self::Poor => Color::Red,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub highlight: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            highlight: Color::Magenta,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

fn fmt_err(what: &'static str) -> impl Fn(std::fmt::Error) -> AppError {
    move |e| AppError::io(format!("Failed to format {}: {}", what, e))
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self {
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    /// Apply bold formatting if colors are enabled
    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    /// Apply dimmed formatting if colors are enabled
    fn dimmed(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.dimmed()
        } else {
            text.normal()
        }
    }

    fn format_mean_colored(&self, mean: Duration) -> ColoredString {
        let text = format!("{:.3}ms", mean.as_secs_f64() * 1000.0);
        self.colorize(&text, LatencyClass::from_duration(mean).color())
    }

    fn format_percentage_colored(&self, percentage: f64) -> ColoredString {
        let formatted = format_percentage(percentage);
        let color = if percentage >= 95.0 {
            self.color_scheme.success
        } else if percentage >= 80.0 {
            self.color_scheme.warning
        } else {
            self.color_scheme.error
        };
        self.colorize(&formatted, color)
    }

    fn section_header(&self, title: &str) -> String {
        format!("{}\n{}", self.bold(title).color(self.color_scheme.header), self.dimmed(&"─".repeat(title.chars().count())))
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let border = "═".repeat(title.chars().count() + 4);
        Ok(format!(
            "{}\n  {}  \n{}",
            self.colorize(&border, self.color_scheme.header),
            self.bold(title).color(self.color_scheme.header),
            self.colorize(&border, self.color_scheme.header)
        ))
    }

    fn format_identities(&self, identities: &[IdentityOutcome]) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("identities");

        writeln!(output, "{}", self.section_header("Identity")).map_err(&err)?;
        for outcome in identities {
            let family = self.colorize(outcome.family.as_str(), self.color_scheme.info);
            match &outcome.result {
                Ok(identity) if identity.hostnames.is_empty() => {
                    writeln!(output, "  {}: {}", family, self.bold(&identity.address.to_string())).map_err(&err)?;
                }
                Ok(identity) => {
                    writeln!(
                        output,
                        "  {}: You are {} --> {}",
                        family,
                        self.colorize(&identity.hostnames.join(", "), self.color_scheme.highlight),
                        self.bold(&identity.address.to_string())
                    )
                    .map_err(&err)?;
                }
                Err(e) => {
                    writeln!(output, "  {}: {}", family, self.dimmed(&format!("unavailable ({})", e))).map_err(&err)?;
                }
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_ranking(&self, ranking: &Ranking) -> Result<String> {
        if ranking.is_empty() {
            return Ok(self.colorize("No targets were sampled.", self.color_scheme.warning).to_string());
        }

        let mut output = String::new();
        let err = fmt_err("ranking");
        writeln!(output, "{}", self.section_header("Targets by mean latency")).map_err(&err)?;

        let name_width = ranking
            .entries()
            .iter()
            .map(|e| e.target.as_str().chars().count())
            .max()
            .unwrap_or(0);

        for (idx, entry) in ranking.entries().iter().enumerate() {
            // Pad before coloring; escape codes would skew the width
            let name = format!("{:<width$}", entry.target.as_str(), width = name_width);
            let replies = format!("{}/{}", entry.success_count, entry.total_count());
            match entry.mean {
                Some(mean) => {
                    writeln!(
                        output,
                        "  {:>2}. {}  {:>12}  {}",
                        idx + 1,
                        self.bold(&name),
                        self.format_mean_colored(mean),
                        self.dimmed(&replies)
                    )
                    .map_err(&err)?;
                }
                None => {
                    writeln!(
                        output,
                        "  {:>2}. {}  {:>12}  {}",
                        idx + 1,
                        self.dimmed(&name),
                        self.colorize("unreachable", self.color_scheme.error),
                        self.dimmed(&replies)
                    )
                    .map_err(&err)?;
                }
            }
        }

        if let Some(slowest) = ranking.slowest(1).first() {
            write!(
                output,
                "\n  Slowest: {} - {}",
                self.bold(slowest.target.as_str()),
                self.colorize(&slowest.format_mean(), self.color_scheme.warning)
            )
            .map_err(&err)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_samples(&self, samples: &[TargetSamples]) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("samples");

        writeln!(output, "{}", self.section_header("Individual samples")).map_err(&err)?;
        for entry in samples {
            writeln!(output, "  {}:", self.colorize(entry.target.as_str(), self.color_scheme.info)).map_err(&err)?;
            for sample in entry.samples.samples() {
                let detail = match (sample.rtt, sample.status) {
                    (Some(rtt), _) => self.format_mean_colored(rtt).to_string(),
                    (None, ProbeStatus::Timeout) => self.colorize("timeout", self.color_scheme.warning).to_string(),
                    (None, _) => {
                        let message = sample.error_message.as_deref().unwrap_or("failed");
                        self.colorize(message, self.color_scheme.error).to_string()
                    }
                };
                writeln!(output, "    {} {}", self.dimmed(&format!("#{:<3}", sample.sequence)), detail).map_err(&err)?;
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_sampling_summary(&self, summary: &SamplingSummary) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("summary");

        writeln!(output, "{}", self.section_header("Sampling Summary")).map_err(&err)?;
        writeln!(output, "  Duration:      {}", format_duration(summary.duration.as_secs_f64() * 1000.0))
            .map_err(&err)?;
        writeln!(
            output,
            "  Samples:       {} ({} successful, {})",
            summary.total_samples,
            summary.successful_samples,
            self.format_percentage_colored(summary.success_rate())
        )
        .map_err(&err)?;

        if summary.failed_samples > 0 || summary.timed_out_samples > 0 {
            writeln!(
                output,
                "  Lost:          {} failed, {} timed out",
                self.colorize(&summary.failed_samples.to_string(), self.color_scheme.error),
                self.colorize(&summary.timed_out_samples.to_string(), self.color_scheme.warning)
            )
            .map_err(&err)?;
        }

        if summary.deadline_exceeded {
            let aborted: Vec<String> = summary.aborted_targets.iter().map(|t| t.to_string()).collect();
            writeln!(
                output,
                "  {}",
                self.colorize(
                    &format!("Deadline reached; cut short: {}", aborted.join(", ")),
                    self.color_scheme.warning
                )
            )
            .map_err(&err)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_diagnostics(&self, outcomes: &[DiagnosticOutcome]) -> Result<String> {
        if outcomes.is_empty() {
            return Ok(self.dimmed("No path traces were run.").to_string());
        }

        let mut output = String::new();
        let err = fmt_err("diagnostics");
        writeln!(output, "{}", self.section_header("Path traces")).map_err(&err)?;

        for outcome in outcomes {
            let heading = format!("Traceroute to {}", outcome.target);
            match &outcome.result {
                Ok(trace) => {
                    writeln!(
                        output,
                        "  {} (mean {}):",
                        self.bold(&heading),
                        self.format_mean_colored(outcome.mean)
                    )
                    .map_err(&err)?;
                    if trace.hops.is_empty() {
                        writeln!(output, "    {}", self.dimmed("(no responding hops)")).map_err(&err)?;
                    }
                    for (idx, hop) in trace.hops.iter().enumerate() {
                        writeln!(output, "    {}  {}", self.dimmed(&format!("{:>2}", idx + 1)), hop).map_err(&err)?;
                    }
                    if self.options.show_raw_traces {
                        writeln!(output, "{}", self.dimmed(trace.raw_output.trim_end())).map_err(&err)?;
                    }
                }
                Err(e) => {
                    writeln!(
                        output,
                        "  {} (mean {}): {}",
                        self.bold(&heading),
                        self.format_mean_colored(outcome.mean),
                        self.colorize(e, self.color_scheme.error)
                    )
                    .map_err(&err)?;
                }
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✗", self.color_scheme.error), self.colorize(error, self.color_scheme.error)))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("!", self.color_scheme.warning), self.colorize(warning, self.color_scheme.warning)))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✓", self.color_scheme.success), message))
    }
}
