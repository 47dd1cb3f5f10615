//! Core formatting traits and implementations
//!
//! This module defines the output formatting interface and provides
//! a plain text implementation with table formatting capabilities.

use super::report::TargetSamples;
use crate::{
    diagnostics::DiagnosticOutcome,
    error::{AppError, Result},
    executor::SamplingSummary,
    identity::IdentityOutcome,
    stats::Ranking,
};
use std::fmt::Write as _;

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format the caller's public addresses
    fn format_identities(&self, identities: &[IdentityOutcome]) -> Result<String>;

    /// Format targets in ranking order
    fn format_ranking(&self, ranking: &Ranking) -> Result<String>;

    /// Format every individual sample
    fn format_samples(&self, samples: &[TargetSamples]) -> Result<String>;

    /// Format the sampling phase counters
    fn format_sampling_summary(&self, summary: &SamplingSummary) -> Result<String>;

    /// Format path traces of the slowest targets
    fn format_diagnostics(&self, outcomes: &[DiagnosticOutcome]) -> Result<String>;

    /// Closing line when no target answered
    fn format_error(&self, error: &str) -> Result<String>;

    /// Closing line when some targets were unreachable or cut short
    fn format_warning(&self, warning: &str) -> Result<String>;

    /// Closing line when every target answered
    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Show table borders
    pub table_borders: bool,
    /// Show raw traceroute output under the extracted hops
    pub show_raw_traces: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            table_borders: true,
            show_raw_traces: false,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: Vec<Column>,
    pub show_borders: bool,
    pub show_header: bool,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
    pub max_width: usize,
}

impl Column {
    pub fn new(header: &str, alignment: Alignment, min_width: usize, max_width: usize) -> Self {
        Self {
            header: header.to_string(),
            alignment,
            min_width,
            max_width,
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

fn fmt_err(what: &str) -> impl Fn(std::fmt::Error) -> AppError + '_ {
    move |e| AppError::io(format!("Failed to format {}: {}", what, e))
}

/// Format duration in human-readable format
pub(crate) fn format_duration(duration_ms: f64) -> String {
    if duration_ms < 1.0 {
        format!("{:.0}µs", duration_ms * 1000.0)
    } else if duration_ms < 1000.0 {
        format!("{:.1}ms", duration_ms)
    } else if duration_ms < 60000.0 {
        format!("{:.2}s", duration_ms / 1000.0)
    } else {
        let minutes = (duration_ms / 60000.0) as u32;
        let seconds = (duration_ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

/// Format percentage with appropriate precision
pub(crate) fn format_percentage(percentage: f64) -> String {
    if percentage >= 99.95 {
        "100.0%".to_string()
    } else if percentage < 0.05 {
        "0.0%".to_string()
    } else {
        format!("{:.1}%", percentage)
    }
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    /// Create a table with the given format and data
    fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> String {
        if rows.is_empty() {
            return String::new();
        }

        let column_widths = self.calculate_column_widths(format, rows);
        let mut output = String::new();

        if format.show_header && !format.columns.is_empty() {
            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&column_widths));
                output.push('\n');
            }

            let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
            output.push_str(&self.create_row(&headers, &column_widths, format));
            output.push('\n');

            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&column_widths));
                output.push('\n');
            }
        }

        for row in rows {
            output.push_str(&self.create_row(row, &column_widths, format));
            output.push('\n');
        }

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&column_widths));
        }

        output
    }

    /// Calculate optimal column widths
    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        format
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(idx))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0);
                content
                    .max(column.min_width)
                    .max(column.header.len())
                    .min(column.max_width)
            })
            .collect()
    }

    /// Create a table row
    fn create_row(&self, data: &[String], widths: &[usize], format: &TableFormat) -> String {
        let mut row = String::new();

        if format.show_borders {
            row.push('|');
        }

        for (idx, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
            let alignment = format
                .columns
                .get(idx)
                .map(|c| &c.alignment)
                .unwrap_or(&Alignment::Left);

            if format.show_borders {
                row.push(' ');
            }
            row.push_str(&self.align_text(cell, width, alignment));
            if format.show_borders {
                row.push_str(" |");
            } else {
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    /// Create horizontal border for table
    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::new();

        if !widths.is_empty() {
            border.push('+');
            for &width in widths {
                border.push_str(&"-".repeat(width + 2));
                border.push('+');
            }
        }

        border
    }

    /// Align text within specified width
    fn align_text(&self, text: &str, width: usize, alignment: &Alignment) -> String {
        let len = text.chars().count();
        if len >= width {
            return text.chars().take(width).collect();
        }

        let padding = width - len;
        match alignment {
            Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
            Alignment::Right => format!("{}{}", " ".repeat(padding), text),
            Alignment::Center => {
                let left_pad = padding / 2;
                let right_pad = padding - left_pad;
                format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
            }
        }
    }

    fn ranking_table(&self) -> TableFormat {
        TableFormat {
            columns: vec![
                Column::new("#", Alignment::Right, 2, 4),
                Column::new("Target", Alignment::Left, 15, 60),
                Column::new("Mean RTT", Alignment::Right, 12, 16),
                Column::new("Replies", Alignment::Right, 7, 9),
                Column::new("Status", Alignment::Center, 11, 11),
            ],
            show_borders: self.options.table_borders,
            show_header: true,
        }
    }

    fn ranking_rows(ranking: &Ranking) -> Vec<RowData> {
        ranking
            .entries()
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                vec![
                    (idx + 1).to_string(),
                    entry.target.to_string(),
                    entry.mean_ms().map(|ms| format!("{:.3}ms", ms)).unwrap_or_else(|| "-".to_string()),
                    format!("{}/{}", entry.success_count, entry.total_count()),
                    if entry.is_reachable() { "ok" } else { "unreachable" }.to_string(),
                ]
            })
            .collect()
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);
        let err = fmt_err("header");

        writeln!(output, "{}", border).map_err(&err)?;
        writeln!(output, "  {}  ", title).map_err(&err)?;
        write!(output, "{}", border).map_err(&err)?;

        Ok(output)
    }

    fn format_identities(&self, identities: &[IdentityOutcome]) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("identities");

        writeln!(output, "Identity:").map_err(&err)?;
        for outcome in identities {
            match &outcome.result {
                Ok(identity) if identity.hostnames.is_empty() => {
                    writeln!(output, "  {}: {}", outcome.family, identity.address).map_err(&err)?;
                }
                Ok(identity) => {
                    writeln!(
                        output,
                        "  {}: {} --> {}",
                        outcome.family,
                        identity.hostnames.join(", "),
                        identity.address
                    )
                    .map_err(&err)?;
                }
                Err(e) => {
                    writeln!(output, "  {}: unavailable ({})", outcome.family, e).map_err(&err)?;
                }
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_ranking(&self, ranking: &Ranking) -> Result<String> {
        if ranking.is_empty() {
            return Ok("No targets were sampled.".to_string());
        }

        let mut output = String::new();
        let err = fmt_err("ranking");
        writeln!(output, "Targets by mean latency:").map_err(&err)?;
        output.push_str(&self.create_table(&self.ranking_table(), &Self::ranking_rows(ranking)));

        if let Some(slowest) = ranking.slowest(1).first() {
            write!(output, "\nSlowest: {} - {}", slowest.target, slowest.format_mean()).map_err(&err)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_samples(&self, samples: &[TargetSamples]) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("samples");

        writeln!(output, "Individual samples:").map_err(&err)?;
        for entry in samples {
            writeln!(output, "  {}:", entry.target).map_err(&err)?;
            if entry.samples.is_empty() {
                writeln!(output, "    (no samples)").map_err(&err)?;
            }
            for sample in entry.samples.samples() {
                let detail = match (sample.rtt_ms(), &sample.error_message) {
                    (Some(ms), _) => format!("{:.3}ms", ms),
                    (None, Some(message)) => format!("{} ({})", sample.status.as_str(), message),
                    (None, None) => sample.status.as_str().to_string(),
                };
                writeln!(output, "    #{:<3} {}", sample.sequence, detail).map_err(&err)?;
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_sampling_summary(&self, summary: &SamplingSummary) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("summary");

        writeln!(output, "Sampling Summary:").map_err(&err)?;
        writeln!(output, "-----------------").map_err(&err)?;
        writeln!(output, "Duration:         {}", format_duration(summary.duration.as_secs_f64() * 1000.0))
            .map_err(&err)?;
        writeln!(output, "Total Samples:    {}", summary.total_samples).map_err(&err)?;
        writeln!(
            output,
            "Successful:       {} ({})",
            summary.successful_samples,
            format_percentage(summary.success_rate())
        )
        .map_err(&err)?;
        writeln!(output, "Failed:           {}", summary.failed_samples).map_err(&err)?;
        write!(output, "Timed Out:        {}", summary.timed_out_samples).map_err(&err)?;

        if summary.deadline_exceeded {
            let aborted: Vec<String> = summary.aborted_targets.iter().map(|t| t.to_string()).collect();
            write!(output, "\nDeadline reached; cut short: {}", aborted.join(", ")).map_err(&err)?;
        }

        Ok(output)
    }

    fn format_diagnostics(&self, outcomes: &[DiagnosticOutcome]) -> Result<String> {
        let mut output = String::new();
        let err = fmt_err("diagnostics");

        if outcomes.is_empty() {
            return Ok("No path traces were run.".to_string());
        }

        for outcome in outcomes {
            let mean_ms = outcome.mean.as_secs_f64() * 1000.0;
            match &outcome.result {
                Ok(trace) => {
                    writeln!(output, "Traceroute to {} (mean {:.3}ms):", outcome.target, mean_ms).map_err(&err)?;
                    if trace.hops.is_empty() {
                        writeln!(output, "  (no responding hops)").map_err(&err)?;
                    }
                    for (idx, hop) in trace.hops.iter().enumerate() {
                        writeln!(output, "  {:>2}  {}", idx + 1, hop).map_err(&err)?;
                    }
                    if self.options.show_raw_traces {
                        writeln!(output, "{}", trace.raw_output.trim_end()).map_err(&err)?;
                    }
                }
                Err(e) => {
                    writeln!(output, "Traceroute to {} (mean {:.3}ms) failed: {}", outcome.target, mean_ms, e)
                        .map_err(&err)?;
                }
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("SUCCESS: {}", message))
    }
}
