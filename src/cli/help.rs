//! Topic help for the command-line interface
//!
//! `--help` covers the flags; `--help-topic` explains configuration, timing
//! and output in more depth.

use crate::{config::env::EnvManager, probe::platform};
use colored::*;

/// Topics accepted by `--help-topic`
pub const HELP_TOPICS: &[&str] = &["config", "examples", "timeout", "output", "trace"];

/// Help text renderer
pub struct HelpSystem {
    platform: String,
}

impl HelpSystem {
    pub fn new() -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
        }
    }

    /// Header plus the list of topics
    pub fn display_main_help(&self, use_colors: bool) -> String {
        let mut help = self.format_header(use_colors);
        help.push('\n');
        help.push_str(&self.format_examples_section(use_colors));
        help.push('\n');
        help.push_str(&format!(
            "Run with --help for every option, or --help-topic <TOPIC> with one of: {}\n",
            HELP_TOPICS.join(", ")
        ));
        help
    }

    /// Help for a single topic, `None` when the topic is unknown
    pub fn display_topic_help(&self, topic: &str, use_colors: bool) -> Option<String> {
        match topic.to_lowercase().as_str() {
            "config" | "configuration" | "env" | "environment" => Some(self.format_configuration_help(use_colors)),
            "examples" => Some(self.format_examples_section(use_colors)),
            "timeout" | "timeouts" => Some(self.format_timeout_help(use_colors)),
            "output" | "formatting" => Some(self.format_output_help(use_colors)),
            "trace" | "traceroute" | "diagnostics" => Some(self.format_trace_help(use_colors)),
            _ => None,
        }
    }

    fn format_header(&self, use_colors: bool) -> String {
        let title = "Latency Prober";
        let subtitle = "Parallel round-trip latency probing with path traces of the slowest targets";
        let version = env!("CARGO_PKG_VERSION");

        if use_colors {
            format!(
                "{}\n{}\nVersion: {} | Platform: {}\n",
                title.bright_cyan().bold(),
                subtitle.bright_blue(),
                version.green(),
                self.platform.yellow()
            )
        } else {
            format!("{}\n{}\nVersion: {} | Platform: {}\n", title, subtitle, version, self.platform)
        }
    }

    fn section(title: &str, use_colors: bool) -> String {
        if use_colors {
            format!("{}\n", title.bright_green().bold())
        } else {
            format!("{}\n", title)
        }
    }

    fn format_examples_section(&self, use_colors: bool) -> String {
        let examples = [
            ExampleHelp {
                title: "Probe two resolvers",
                command: "lprobe -a 1.1.1.1,8.8.8.8",
                description: "Three probes each, then a path trace of the two slowest",
            },
            ExampleHelp {
                title: "More samples, tighter timeout",
                command: "lprobe -a example.com -a example.org --count 10 --timeout 2",
                description: "Ten probes per target, each abandoned after two seconds",
            },
            ExampleHelp {
                title: "Machine-readable report",
                command: "lprobe -a 1.1.1.1 --json --no-identity --no-trace",
                description: "Ranking and sampling summary only, as JSON on stdout",
            },
            ExampleHelp {
                title: "Targets from the environment",
                command: "TARGETS=1.1.1.1,9.9.9.9 lprobe --verbose",
                description: "Print every individual sample along with the ranking",
            },
        ];

        let mut output = Self::section("EXAMPLES:", use_colors);
        for example in &examples {
            output.push_str(&example.format(use_colors));
            output.push('\n');
        }
        output
    }

    fn format_configuration_help(&self, use_colors: bool) -> String {
        let mut help = Self::section("CONFIGURATION:", use_colors);
        help.push_str("Settings are read from a .env file in the working directory, then from\n");
        help.push_str("the process environment, and finally from command-line arguments.\n\n");
        help.push_str(&EnvManager::display_env_help());
        help
    }

    fn format_timeout_help(&self, use_colors: bool) -> String {
        let mut help = Self::section("TIMEOUTS:", use_colors);
        help.push_str("  --timeout <SECONDS>        Upper bound for one probe; a probe that takes longer\n");
        help.push_str("                             is recorded as timed out and does not count towards\n");
        help.push_str("                             the mean.\n");
        help.push_str("  --deadline <SECONDS>       Upper bound for the whole sampling phase. Targets\n");
        help.push_str("                             still probing when it expires are cut short and keep\n");
        help.push_str("                             the samples they already produced. Defaults to\n");
        help.push_str("                             count * timeout + 5.\n");
        help.push_str("  --trace-timeout <SECONDS>  Upper bound for one path trace.\n");
        help
    }

    fn format_output_help(&self, use_colors: bool) -> String {
        let mut help = Self::section("OUTPUT:", use_colors);
        help.push_str("  Targets are listed fastest first. Targets without a single successful\n");
        help.push_str("  sample are marked unreachable and listed last in the order supplied.\n\n");
        help.push_str("  --json       Emit the whole report as JSON\n");
        help.push_str("  --verbose    Include every individual sample\n");
        help.push_str("  --no-color   Plain text without ANSI colors (NO_COLOR is honored too)\n");
        help
    }

    fn format_trace_help(&self, use_colors: bool) -> String {
        let mut help = Self::section("PATH TRACES:", use_colors);
        help.push_str(&format!(
            "  After ranking, the slowest reachable targets are traced with '{}'.\n",
            platform::TRACE_PROGRAM
        ));
        help.push_str("  --slowest <K> picks how many (default 2, 0 disables); --no-trace skips\n");
        help.push_str("  the phase entirely. Unreachable targets are never traced, and a failed\n");
        help.push_str("  trace is reported without affecting the other results.\n");
        help
    }
}

impl Default for HelpSystem {
    fn default() -> Self {
        Self::new()
    }
}

struct ExampleHelp {
    title: &'static str,
    command: &'static str,
    description: &'static str,
}

impl ExampleHelp {
    fn format(&self, use_colors: bool) -> String {
        if use_colors {
            format!(
                "  {}:\n    {}\n    {}\n",
                self.title.bright_yellow().bold(),
                self.command.bright_white(),
                self.description.bright_blue().italic()
            )
        } else {
            format!("  {}:\n    {}\n    {}\n", self.title, self.command, self.description)
        }
    }
}
