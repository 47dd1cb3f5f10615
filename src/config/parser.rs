//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::Config,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        self.load_env_file()?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    fn load_env_file(&self) -> Result<()> {
        EnvManager::load_env_file(self.cli.debug)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        if !self.cli.addresses.is_empty() {
            config.targets = self.cli.targets();
        }

        if let Some(count) = self.cli.count {
            config.sample_count = count;
        }

        if let Some(timeout) = self.cli.timeout {
            config.probe_timeout_seconds = timeout;
        }

        if let Some(deadline) = self.cli.deadline {
            config.sampling_deadline_seconds = Some(deadline);
        }

        if let Some(timeout) = self.cli.trace_timeout {
            config.trace_timeout_seconds = timeout;
        }

        if let Some(slowest) = self.cli.slowest {
            config.diagnostics_count = slowest;
        }

        if self.cli.no_trace {
            config.diagnostics_count = 0;
        }

        if let Some(ref url) = self.cli.identity_url {
            config.identity_url = url.clone();
        }

        if self.cli.no_identity {
            config.identity_lookup = false;
        }

        // --color/--no-color win over ENABLE_COLOR; JSON is never colored
        if self.cli.color || self.cli.no_color || self.cli.json {
            config.enable_color = self.cli.use_colors();
        } else {
            config.enable_color = config.enable_color && self.cli.use_colors();
        }

        // CLI-only flags
        config.json_output = self.cli.json;
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!(
                "Final config: targets={}, sample_count={}, probe_timeout={}s, deadline={}s",
                config.targets.len(),
                config.sample_count,
                config.probe_timeout_seconds,
                config.sampling_deadline().as_secs()
            );
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    let parser = ConfigParser::new(cli);
    parser.parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Targets: {}", config.targets.join(", ")));
    summary.push(format!("Sample Count: {}", config.sample_count));
    summary.push(format!("Probe Timeout: {}s", config.probe_timeout_seconds));
    summary.push(format!("Sampling Deadline: {}s", config.sampling_deadline().as_secs()));
    summary.push(format!("Trace Timeout: {}s", config.trace_timeout_seconds));
    summary.push(format!("Slowest Traced: {}", config.diagnostics_count));
    summary.push(format!(
        "Identity Lookup: {}",
        if config.identity_lookup { config.identity_url.as_str() } else { "disabled" }
    ));
    summary.push(format!("JSON Output: {}", config.json_output));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::env;
    use std::sync::Mutex;

    // Tests below touch process-wide environment variables and the .env file
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "TARGETS",
        "SAMPLE_COUNT",
        "PROBE_TIMEOUT_SECONDS",
        "SAMPLING_DEADLINE_SECONDS",
        "TRACE_TIMEOUT_SECONDS",
        "SLOWEST_COUNT",
        "IDENTITY_LOOKUP",
        "IDENTITY_URL",
        "ENABLE_COLOR",
    ];

    fn with_clean_env<F: FnOnce()>(backup: &str, f: F) {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

        for var in VARS {
            env::remove_var(var);
        }

        // Temporarily move .env file to avoid interference
        let env_file_exists = std::path::Path::new(".env").exists();
        if env_file_exists {
            let _ = std::fs::rename(".env", backup);
        }

        f();

        for var in VARS {
            env::remove_var(var);
        }
        if env_file_exists {
            let _ = std::fs::rename(backup, ".env");
        }
    }

    #[test]
    fn test_config_parser_defaults() {
        with_clean_env(".env.test_backup_defaults", || {
            let cli = Cli::parse_from(["test", "-a", "1.1.1.1"]);
            let config = ConfigParser::new(cli).parse().unwrap();

            assert_eq!(config.targets, vec!["1.1.1.1"]);
            assert_eq!(config.sample_count, crate::defaults::DEFAULT_SAMPLE_COUNT);
            assert_eq!(config.probe_timeout(), crate::defaults::DEFAULT_PROBE_TIMEOUT);
            assert_eq!(config.diagnostics_count, crate::defaults::DEFAULT_DIAGNOSTICS_COUNT);
            assert!(config.identity_lookup);
            assert!(!config.json_output);
        });
    }

    #[test]
    fn test_cli_overrides() {
        with_clean_env(".env.test_backup_cli_overrides", || {
            let cli = Cli::parse_from([
                "test",
                "-a", "1.1.1.1,example.com",
                "--count", "10",
                "--timeout", "5",
                "--deadline", "90",
                "--slowest", "1",
                "--no-identity",
                "--no-color",
                "--verbose",
            ]);
            let config = ConfigParser::new(cli).parse().unwrap();

            assert_eq!(config.targets, vec!["1.1.1.1", "example.com"]);
            assert_eq!(config.sample_count, 10);
            assert_eq!(config.probe_timeout_seconds, 5);
            assert_eq!(config.sampling_deadline_seconds, Some(90));
            assert_eq!(config.diagnostics_count, 1);
            assert!(!config.identity_lookup);
            assert!(!config.enable_color);
            assert!(config.verbose);
        });
    }

    #[test]
    fn test_env_supplies_targets() {
        with_clean_env(".env.test_backup_env_targets", || {
            env::set_var("TARGETS", "9.9.9.9, example.org");
            env::set_var("SLOWEST_COUNT", "0");

            let config = ConfigParser::new(Cli::parse_from(["test"])).parse().unwrap();
            assert_eq!(config.targets, vec!["9.9.9.9", "example.org"]);
            assert_eq!(config.diagnostics_count, 0);
        });
    }

    #[test]
    fn test_cli_overrides_env_vars() {
        with_clean_env(".env.test_backup_cli_overrides_env_vars", || {
            env::set_var("SAMPLE_COUNT", "8");
            env::set_var("TARGETS", "9.9.9.9");

            let cli = Cli::parse_from(["test", "--count", "12", "-a", "1.1.1.1"]);
            let config = ConfigParser::new(cli).parse().unwrap();

            assert_eq!(config.sample_count, 12);
            assert_eq!(config.targets, vec!["1.1.1.1"]);
        });
    }

    #[test]
    fn test_no_trace_wins_over_env() {
        with_clean_env(".env.test_backup_no_trace", || {
            env::set_var("SLOWEST_COUNT", "4");

            let config = ConfigParser::new(Cli::parse_from(["test", "--no-trace"])).parse().unwrap();
            assert_eq!(config.diagnostics_count, 0);
        });
    }

    #[test]
    fn test_invalid_env_value_is_error() {
        with_clean_env(".env.test_backup_invalid_env", || {
            env::set_var("SAMPLE_COUNT", "many");
            assert!(ConfigParser::new(Cli::parse_from(["test"])).parse().is_err());
        });
    }

    #[test]
    fn test_invalid_target_is_error() {
        with_clean_env(".env.test_backup_invalid_target", || {
            let cli = Cli::parse_from(["test", "--addresses=-rf"]);
            assert!(load_config(cli).is_err());
        });
    }

    #[test]
    fn test_json_disables_color() {
        with_clean_env(".env.test_backup_json", || {
            let config = load_config(Cli::parse_from(["test", "--json"])).unwrap();
            assert!(config.json_output);
            assert!(!config.enable_color);
        });
    }

    #[test]
    fn test_config_summary() {
        let config = Config {
            targets: vec!["1.1.1.1".to_string(), "example.com".to_string()],
            ..Default::default()
        };
        let summary = display_config_summary(&config);

        assert!(summary.contains("Targets: 1.1.1.1, example.com"));
        assert!(summary.contains("Sample Count: 3"));
        assert!(summary.contains("Sampling Deadline: 20s"));
        assert!(summary.contains("Identity Lookup: http://ifconfig.me/all.json"));
    }
}
