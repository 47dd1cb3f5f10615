//! Environment variable handling and .env file management

use crate::{
    defaults,
    error::{AppError, Result},
    models::config::validate_target,
};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load a specific env file if it exists; variables already set win
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Latency Prober Configuration
#
# Values specified here are used as defaults and can be overridden by
# command-line arguments.

# Targets to probe (comma-separated hostnames or IP addresses)
# TARGETS=1.1.1.1,8.8.8.8,example.com

# Number of probes per target (1-100)
# SAMPLE_COUNT=3

# Timeout for a single probe in seconds (1-60)
# PROBE_TIMEOUT_SECONDS=5

# Deadline for the whole sampling phase in seconds
# (defaults to SAMPLE_COUNT * PROBE_TIMEOUT_SECONDS + 5)
# SAMPLING_DEADLINE_SECONDS=30

# Timeout for one traceroute in seconds (1-600)
# TRACE_TIMEOUT_SECONDS=60

# How many of the slowest reachable targets to traceroute (0 disables)
# SLOWEST_COUNT=2

# Look up the caller's public IPv4/IPv6 addresses (true/false)
# IDENTITY_LOOKUP=true

# JSON endpoint reporting the caller's address in "ip_addr"
# IDENTITY_URL=http://ifconfig.me/all.json

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "TARGETS" => {
                for target in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    validate_target(target)
                        .map_err(|e| AppError::config(format!("Invalid TARGETS entry '{}': {}", target, e)))?;
                }
            }
            "SAMPLE_COUNT" => {
                let count: u32 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid SAMPLE_COUNT value '{}': {}", value, e)))?;
                if count == 0 || count > defaults::MAX_SAMPLE_COUNT {
                    return Err(AppError::config(format!(
                        "SAMPLE_COUNT must be between 1 and {}, got: {}",
                        defaults::MAX_SAMPLE_COUNT,
                        count
                    )));
                }
            }
            "PROBE_TIMEOUT_SECONDS" => {
                Self::validate_seconds(key, value, defaults::MAX_PROBE_TIMEOUT_SECS)?;
            }
            "TRACE_TIMEOUT_SECONDS" => {
                Self::validate_seconds(key, value, defaults::MAX_TRACE_TIMEOUT_SECS)?;
            }
            "SAMPLING_DEADLINE_SECONDS" => {
                Self::validate_seconds(key, value, u64::MAX)?;
            }
            "SLOWEST_COUNT" => {
                value
                    .parse::<usize>()
                    .map_err(|e| AppError::config(format!("Invalid SLOWEST_COUNT value '{}': {}", value, e)))?;
            }
            "IDENTITY_LOOKUP" | "ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "IDENTITY_URL" => {
                let parsed = url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("Invalid IDENTITY_URL '{}': {}", value, e)))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(AppError::config(format!("IDENTITY_URL must use http or https: {}", value)));
                }
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    fn validate_seconds(key: &str, value: &str, max: u64) -> Result<()> {
        let secs: u64 = value
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
        if secs == 0 || secs > max {
            return Err(AppError::config(format!("{} must be between 1 and {}, got: {}", key, max, secs)));
        }
        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("TARGETS", "Comma-separated list of targets to probe", "1.1.1.1,example.com"),
            ("SAMPLE_COUNT", "Probes per target (1-100)", "3"),
            ("PROBE_TIMEOUT_SECONDS", "Timeout for one probe (1-60)", "5"),
            ("SAMPLING_DEADLINE_SECONDS", "Deadline for the whole sampling phase", "30"),
            ("TRACE_TIMEOUT_SECONDS", "Timeout for one traceroute (1-600)", "60"),
            ("SLOWEST_COUNT", "Slowest reachable targets to traceroute", "2"),
            ("IDENTITY_LOOKUP", "Look up the caller's public addresses", "true"),
            ("IDENTITY_URL", "Identity endpoint returning ip_addr", defaults::DEFAULT_IDENTITY_URL),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<26} {}\n", var, description));
            help.push_str(&format!("  {:<26} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(name, _, _)| {
                let value = std::env::var(name).ok()?;
                Self::validate_env_var(name, &value).err().map(|e| format!("Warning: {}", e))
            })
            .collect()
    }

    /// Validate the contents of an env file, returning one warning per bad line
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let warnings = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let (key, value) = line.split_once('=')?;
                Self::validate_env_var(key.trim(), value.trim())
                    .err()
                    .map(|e| format!("Line '{}': {}", line, e))
            })
            .collect();

        Ok(Some(warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_example_content_lists_every_variable() {
        let content = EnvManager::create_example_env_content();
        for (name, _, _) in EnvManager::get_supported_env_vars() {
            assert!(content.contains(&format!("{}=", name)), "missing {}", name);
        }
    }

    #[test]
    fn test_save_example_file() {
        let temp_file = NamedTempFile::new().unwrap();
        EnvManager::save_example_env_file(temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("Latency Prober Configuration"));
    }

    #[test]
    fn test_validate_env_var() {
        assert!(EnvManager::validate_env_var("TARGETS", "1.1.1.1, example.com,::1").is_ok());
        assert!(EnvManager::validate_env_var("SAMPLE_COUNT", "5").is_ok());
        assert!(EnvManager::validate_env_var("PROBE_TIMEOUT_SECONDS", "10").is_ok());
        assert!(EnvManager::validate_env_var("SLOWEST_COUNT", "0").is_ok());
        assert!(EnvManager::validate_env_var("IDENTITY_LOOKUP", "false").is_ok());
        assert!(EnvManager::validate_env_var("IDENTITY_URL", "https://ifconfig.me/all.json").is_ok());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "true").is_ok());

        assert!(EnvManager::validate_env_var("TARGETS", "bad host!").is_err());
        assert!(EnvManager::validate_env_var("SAMPLE_COUNT", "0").is_err());
        assert!(EnvManager::validate_env_var("SAMPLE_COUNT", "101").is_err());
        assert!(EnvManager::validate_env_var("PROBE_TIMEOUT_SECONDS", "0").is_err());
        assert!(EnvManager::validate_env_var("PROBE_TIMEOUT_SECONDS", "61").is_err());
        assert!(EnvManager::validate_env_var("SLOWEST_COUNT", "-1").is_err());
        assert!(EnvManager::validate_env_var("IDENTITY_URL", "ftp://example.com").is_err());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "maybe").is_err());
        assert!(EnvManager::validate_env_var("SOMETHING_ELSE", "whatever").is_ok());
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();
        assert!(help.contains("Supported Environment Variables:"));
        assert!(help.contains("TARGETS"));
        assert!(help.contains("Configuration Priority"));
    }

    #[test]
    fn test_check_env_file_reports_bad_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "SAMPLE_COUNT=4").unwrap();
        writeln!(file, "PROBE_TIMEOUT_SECONDS=zero").unwrap();
        writeln!(file).unwrap();

        let warnings = EnvManager::check_env_file(file.path()).unwrap().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("PROBE_TIMEOUT_SECONDS"));

        let missing = file.path().with_extension("missing");
        assert!(EnvManager::check_env_file(&missing).unwrap().is_none());
    }
}
