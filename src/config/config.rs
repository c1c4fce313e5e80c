use crate::error::ConfigError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration loaded from a TOML file
///
/// Every section falls back to its defaults when omitted, so an empty file is
/// a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub logs: LogsConfig,
    pub detector: DetectorConfig,
    pub service: ServiceConfig,
    pub tracker: TrackerConfig,
}

/// Where log records are read from
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogsConfig {
    /// Directory holding `<area>_<vpn>.log` files; the built-in sample
    /// records are used when unset
    pub directory: Option<PathBuf>,
}

/// Failure indicators searched for in log messages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    pub patterns: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            patterns: vec!["ERROR".to_string(), "Falha".to_string()],
        }
    }
}

/// Which service manager is driven through the process boundary
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceManagerKind {
    /// `powershell.exe` with `Get-Service` / `Restart-Service`
    Powershell,
    /// `systemctl show` / `systemctl restart`
    Systemctl,
}

impl Default for ServiceManagerKind {
    fn default() -> Self {
        if cfg!(windows) {
            ServiceManagerKind::Powershell
        } else {
            ServiceManagerKind::Systemctl
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub manager: ServiceManagerKind,
    /// Upper bound for a single service manager invocation
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            manager: ServiceManagerKind::default(),
            timeout_seconds: 30,
        }
    }
}

/// Issue tracker (GitHub) settings
///
/// The credential itself is never stored here; only the name of the
/// environment variable it is read from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub token_env: String,
    pub timeout_seconds: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            owner: "Serafim-JA".to_string(),
            repo: "ANI".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl TrackerConfig {
    /// Read the tracker credential from the configured environment variable
    ///
    /// Returns `None` when the variable is unset or blank.
    pub fn credential(&self) -> Option<String> {
        let token = std::env::var(&self.token_env).ok()?;
        let token = token.trim();
        if token.is_empty() {
            debug!("{} is set but empty", self.token_env);
            return None;
        }
        Some(token.to_string())
    }
}

impl Config {
    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read,
    /// `ConfigError::TomlError` if it is not valid TOML for this schema, and
    /// `ConfigError::ValidationError` if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detector.patterns.is_empty() {
            return Err(ConfigError::ValidationError(
                "detector.patterns must contain at least one pattern".to_string(),
            ));
        }
        if self.detector.patterns.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::ValidationError(
                "detector.patterns must not contain empty strings".to_string(),
            ));
        }
        if self.service.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "service.timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.tracker.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "tracker.timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if !self.tracker.api_url.starts_with("http://")
            && !self.tracker.api_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationError(format!(
                "tracker.api_url must be an http(s) URL, got '{}'",
                self.tracker.api_url
            )));
        }
        if self.tracker.owner.trim().is_empty() || self.tracker.repo.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "tracker.owner and tracker.repo must be set".to_string(),
            ));
        }
        if self.tracker.token_env.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "tracker.token_env must name an environment variable".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detector.patterns, vec!["ERROR", "Falha"]);
        assert_eq!(config.tracker.token_env, "GITHUB_TOKEN");
        assert_eq!(config.logs.directory, None);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml_str(
            r#"
            [service]
            manager = "powershell"

            [tracker]
            repo = "ops-incidents"
            "#,
        )
        .unwrap();

        assert_eq!(config.service.manager, ServiceManagerKind::Powershell);
        assert_eq!(config.service.timeout_seconds, 30);
        assert_eq!(config.tracker.repo, "ops-incidents");
        assert_eq!(config.tracker.api_url, "https://api.github.com");
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[logs]\ndirectory = \"/var/log/vpn\"").unwrap();
        file.flush().unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.logs.directory, Some(PathBuf::from("/var/log/vpn")));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = Config::from_file(Path::new("/nonexistent/triage.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_toml_str("[service\nmanager = ");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_unknown_manager_rejected() {
        let result = Config::from_toml_str("[service]\nmanager = \"launchd\"");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_empty_patterns_rejected() {
        let result = Config::from_toml_str("[detector]\npatterns = []");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));

        let result = Config::from_toml_str("[detector]\npatterns = [\"ERROR\", \"\"]");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let result = Config::from_toml_str("[service]\ntimeout_seconds = 0");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));

        let result = Config::from_toml_str("[tracker]\ntimeout_seconds = 0");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_non_http_api_url_rejected() {
        let result = Config::from_toml_str("[tracker]\napi_url = \"ftp://example.com\"");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_credential_from_environment() {
        let tracker = TrackerConfig {
            token_env: "TRIAGE_TEST_TOKEN_PRESENT".to_string(),
            ..TrackerConfig::default()
        };
        std::env::set_var("TRIAGE_TEST_TOKEN_PRESENT", "  secret-token \n");
        assert_eq!(tracker.credential(), Some("secret-token".to_string()));
        std::env::remove_var("TRIAGE_TEST_TOKEN_PRESENT");
    }

    #[test]
    fn test_blank_or_missing_credential() {
        let tracker = TrackerConfig {
            token_env: "TRIAGE_TEST_TOKEN_BLANK".to_string(),
            ..TrackerConfig::default()
        };
        std::env::remove_var("TRIAGE_TEST_TOKEN_BLANK");
        assert_eq!(tracker.credential(), None);

        std::env::set_var("TRIAGE_TEST_TOKEN_BLANK", "   ");
        assert_eq!(tracker.credential(), None);
        std::env::remove_var("TRIAGE_TEST_TOKEN_BLANK");
    }
}
