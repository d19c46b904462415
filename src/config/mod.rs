//! Configuration module for Upstow
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
pub(crate) fn expand_env_vars(s: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}").unwrap();
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let full_match = cap.get(0).unwrap();
        let var_name = cap.get(1).unwrap().as_str();

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub drive: DriveConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.storage.base_url.is_empty() && !is_valid_http_url(&self.storage.base_url) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid base_url '{}': must start with http:// or https://",
                self.storage.base_url
            )));
        }

        if self.fetch.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "fetch.timeout_seconds must be greater than zero".into(),
            ));
        }

        match &self.drive {
            DriveConfig::Local(local) => {
                if local.root.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "Local drive root cannot be empty".into(),
                    ));
                }
            }
            DriveConfig::S3(s3) => {
                if s3.bucket.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "S3 drive bucket cannot be empty".into(),
                    ));
                }
                if s3.region.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "S3 drive region cannot be empty".into(),
                    ));
                }
                if let Some(ref endpoint) = s3.endpoint {
                    if !is_valid_http_url(endpoint) {
                        return Err(ConfigError::ValidationError(format!(
                            "Invalid S3 endpoint '{}': must start with http:// or https://",
                            endpoint
                        )));
                    }
                }
                if s3.access_key.is_some() != s3.secret_key.is_some() {
                    return Err(ConfigError::ValidationError(
                        "S3 access_key and secret_key must be set together".into(),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Key and URL construction options
///
/// # Example
///
/// ```yaml
/// storage:
///   path_prefix: "img/"
///   auto_generate_path: true
///   base_url: "https://cdn.example.com/"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Prepended to every key verbatim
    #[serde(default)]
    pub path_prefix: String,

    /// Generate `YYYY/MM/DD/<uuid>.<ext>` keys
    #[serde(default)]
    pub auto_generate_path: bool,

    /// Append `.<ext>` to caller-supplied keys
    #[serde(default)]
    pub append_extension: bool,

    /// Insert a `/` between prefix and key when neither supplies one
    #[serde(default)]
    pub insert_prefix_separator: bool,

    /// Prepended to the key to form the public URL
    #[serde(default)]
    pub base_url: String,
}

/// Network source fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("upstow/{}", crate::VERSION)
}

/// Storage drive selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DriveConfig {
    #[serde(rename = "local")]
    Local(LocalDriveConfig),
    #[serde(rename = "s3")]
    S3(S3DriveConfig),
}

/// Local filesystem drive configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalDriveConfig {
    pub root: String,
}

/// S3-compatible drive configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3DriveConfig {
    pub bucket: String,
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Read credentials from `AWS_*` environment variables when none are configured
    #[serde(default)]
    pub use_env_credentials: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> Config {
        Config {
            storage: StorageConfig::default(),
            fetch: FetchConfig::default(),
            drive: DriveConfig::Local(LocalDriveConfig {
                root: "/tmp/upstow".into(),
            }),
        }
    }

    #[test]
    fn test_default_fetch_config() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout_seconds, 30);
        assert!(config.user_agent.starts_with("upstow/"));
    }

    #[test]
    fn test_valid_local_config() {
        assert!(local_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_base_url() {
        let mut config = local_config();
        config.storage.base_url = "cdn.example.com/".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_root() {
        let mut config = local_config();
        config.drive = DriveConfig::Local(LocalDriveConfig { root: "  ".into() });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = local_config();
        config.fetch.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_half_credentials() {
        let mut config = local_config();
        config.drive = DriveConfig::S3(S3DriveConfig {
            bucket: "media".into(),
            region: "us-east-1".into(),
            endpoint: None,
            access_key: Some("access".into()),
            secret_key: None,
            use_env_credentials: false,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        let expanded = expand_env_vars("root: ${UPSTOW_SURELY_UNSET_VAR:-/srv/files}");
        assert_eq!(expanded, "root: /srv/files");
    }

    #[test]
    fn test_expand_env_vars_keeps_unknown_placeholder() {
        let expanded = expand_env_vars("root: ${UPSTOW_SURELY_UNSET_VAR}");
        assert_eq!(expanded, "root: ${UPSTOW_SURELY_UNSET_VAR}");
    }
}
