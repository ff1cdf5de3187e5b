//! Client configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use crate::auth::provider::{DEFAULT_IDENTITY_BASE_URL, DEFAULT_SECURE_TOKEN_URL};
use reqwest::Url;
use std::{path::PathBuf, time::Duration};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_DATA_DIR: &str = ".class_market";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Complete client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL
    pub api_base_url: String,
    /// Identity provider settings
    pub identity: IdentityConfig,
    /// Payment gateway publishable key
    pub stripe_publishable_key: Option<String>,
    /// Image host key
    pub image_host_key: Option<String>,
    /// Directory holding the local store and logs
    pub data_dir: PathBuf,
    /// Timeout for every backend request
    pub request_timeout: Duration,
}

/// Identity provider configuration
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Web API key (required)
    pub api_key: String,
    pub base_url: String,
    pub secure_token_url: String,
}

/// Values given on the command line, which win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(overrides: ConfigOverrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_base_url = overrides
            .api_base_url
            .or_else(|| non_empty("API_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        // Identity provider (REQUIRED)
        let api_key = non_empty("IDENTITY_API_KEY").ok_or_else(|| ConfigError::MissingRequired {
            var: "IDENTITY_API_KEY".to_string(),
            hint: "Use the web API key of the identity provider project".to_string(),
        })?;

        let identity = IdentityConfig {
            api_key,
            base_url: non_empty("IDENTITY_BASE_URL").unwrap_or_else(|| DEFAULT_IDENTITY_BASE_URL.to_string()),
            secure_token_url: non_empty("SECURE_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_SECURE_TOKEN_URL.to_string()),
        };

        let data_dir = overrides
            .data_dir
            .or_else(|| non_empty("DATA_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        Ok(ClientConfig {
            api_base_url,
            identity,
            stripe_publishable_key: non_empty("STRIPE_PUBLISHABLE_KEY"),
            image_host_key: non_empty("IMAGE_HOST_KEY"),
            data_dir,
            request_timeout: Duration::from_secs(parse_or(
                non_empty("REQUEST_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (var, value) in [
            ("API_BASE_URL", &self.api_base_url),
            ("IDENTITY_BASE_URL", &self.identity.base_url),
            ("SECURE_TOKEN_URL", &self.identity.secure_token_url),
        ] {
            let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
                var: var.to_string(),
                reason: format!("'{value}' is not a URL: {e}"),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: format!("Must be http or https, got '{}'", url.scheme()),
                });
            }
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "REQUEST_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Local store file inside the data directory.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
