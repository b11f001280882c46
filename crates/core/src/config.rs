//! Configuration for the Stockroom API client

use crate::CoreResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "STOCKROOM";

/// Path of the login endpoint
pub const DEFAULT_LOGIN_PATH: &str = "/account/login";

/// Path of the token refresh endpoint
pub const DEFAULT_REFRESH_PATH: &str = "/account/refresh-token";

/// Route the application is sent to when the session ends
pub const DEFAULT_SIGNIN_ROUTE: &str = "/signin";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the inventory API
    pub base_url: String,

    /// Request timeout in seconds (0 disables the timeout)
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// File holding the persisted session credentials
    pub credentials_path: PathBuf,

    /// Path of the login endpoint
    pub login_path: String,

    /// Path of the token refresh endpoint
    pub refresh_path: String,

    /// Route the application is sent to when the session ends
    pub signin_route: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: 30,
            user_agent: format!("stockroom-client/{}", env!("CARGO_PKG_VERSION")),
            credentials_path: default_data_dir().join("credentials.json"),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            signin_route: DEFAULT_SIGNIN_ROUTE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from file
    ///
    /// Values from the file are overridden by `STOCKROOM_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let settings = Self::with_defaults(config::Config::builder())?
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load configuration with defaults and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> CoreResult<Self> {
        let settings = Self::with_defaults(config::Config::builder())?
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> CoreResult<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = Self::default();

        Ok(builder
            .set_default("base_url", defaults.base_url)?
            .set_default("timeout_secs", defaults.timeout_secs)?
            .set_default("user_agent", defaults.user_agent)?
            .set_default(
                "credentials_path",
                defaults.credentials_path.to_string_lossy().to_string(),
            )?
            .set_default("login_path", defaults.login_path)?
            .set_default("refresh_path", defaults.refresh_path)?
            .set_default("signin_route", defaults.signin_route)?)
    }

    /// Request timeout, if one is configured
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

/// Default directory for Stockroom state
///
/// Uses `STOCKROOM_STATE_DIR` when set, otherwise the platform data directory.
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STOCKROOM_STATE_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stockroom")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_account_endpoints() {
        let config = ClientConfig::default();
        assert_eq!(config.refresh_path, "/account/refresh-token");
        assert_eq!(config.login_path, "/account/login");
        assert_eq!(config.signin_route, "/signin");
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_timeout_disables_timeout() {
        let config = ClientConfig {
            timeout_secs: 0,
            ..ClientConfig::default()
        };
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_from_file_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stockroom.toml");
        std::fs::write(
            &path,
            "base_url = \"https://inventory.example.com/api\"\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.base_url, "https://inventory.example.com/api");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.refresh_path, "/account/refresh-token");
    }

    #[test]
    fn test_from_file_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClientConfig::from_file(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(crate::CoreError::InvalidConfig { .. })));
    }
}
