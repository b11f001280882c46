//! CLI configuration utilities

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use stockroom_core::ClientConfig;
use tracing::info;

/// Name of the configuration file looked up in the data directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolve the client configuration
///
/// An explicit file wins, then `DATA_DIR/config.toml`, then defaults with
/// `STOCKROOM_*` environment overrides.
pub fn load_client_config(explicit: Option<&Path>, data_dir: &Path) -> Result<ClientConfig> {
    if let Some(path) = explicit {
        info!("Loading configuration from: {}", path.display());
        return ClientConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()));
    }

    let default_path = data_dir.join(CONFIG_FILE_NAME);
    if default_path.exists() {
        info!("Loading configuration from: {}", default_path.display());
        ClientConfig::from_file(&default_path).with_context(|| {
            format!("failed to load configuration from {}", default_path.display())
        })
    } else {
        info!("Using default configuration with environment overrides");
        Ok(ClientConfig::from_env()?)
    }
}

/// Save client configuration as TOML
pub fn save_client_config<P: AsRef<Path>>(config: &ClientConfig, path: P) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Generate a default configuration file rooted at `data_dir`
pub fn generate_default_config(path: &Path, data_dir: &Path) -> Result<PathBuf> {
    let config = ClientConfig {
        credentials_path: data_dir.join("credentials.json"),
        ..ClientConfig::default()
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    save_client_config(&config, path)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        generate_default_config(&path, dir.path()).unwrap();
        let loaded = load_client_config(None, &dir.path().join("nested")).unwrap();

        assert_eq!(loaded.credentials_path, dir.path().join("credentials.json"));
        assert_eq!(loaded.refresh_path, "/account/refresh-token");
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_client_config(Some(&dir.path().join("nope.toml")), dir.path());
        assert!(result.is_err());
    }
}
