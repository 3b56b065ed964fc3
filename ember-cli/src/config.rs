//! Configuration management for ember-cli.
//!
//! Configuration is a TOML file (`config.toml`) in the data directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration stored locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Base URL of the remote matchmaking service.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// API key used for both the `apikey` header and bearer auth.
    pub api_key: String,
    /// The user this device is signed in as.
    pub user_id: String,
    /// Local database file, relative to the data directory unless absolute.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Maximum records fetched per entity type per sync pass.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_backend_url() -> String {
    "https://api.ember.app".to_string()
}

fn default_database() -> PathBuf {
    PathBuf::from("ember.db")
}

fn default_page_size() -> u32 {
    500
}

impl CliConfig {
    /// Create a configuration for the given backend and user.
    pub fn new(backend_url: &str, api_key: &str, user_id: &str) -> Self {
        Self {
            backend_url: backend_url.to_string(),
            api_key: api_key.to_string(),
            user_id: user_id.to_string(),
            database: default_database(),
            page_size: default_page_size(),
        }
    }

    /// Load configuration from a data directory.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join("config.toml");
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Not configured. Run 'ember init' first.")?;
        toml::from_str(&contents).context("Invalid configuration file")
    }

    /// Save configuration to a data directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join("config.toml");
        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save configuration")?;
        Ok(())
    }

    /// The resolved database path.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        if self.database.is_absolute() {
            self.database.clone()
        } else {
            data_dir.join(&self.database)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn config_roundtrip() {
        let dir = tempdir().unwrap();
        let config = CliConfig::new("https://backend.test", "key-123", "user-1");
        config.save(dir.path()).await.unwrap();

        let loaded = CliConfig::load(dir.path()).await.unwrap();
        assert_eq!(loaded.backend_url, "https://backend.test");
        assert_eq!(loaded.api_key, "key-123");
        assert_eq!(loaded.user_id, "user-1");
        assert_eq!(loaded.page_size, 500);
    }

    #[tokio::test]
    async fn load_without_init_fails() {
        let dir = tempdir().unwrap();
        assert!(CliConfig::load(dir.path()).await.is_err());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: CliConfig = toml::from_str(
            r#"
api_key = "k"
user_id = "u"
"#,
        )
        .unwrap();
        assert_eq!(config.backend_url, "https://api.ember.app");
        assert_eq!(config.database, PathBuf::from("ember.db"));
        assert_eq!(config.page_size, 500);
    }

    #[test]
    fn database_path_resolution() {
        let config = CliConfig::new("https://b", "k", "u");
        let resolved = config.database_path(Path::new("/data"));
        assert_eq!(resolved, PathBuf::from("/data/ember.db"));

        let mut absolute = config;
        absolute.database = PathBuf::from("/elsewhere/e.db");
        assert_eq!(
            absolute.database_path(Path::new("/data")),
            PathBuf::from("/elsewhere/e.db")
        );
    }
}
