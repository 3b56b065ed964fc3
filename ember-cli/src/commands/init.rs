//! Write the backend configuration.

use anyhow::Result;
use std::path::Path;

use crate::config::CliConfig;

/// Run the init command.
pub async fn run(
    data_dir: &Path,
    backend_url: Option<&str>,
    api_key: &str,
    user_id: &str,
) -> Result<()> {
    let backend_url = backend_url.unwrap_or("https://api.ember.app");
    let config = CliConfig::new(backend_url, api_key, user_id);
    config.save(data_dir).await?;

    println!("Configured.");
    println!("  Backend: {backend_url}");
    println!("  User:    {user_id}");
    println!("  Data:    {}", data_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn init_writes_loadable_config() {
        let dir = tempdir().unwrap();

        run(dir.path(), Some("https://backend.test"), "key", "user-1")
            .await
            .unwrap();

        let config = CliConfig::load(dir.path()).await.unwrap();
        assert_eq!(config.backend_url, "https://backend.test");
        assert_eq!(config.user_id, "user-1");
    }
}
