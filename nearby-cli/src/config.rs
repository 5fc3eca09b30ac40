//! Configuration management for the nearby CLI.

use anyhow::{Context, Result};
use nearby_types::Identity;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Participant identity stored locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Unique participant identifier.
    pub identity: String,
    /// Human-readable display name.
    pub display_name: String,
    /// When the identity was created.
    pub created_at: u64,
}

impl IdentityConfig {
    /// Create a new identity configuration with a random identifier.
    pub fn new(display_name: &str) -> Self {
        Self {
            identity: Identity::random().as_str().to_string(),
            display_name: display_name.to_string(),
            created_at: unix_now(),
        }
    }

    /// The identity as the typed token used on the wire.
    pub fn identity(&self) -> Result<Identity> {
        Identity::new(&self.identity).context("Stored identity is empty")
    }

    /// Load identity configuration from a directory.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join("identity.json");
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Identity not initialized. Run 'nearby init' first.")?;
        serde_json::from_str(&contents).context("Invalid identity configuration")
    }

    /// Save identity configuration to a directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join("identity.json");
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save identity configuration")?;
        set_file_permissions_0600(&path).await?;
        Ok(())
    }

    /// Check if an identity is initialized.
    pub async fn exists(data_dir: &Path) -> bool {
        data_dir.join("identity.json").exists()
    }
}

/// Remote store connection stored locally.
///
/// The API key grants write access to the shared location collection, so
/// the file is written 0600.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the store's REST root.
    pub base_url: String,
    /// API key for the store.
    pub api_key: String,
    /// When the store was linked.
    pub linked_at: u64,
}

impl StoreConfig {
    /// Create a new store configuration.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            linked_at: unix_now(),
        }
    }

    /// Load store configuration from a directory.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join("store.json");
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("No store linked. Run 'nearby link' first.")?;
        serde_json::from_str(&contents).context("Invalid store configuration")
    }

    /// Save store configuration to a directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join("store.json");
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save store configuration")?;
        set_file_permissions_0600(&path).await?;
        Ok(())
    }

    /// Check if a store is linked.
    pub async fn exists(data_dir: &Path) -> bool {
        data_dir.join("store.json").exists()
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Set directory permissions to 0700 (owner only) on Unix.
/// No-op on non-Unix platforms.
pub async fn set_dir_permissions_0700(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .await
            .context("Failed to set directory permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
