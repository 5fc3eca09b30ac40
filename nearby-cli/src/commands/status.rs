//! Show local configuration status.

use anyhow::Result;
use std::path::Path;

use crate::config::{IdentityConfig, StoreConfig};

/// Run the status command.
pub async fn run(data_dir: &Path) -> Result<()> {
    println!("=== nearby status ===");
    println!();

    match IdentityConfig::load(data_dir).await {
        Ok(identity) => {
            println!("Identity:");
            println!(
                "  ID:   {}",
                &identity.identity[..16.min(identity.identity.len())]
            );
            println!("  Name: {}", identity.display_name);
            println!("  Init: {}", format_timestamp(identity.created_at));
        }
        Err(_) => {
            println!("Identity: NOT INITIALIZED");
            println!();
            println!("Run 'nearby init --name <name>' to initialize.");
            return Ok(());
        }
    }

    println!();

    match StoreConfig::load(data_dir).await {
        Ok(store) => {
            println!("Store:");
            println!("  URL:    {}", store.base_url);
            println!("  Linked: {}", format_timestamp(store.linked_at));
        }
        Err(_) => {
            println!("Store: NOT LINKED");
            println!();
            println!("Run 'nearby link --url <url> --api-key <key>'");
            return Ok(());
        }
    }

    println!();
    println!("Ready. Start syncing: nearby run --lat <lat> --lon <lon>");

    Ok(())
}

/// Format a Unix timestamp as a human-readable string.
fn format_timestamp(ts: u64) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let diff = now.saturating_sub(ts);

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        format!("{} minutes ago", diff / 60)
    } else if diff < 86400 {
        format!("{} hours ago", diff / 3600)
    } else {
        format!("{} days ago", diff / 86400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn status_without_init() {
        let dir = tempdir().unwrap();
        assert!(run(dir.path()).await.is_ok());
    }

    #[tokio::test]
    async fn status_with_identity_only() {
        let dir = tempdir().unwrap();
        IdentityConfig::new("Alice").save(dir.path()).await.unwrap();

        assert!(run(dir.path()).await.is_ok());
    }

    #[tokio::test]
    async fn status_with_identity_and_store() {
        let dir = tempdir().unwrap();
        IdentityConfig::new("Alice").save(dir.path()).await.unwrap();
        StoreConfig::new("https://store.example.com", "key")
            .save(dir.path())
            .await
            .unwrap();

        assert!(run(dir.path()).await.is_ok());
    }

    #[test]
    fn format_timestamp_works() {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();

        assert_eq!(format_timestamp(now), "just now");
        assert!(format_timestamp(now - 120).contains("minutes"));
        assert!(format_timestamp(now - 7200).contains("hours"));
        assert!(format_timestamp(now - 172800).contains("days"));
    }
}
