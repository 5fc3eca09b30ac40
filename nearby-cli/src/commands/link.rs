//! Link the shared location store.

use anyhow::Result;
use std::path::Path;

use crate::config::StoreConfig;

/// Run the link command.
pub async fn run(data_dir: &Path, url: &str, api_key: &str) -> Result<()> {
    if url.trim().is_empty() {
        anyhow::bail!("Store URL must not be empty");
    }
    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    let config = StoreConfig::new(url.trim(), api_key.trim());
    config.save(data_dir).await?;

    println!("Store linked successfully!");
    println!();
    println!("  URL: {}", config.base_url);
    println!();
    println!("Start syncing: nearby run --lat <lat> --lon <lon>");

    Ok(())
}
