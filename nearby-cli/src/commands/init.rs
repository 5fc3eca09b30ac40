//! Initialize the local participant identity.

use anyhow::Result;
use std::path::Path;

use crate::config::IdentityConfig;

/// Run the init command.
pub async fn run(data_dir: &Path, name: &str) -> Result<()> {
    if IdentityConfig::exists(data_dir).await {
        anyhow::bail!(
            "Identity already initialized. Delete {} to reinitialize.",
            data_dir.join("identity.json").display()
        );
    }

    let config = IdentityConfig::new(name);
    config.save(data_dir).await?;

    println!("Identity initialized successfully!");
    println!();
    println!("  Identity: {}", &config.identity[..16.min(config.identity.len())]);
    println!("  Name:     {}", config.display_name);
    println!("  Data dir: {}", data_dir.display());
    println!();
    println!("Next steps:");
    println!("  1. Link the shared store: nearby link --url <url> --api-key <key>");
    println!("  2. Start syncing: nearby run --lat <lat> --lon <lon>");

    Ok(())
}
