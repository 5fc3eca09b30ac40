//! Run the proximity sync loop.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use nearby_client::{
    DispatchError, HttpLocationStore, NotificationDispatcher, SchedulerConfig,
    SharedLocationSource, SyncScheduler,
};
use nearby_types::{Identity, LocationFix};

use crate::config::{IdentityConfig, StoreConfig};

/// Prints alerts to the terminal in place of an OS notification channel.
#[derive(Debug, Clone, Default)]
struct TerminalDispatcher;

#[async_trait]
impl NotificationDispatcher for TerminalDispatcher {
    async fn dispatch(&self, identity: &Identity) -> Result<(), DispatchError> {
        println!(">>> {} is nearby!", identity.as_str());
        Ok(())
    }
}

/// Run the sync loop until Ctrl-C.
///
/// The position is fixed for the lifetime of the process; a real client
/// would feed fresh fixes into the source as the device moves.
pub async fn run(
    data_dir: &Path,
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
    interval_secs: u64,
) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        anyhow::bail!("Latitude must be between -90 and 90");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        anyhow::bail!("Longitude must be between -180 and 180");
    }
    if radius_meters <= 0.0 {
        anyhow::bail!("Radius must be positive");
    }
    if interval_secs == 0 {
        anyhow::bail!("Interval must be at least 1 second");
    }

    let identity = IdentityConfig::load(data_dir).await?.identity()?;
    let store_config = StoreConfig::load(data_dir).await?;

    let source = SharedLocationSource::new();
    source.publish_fix(LocationFix::new(identity.clone(), latitude, longitude));

    let store = HttpLocationStore::new(store_config.base_url, store_config.api_key);

    let config = SchedulerConfig::new(identity)
        .with_radius_meters(radius_meters)
        .with_interval(Duration::from_secs(interval_secs));

    println!("Syncing as {:?}", config.identity);
    println!(
        "  Position: {latitude:.5}, {longitude:.5}  (radius {radius_meters:.0} m, every {interval_secs}s)"
    );
    println!("Press Ctrl-C to stop.");
    println!();

    let handle = SyncScheduler::new(config, source, store, TerminalDispatcher).spawn();
    let mut nearby = handle.subscribe();
    let mut errors = handle.last_error();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = nearby.changed() => {
                if changed.is_err() {
                    break;
                }
                let set = nearby.borrow_and_update().clone();
                if set.is_empty() {
                    println!("Nearby: nobody in range");
                } else {
                    let names: Vec<&str> =
                        set.identities().iter().map(|i| i.as_str()).collect();
                    println!("Nearby: {}", names.join(", "));
                }
            }
            changed = errors.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(error) = errors.borrow_and_update().clone() {
                    tracing::warn!(%error, "sync cycle degraded");
                }
            }
        }
    }

    println!();
    println!("Stopping...");
    handle.stop().await;

    Ok(())
}
