//! Remote location store abstraction.
//!
//! The store is a durable shared map keyed by participant identity,
//! consumed as an opaque read/write API: upsert my position, list
//! everyone's. The list is unscoped - no server-side geo-filtering - so
//! the linear fetch is matched by a linear client-side filter, sized for
//! a friends list rather than a general population.

mod http;
mod mock;

pub use http::HttpLocationStore;
pub use mock::MockLocationStore;

use async_trait::async_trait;
use nearby_types::{Identity, NearbyError, PeerLocation};
use thiserror::Error;

/// Store errors.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be reached (network failure, timeout).
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// The store answered but refused the request.
    #[error("store rejected request: {0}")]
    Rejected(String),

    /// The store's response could not be decoded.
    #[error("malformed store response: {0}")]
    Decode(String),
}

impl From<StoreError> for NearbyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unreachable(msg) | StoreError::Rejected(msg) => {
                NearbyError::StoreUnreachable(msg)
            }
            StoreError::Decode(msg) => NearbyError::DecodeFailure(msg),
        }
    }
}

/// Client contract for the remote location store.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Record (or overwrite) the participant's position. Idempotent:
    /// repeated calls with the same identity replace the prior record.
    async fn upsert(
        &self,
        identity: &Identity,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), StoreError>;

    /// The full current snapshot of all stored positions.
    async fn list(&self) -> Result<Vec<PeerLocation>, StoreError>;
}
