//! Error taxonomy for the proximity sync loop.

use thiserror::Error;

/// Errors surfaced by a sync cycle.
///
/// None of these are fatal: the scheduler abandons the current cycle and
/// retries at the next tick. The variants are `Clone + PartialEq` so the
/// scheduler can publish the last error on a watch channel for the
/// surrounding application to render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NearbyError {
    /// No location fix is available yet (permission missing or no reading).
    /// A degraded condition, not a failure - the cycle is deferred.
    #[error("no location fix available")]
    PermissionUnavailable,

    /// The remote location store could not be reached or rejected a request.
    #[error("location store unreachable: {0}")]
    StoreUnreachable(String),

    /// The store returned peer data that could not be decoded.
    #[error("malformed peer data: {0}")]
    DecodeFailure(String),

    /// Notification delivery failed. Logged only; deduplication state is
    /// unaffected (delivery is at-most-once, best effort).
    #[error("alert dispatch failed: {0}")]
    DispatchFailure(String),
}
