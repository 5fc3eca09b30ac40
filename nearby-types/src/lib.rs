//! # nearby-types
//!
//! Shared data types for the nearby-sync proximity loop.
//!
//! This crate provides the foundational types used across all nearby-sync
//! crates:
//! - [`Identity`] - Opaque participant token
//! - [`LocationFix`], [`PeerLocation`] - Position readings
//! - [`ProximityEvent`], [`NearbySet`] - Per-cycle evaluation output
//! - [`NearbyError`] - Error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod location;

pub use error::NearbyError;
pub use ids::{EmptyIdentity, Identity};
pub use location::{LocationFix, NearbySet, PeerLocation, ProximityEvent};
