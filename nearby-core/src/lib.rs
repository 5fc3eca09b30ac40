//! # nearby-core
//!
//! Pure logic for nearby-sync (no I/O, instant tests).
//!
//! This crate implements the geometry, filtering, deduplication, and the
//! cycle state machine without any network or clock access, enabling fast
//! unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce
//! output without side effects. The actual I/O (store upserts, peer
//! fetches, alert dispatch) is performed by `nearby-client`, which
//! interprets the actions produced by the cycle state machine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cycle;
pub mod dedup;
pub mod geo;
pub mod proximity;

pub use cycle::{CycleAction, CycleEvent, CyclePhase, SchedulerEvent};
pub use dedup::NotifiedSet;
pub use geo::distance_meters;
pub use proximity::evaluate;
