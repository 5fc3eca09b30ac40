//! # nearby-client
//!
//! Client library for the nearby-sync proximity loop.
//!
//! # Architecture
//!
//! The scheduler drives a pure state machine (from nearby-core) and
//! interprets its actions to perform actual I/O via three narrow,
//! constructor-injected collaborator traits:
//!
//! ```text
//! Application -> SyncScheduler -> LocationSource   (latest device fix)
//!                     |        -> LocationStore    (shared remote store)
//!                     |        -> NotificationDispatcher (user alerts)
//!                nearby-core (pure state machine)
//! ```
//!
//! Each collaborator has a shared-state implementation suitable for
//! tests and for platform glue, so the whole loop can be exercised
//! without a network.
//!
//! # Example
//!
//! ```ignore
//! use nearby_client::{
//!     HttpLocationStore, SchedulerConfig, SharedLocationSource, SyncScheduler,
//! };
//! use nearby_types::{Identity, LocationFix};
//!
//! let identity = Identity::random();
//! let source = SharedLocationSource::new();
//! source.publish_fix(LocationFix::new(identity.clone(), 37.0, -122.0));
//!
//! let store = HttpLocationStore::new("https://store.example.com/rest/v1", "api-key");
//! let scheduler = SyncScheduler::new(
//!     SchedulerConfig::new(identity),
//!     source,
//!     store,
//!     my_dispatcher,
//! );
//! let handle = scheduler.spawn();
//! let mut nearby = handle.subscribe();
//! // ... render *nearby.borrow() whenever it changes ...
//! handle.stop().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod dispatch;
mod scheduler;
mod source;
mod store;

pub use dispatch::{DispatchError, MockDispatcher, NotificationDispatcher};
pub use scheduler::{
    SchedulerConfig, SchedulerHandle, SyncScheduler, DEFAULT_INTERVAL, DEFAULT_RADIUS_METERS,
};
pub use source::{AuthorizationState, LocationSource, SharedLocationSource};
pub use store::{HttpLocationStore, LocationStore, MockLocationStore, StoreError};
