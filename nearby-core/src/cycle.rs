//! Cycle state machine for the proximity sync loop.
//!
//! This module provides a pure, side-effect-free state machine for one
//! upload -> fetch -> evaluate -> notify pass. The state machine takes
//! events as input and produces a new phase plus a list of actions to
//! execute.
//!
//! The actual I/O (store upserts, peer fetches, alert dispatch) is
//! performed by nearby-client, not by this module. This enables instant
//! unit testing without network mocks.

use nearby_types::{LocationFix, NearbyError, NearbySet, PeerLocation};

/// Cycle state machine - NO I/O, just phase transitions.
///
/// A cycle fails fast: any upload or fetch failure returns straight to
/// `Idle` without touching the published nearby set or the notified set.
#[derive(Debug, Clone, PartialEq)]
pub enum CyclePhase {
    /// Waiting for the next periodic tick.
    Idle,
    /// Upserting the local fix to the store.
    Uploading {
        /// The fix being uploaded.
        fix: LocationFix,
    },
    /// Listing all peer positions from the store.
    Fetching {
        /// The fix the snapshot will be evaluated against.
        fix: LocationFix,
    },
    /// Filtering the peer snapshot down to peers in radius.
    Evaluating {
        /// The local fix.
        fix: LocationFix,
        /// The fetched peer snapshot.
        peers: Vec<PeerLocation>,
    },
    /// Dispatching alerts for newly-nearby peers.
    Notifying {
        /// The freshly evaluated nearby set.
        nearby: NearbySet,
    },
    /// Terminal: the scheduler was stopped. No further cycles run.
    Stopped,
}

impl CyclePhase {
    /// Create a new state machine in the Idle phase.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new phase plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller
    /// (nearby-client's scheduler) is responsible for executing the
    /// returned actions in order.
    pub fn on_event(self, event: CycleEvent) -> (Self, Vec<CycleAction>) {
        match (self, event) {
            // Stop wins from any phase.
            (_, CycleEvent::StopRequested) => (Self::Stopped, vec![CycleAction::CancelTick]),
            (Self::Stopped, _) => (Self::Stopped, vec![]),

            // From Idle: a tick either starts a cycle or defers it.
            (Self::Idle, CycleEvent::Tick { fix: Some(fix) }) => (
                Self::Uploading { fix: fix.clone() },
                vec![CycleAction::Upload { fix }],
            ),
            (Self::Idle, CycleEvent::Tick { fix: None }) => (
                Self::Idle,
                vec![CycleAction::EmitEvent(SchedulerEvent::CycleDeferred)],
            ),

            // From Uploading
            (Self::Uploading { fix }, CycleEvent::UploadSucceeded) => {
                (Self::Fetching { fix }, vec![CycleAction::Fetch])
            }
            (Self::Uploading { .. }, CycleEvent::UploadFailed { error }) => (
                Self::Idle,
                vec![CycleAction::EmitEvent(SchedulerEvent::CycleFailed {
                    error,
                })],
            ),

            // From Fetching
            (Self::Fetching { fix }, CycleEvent::FetchSucceeded { peers }) => (
                Self::Evaluating {
                    fix: fix.clone(),
                    peers: peers.clone(),
                },
                vec![CycleAction::Evaluate { fix, peers }],
            ),
            (Self::Fetching { .. }, CycleEvent::FetchFailed { error }) => (
                Self::Idle,
                vec![CycleAction::EmitEvent(SchedulerEvent::CycleFailed {
                    error,
                })],
            ),

            // From Evaluating: publish the new set whether or not any alert
            // fires, then dispatch alerts for newly-nearby peers.
            (Self::Evaluating { .. }, CycleEvent::Evaluated { nearby }) => (
                Self::Notifying {
                    nearby: nearby.clone(),
                },
                vec![
                    CycleAction::PublishNearby {
                        nearby: nearby.clone(),
                    },
                    CycleAction::Notify { nearby },
                ],
            ),

            // From Notifying
            (Self::Notifying { nearby }, CycleEvent::NotifyCompleted) => (
                Self::Idle,
                vec![CycleAction::EmitEvent(SchedulerEvent::CycleCompleted {
                    nearby: nearby.len(),
                })],
            ),

            // Invalid transitions - stay in current phase
            (phase, _) => (phase, vec![]),
        }
    }

    /// Check if the machine is waiting for the next tick.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Check if the machine has been stopped.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl Default for CyclePhase {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that drive the cycle state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleEvent {
    /// The periodic tick fired, carrying the latest known fix (if any).
    Tick {
        /// The latest fix from the location source, or `None` if no fix
        /// is available yet (cycle defers).
        fix: Option<LocationFix>,
    },
    /// The store accepted the upsert.
    UploadSucceeded,
    /// The upsert failed.
    UploadFailed {
        /// What went wrong.
        error: NearbyError,
    },
    /// The store returned the full peer snapshot.
    FetchSucceeded {
        /// All stored peer positions.
        peers: Vec<PeerLocation>,
    },
    /// The list operation failed.
    FetchFailed {
        /// What went wrong.
        error: NearbyError,
    },
    /// Proximity evaluation finished.
    Evaluated {
        /// Peers currently within radius, in discovery order.
        nearby: NearbySet,
    },
    /// Alert dispatch finished for this cycle.
    NotifyCompleted,
    /// The scheduler was asked to stop.
    StopRequested,
}

/// Actions to be executed by the scheduler.
///
/// These are instructions, not side effects. The scheduler interprets
/// these and performs the actual I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleAction {
    /// Upsert the fix's coordinates under the local identity.
    Upload {
        /// The fix to upload.
        fix: LocationFix,
    },
    /// List all peer positions from the store.
    Fetch,
    /// Run the proximity evaluator over the snapshot.
    Evaluate {
        /// The local fix.
        fix: LocationFix,
        /// The fetched peer snapshot.
        peers: Vec<PeerLocation>,
    },
    /// Publish the new nearby set to observers (replaces the prior value).
    PublishNearby {
        /// The set to publish.
        nearby: NearbySet,
    },
    /// Dispatch alerts for peers that have not alerted this session.
    Notify {
        /// The set to run deduplication over.
        nearby: NearbySet,
    },
    /// Cancel the pending periodic tick.
    CancelTick,
    /// Report a scheduler-level event.
    EmitEvent(SchedulerEvent),
}

/// Events reported to the scheduler's observers/log.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    /// No fix was available; the cycle was a no-op (degraded, not failed).
    CycleDeferred,
    /// The cycle was abandoned at upload or fetch; retried next tick.
    CycleFailed {
        /// What went wrong.
        error: NearbyError,
    },
    /// A full cycle completed.
    CycleCompleted {
        /// How many peers are currently within radius.
        nearby: usize,
    },
}
