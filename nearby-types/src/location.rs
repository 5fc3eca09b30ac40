//! Position readings and per-cycle evaluation output.

use serde::{Deserialize, Serialize};

use crate::Identity;

/// A single timestamped position reading for the local device.
///
/// `captured_at` is the capture time (Unix seconds), not the upload time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// The participant this fix belongs to.
    pub identity: Identity,
    /// Latitude in signed degrees.
    pub latitude: f64,
    /// Longitude in signed degrees.
    pub longitude: f64,
    /// Unix timestamp (seconds) when the position was captured.
    pub captured_at: u64,
}

impl LocationFix {
    /// Create a fix stamped with the current time.
    pub fn new(identity: Identity, latitude: f64, longitude: f64) -> Self {
        Self::at(identity, latitude, longitude, unix_now())
    }

    /// Create a fix with an explicit capture timestamp.
    pub fn at(identity: Identity, latitude: f64, longitude: f64, captured_at: u64) -> Self {
        Self {
            identity,
            latitude,
            longitude,
            captured_at,
        }
    }
}

/// One participant's stored position, as returned by the store's list operation.
///
/// `identity` is optional because the store may hold rows with a missing or
/// empty participant token; the evaluator skips those. `recorded_at` is the
/// store's own bookkeeping timestamp, kept opaque since the store owns its
/// clock and format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerLocation {
    /// The participant this row belongs to, if the store recorded one.
    pub identity: Option<Identity>,
    /// Latitude in signed degrees.
    pub latitude: f64,
    /// Longitude in signed degrees.
    pub longitude: f64,
    /// Store-side timestamp for the row, if present.
    pub recorded_at: Option<String>,
}

impl PeerLocation {
    /// Create a peer row for a known participant.
    pub fn new(identity: Identity, latitude: f64, longitude: f64) -> Self {
        Self {
            identity: Some(identity),
            latitude,
            longitude,
            recorded_at: None,
        }
    }

    /// Create a peer row with no participant token (skipped by evaluation).
    pub fn anonymous(latitude: f64, longitude: f64) -> Self {
        Self {
            identity: None,
            latitude,
            longitude,
            recorded_at: None,
        }
    }
}

/// A peer currently within the configured radius.
///
/// Ephemeral - computed fresh each cycle, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityEvent {
    /// The nearby participant.
    pub identity: Identity,
    /// Great-circle distance from the local fix, in meters.
    pub distance_meters: f64,
}

/// The set of peers currently within radius, ordered by discovery.
///
/// Order is insertion order (the order peers appeared in the store snapshot),
/// not distance. Republished in full every cycle - a new value replaces the
/// previous one, so observers always see a consistent snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NearbySet {
    events: Vec<ProximityEvent>,
}

impl NearbySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from evaluation output, preserving order.
    pub fn from_events(events: Vec<ProximityEvent>) -> Self {
        Self { events }
    }

    /// The events in discovery order.
    pub fn events(&self) -> &[ProximityEvent] {
        &self.events
    }

    /// Number of nearby peers.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no peers are within radius.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether the given participant is in the set.
    pub fn contains(&self, identity: &Identity) -> bool {
        self.events.iter().any(|e| &e.identity == identity)
    }

    /// The identities in the set, in discovery order.
    pub fn identities(&self) -> Vec<&Identity> {
        self.events.iter().map(|e| &e.identity).collect()
    }
}

impl<'a> IntoIterator for &'a NearbySet {
    type Item = &'a ProximityEvent;
    type IntoIter = std::slice::Iter<'a, ProximityEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
