//! Session-scoped notification deduplication.

use std::collections::HashSet;

use nearby_types::Identity;

/// The set of peers that have already triggered an alert this session.
///
/// Created empty at session start and grows monotonically: an identity is
/// never pruned when its peer leaves range, so a peer who leaves and
/// returns does not re-alert. Cleared only by [`NotifiedSet::reset`]
/// (session end) or process restart.
#[derive(Debug, Clone, Default)]
pub struct NotifiedSet {
    notified: HashSet<Identity>,
}

impl NotifiedSet {
    /// Create an empty set (session start).
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an alert should fire for this identity.
    ///
    /// Check-and-set: the first call for an identity returns `true` and
    /// records it in the same operation, so two evaluations of the same
    /// cycle cannot both fire. Every later call returns `false` for the
    /// remainder of the session.
    pub fn should_alert(&mut self, identity: &Identity) -> bool {
        self.notified.insert(identity.clone())
    }

    /// Whether this identity has already alerted.
    pub fn contains(&self, identity: &Identity) -> bool {
        self.notified.contains(identity)
    }

    /// Number of identities that have alerted this session.
    pub fn len(&self) -> usize {
        self.notified.len()
    }

    /// Whether no alerts have fired yet.
    pub fn is_empty(&self) -> bool {
        self.notified.is_empty()
    }

    /// Clear all recorded identities (explicit session reset).
    pub fn reset(&mut self) {
        self.notified.clear();
    }
}
