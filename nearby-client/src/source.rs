//! Location source abstraction.
//!
//! The device's location-fix provider is an external collaborator: fixes
//! arrive at a platform-determined cadence the loop does not control. The
//! scheduler only ever reads the latest known fix, so the trait is
//! synchronous.

use std::sync::{Arc, Mutex};

use nearby_types::LocationFix;

/// Authorization state of the platform's location provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationState {
    /// The user has not been asked yet.
    #[default]
    Undetermined,
    /// The user denied (or revoked) access. The source silently stops
    /// producing fixes; callers treat a missing fix as degraded, not fatal.
    Denied,
    /// Access granted; fixes arrive at the platform's cadence.
    Authorized,
}

/// Supplies the most recent known position of the local device.
pub trait LocationSource: Send + Sync {
    /// The latest fix, or `None` if no fix is available yet.
    fn current_fix(&self) -> Option<LocationFix>;

    /// Current authorization state.
    fn authorization_state(&self) -> AuthorizationState;

    /// Ask the platform to prompt for location access.
    ///
    /// Asynchronous in effect: the answer shows up later as a change in
    /// [`LocationSource::authorization_state`].
    fn request_authorization(&self);
}

/// Shared-state location source.
///
/// The platform glue (or a test) holds one clone and feeds it via
/// [`SharedLocationSource::publish_fix`]; the scheduler holds another and
/// reads. Clones share state.
#[derive(Debug, Default)]
pub struct SharedLocationSource {
    inner: Arc<Mutex<SharedSourceInner>>,
}

#[derive(Debug, Default)]
struct SharedSourceInner {
    fix: Option<LocationFix>,
    authorization: AuthorizationState,
    authorization_requested: bool,
}

impl SharedLocationSource {
    /// Create a source with no fix and undetermined authorization.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new latest fix (platform side).
    pub fn publish_fix(&self, fix: LocationFix) {
        let mut inner = self.inner.lock().unwrap();
        inner.fix = Some(fix);
    }

    /// Drop the current fix, e.g. when permission is revoked.
    pub fn clear_fix(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fix = None;
    }

    /// Update the authorization state (platform side).
    pub fn set_authorization(&self, state: AuthorizationState) {
        let mut inner = self.inner.lock().unwrap();
        inner.authorization = state;
    }

    /// Whether [`LocationSource::request_authorization`] has been called.
    ///
    /// The platform glue polls this to know when to show the prompt.
    pub fn authorization_requested(&self) -> bool {
        self.inner.lock().unwrap().authorization_requested
    }
}

impl Clone for SharedLocationSource {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl LocationSource for SharedLocationSource {
    fn current_fix(&self) -> Option<LocationFix> {
        self.inner.lock().unwrap().fix.clone()
    }

    fn authorization_state(&self) -> AuthorizationState {
        self.inner.lock().unwrap().authorization
    }

    fn request_authorization(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.authorization_requested = true;
    }
}
