//! Notification dispatch abstraction.
//!
//! The OS notification channel is an external collaborator; from the
//! loop's perspective dispatch is fire-and-forget. Failures are logged by
//! the scheduler and never roll back deduplication state.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nearby_types::Identity;
use thiserror::Error;

/// Dispatch errors.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The delivery channel rejected or dropped the alert.
    #[error("dispatch failed: {0}")]
    Failed(String),
}

/// Delivers a user-visible alert for a nearby peer.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver an alert naming the given peer.
    async fn dispatch(&self, identity: &Identity) -> Result<(), DispatchError>;
}

/// Mock dispatcher for testing.
///
/// Captures dispatched identities for verification and supports forced
/// failure injection.
#[derive(Debug, Default)]
pub struct MockDispatcher {
    inner: Arc<Mutex<MockDispatcherInner>>,
}

#[derive(Debug, Default)]
struct MockDispatcherInner {
    dispatched: Vec<Identity>,
    fail_next: Option<String>,
}

impl MockDispatcher {
    /// Create a new mock dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// All identities that were dispatched, in order.
    pub fn dispatched(&self) -> Vec<Identity> {
        self.inner.lock().unwrap().dispatched.clone()
    }

    /// Number of alerts dispatched so far.
    pub fn dispatch_count(&self) -> usize {
        self.inner.lock().unwrap().dispatched.len()
    }

    /// Cause the next dispatch() to fail with the given error.
    pub fn fail_next(&self, error: &str) {
        self.inner.lock().unwrap().fail_next = Some(error.to_string());
    }

    /// Clear captured state.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockDispatcherInner::default();
    }
}

impl Clone for MockDispatcher {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl NotificationDispatcher for MockDispatcher {
    async fn dispatch(&self, identity: &Identity) -> Result<(), DispatchError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.fail_next.take() {
            return Err(DispatchError::Failed(error));
        }

        inner.dispatched.push(identity.clone());
        Ok(())
    }
}
