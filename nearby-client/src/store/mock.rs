//! Mock location store for testing.
//!
//! Captures upserts and serves a configurable peer snapshot, with forced
//! failure injection for both operations.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nearby_types::{Identity, PeerLocation};

use super::{LocationStore, StoreError};

/// Mock location store for testing.
#[derive(Debug, Default)]
pub struct MockLocationStore {
    inner: Arc<Mutex<MockStoreInner>>,
}

#[derive(Debug, Default)]
struct MockStoreInner {
    upserts: Vec<(Identity, f64, f64)>,
    peers: Vec<PeerLocation>,
    list_calls: usize,
    fail_next_upsert: Option<StoreError>,
    fail_next_list: Option<StoreError>,
}

impl MockLocationStore {
    /// Create a new mock store with an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot returned by `list()`.
    pub fn set_peers(&self, peers: Vec<PeerLocation>) {
        self.inner.lock().unwrap().peers = peers;
    }

    /// All upserted rows, in order.
    pub fn upserts(&self) -> Vec<(Identity, f64, f64)> {
        self.inner.lock().unwrap().upserts.clone()
    }

    /// How many times `list()` has been called.
    pub fn list_calls(&self) -> usize {
        self.inner.lock().unwrap().list_calls
    }

    /// Cause the next upsert() to fail with the given error.
    pub fn fail_next_upsert(&self, error: StoreError) {
        self.inner.lock().unwrap().fail_next_upsert = Some(error);
    }

    /// Cause the next list() to fail with the given error.
    pub fn fail_next_list(&self, error: StoreError) {
        self.inner.lock().unwrap().fail_next_list = Some(error);
    }

    /// Clear all captured state and the snapshot.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockStoreInner::default();
    }
}

impl Clone for MockLocationStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl LocationStore for MockLocationStore {
    async fn upsert(
        &self,
        identity: &Identity,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.fail_next_upsert.take() {
            return Err(error);
        }

        inner.upserts.push((identity.clone(), latitude, longitude));
        Ok(())
    }

    async fn list(&self) -> Result<Vec<PeerLocation>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.list_calls += 1;

        if let Some(error) = inner.fail_next_list.take() {
            return Err(error);
        }

        Ok(inner.peers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(token: &str) -> Identity {
        Identity::new(token).unwrap()
    }

    #[tokio::test]
    async fn mock_store_captures_upserts() {
        let store = MockLocationStore::new();

        store.upsert(&id("me"), 37.0, -122.0).await.unwrap();
        store.upsert(&id("me"), 37.1, -122.1).await.unwrap();

        let upserts = store.upserts();
        assert_eq!(upserts.len(), 2);
        assert_eq!(upserts[1], (id("me"), 37.1, -122.1));
    }

    #[tokio::test]
    async fn mock_store_serves_configured_snapshot() {
        let store = MockLocationStore::new();
        store.set_peers(vec![PeerLocation::new(id("friend"), 1.0, 2.0)]);

        let peers = store.list().await.unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn forced_upsert_failure_applies_once() {
        let store = MockLocationStore::new();
        store.fail_next_upsert(StoreError::Unreachable("down".into()));

        let result = store.upsert(&id("me"), 0.0, 0.0).await;
        assert!(matches!(result, Err(StoreError::Unreachable(_))));
        assert!(store.upserts().is_empty());

        store.upsert(&id("me"), 0.0, 0.0).await.unwrap();
        assert_eq!(store.upserts().len(), 1);
    }

    #[tokio::test]
    async fn forced_list_failure_applies_once() {
        let store = MockLocationStore::new();
        store.fail_next_list(StoreError::Decode("garbage".into()));

        assert!(matches!(
            store.list().await,
            Err(StoreError::Decode(_))
        ));
        assert!(store.list().await.is_ok());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MockLocationStore::new();
        let clone = store.clone();

        store.upsert(&id("me"), 1.0, 1.0).await.unwrap();
        assert_eq!(clone.upserts().len(), 1);
    }
}
