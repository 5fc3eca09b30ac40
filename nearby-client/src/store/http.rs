//! HTTP adapter for the remote location store.
//!
//! Speaks the store's JSON-over-HTTPS contract: positions live as rows in
//! a `user_locations` collection under the store's REST base URL. Upsert
//! is a POST of a one-row array with `Prefer: resolution=merge-duplicates`
//! so repeated uploads for the same identity overwrite the prior record;
//! list is an unscoped GET. The API key rides in both the `apikey` and
//! `Authorization` headers, as the store expects.

use nearby_types::{Identity, PeerLocation};
use serde::{Deserialize, Serialize};

use super::{LocationStore, StoreError};

const LOCATIONS_PATH: &str = "user_locations";

/// Outgoing row for an upsert.
#[derive(Debug, Serialize)]
struct UpsertRow<'a> {
    user_id: &'a str,
    latitude: f64,
    longitude: f64,
}

/// One stored row as the store returns it.
///
/// `user_id` and `created_at` are nullable on the wire; a row with a
/// missing or empty `user_id` maps to a peer with no identity, which the
/// evaluator skips.
#[derive(Debug, Deserialize)]
struct StoredRow {
    #[serde(default)]
    user_id: Option<String>,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    created_at: Option<String>,
}

impl StoredRow {
    fn into_peer(self) -> PeerLocation {
        PeerLocation {
            identity: self
                .user_id
                .and_then(|token| Identity::new(token).ok()),
            latitude: self.latitude,
            longitude: self.longitude,
            recorded_at: self.created_at,
        }
    }
}

/// Location store client over JSON/HTTPS.
#[derive(Debug, Clone)]
pub struct HttpLocationStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpLocationStore {
    /// Create a client for the store at `base_url` (the REST root, without
    /// a trailing slash), authenticating with `api_key`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn locations_url(&self) -> String {
        format!("{}/{}", self.base_url, LOCATIONS_PATH)
    }
}

#[async_trait::async_trait]
impl LocationStore for HttpLocationStore {
    async fn upsert(
        &self,
        identity: &Identity,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), StoreError> {
        let rows = [UpsertRow {
            user_id: identity.as_str(),
            latitude,
            longitude,
        }];

        let response = self
            .client
            .post(self.locations_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&rows)
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Rejected(format!("upsert returned {status}")));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<PeerLocation>, StoreError> {
        let response = self
            .client
            .get(self.locations_url())
            .query(&[("select", "*")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Rejected(format!("list returned {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;
        let rows: Vec<StoredRow> =
            serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(rows.into_iter().map(StoredRow::into_peer).collect())
    }
}
