//! Remote catalog store over HTTPS using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    remote_store::RemoteStore,
};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Reads the catalog document from a REST-style JSON database.
///
/// The root is fetched with a single `GET {base_url}/.json`. A `404` maps to
/// "root does not exist"; a literal `null` body is returned as
/// `Value::Null`.
pub struct HttpRemoteStore {
    client: Client,
    root_url: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent("cadence-playback-core/0.1.0")
            .build()
            .map_err(|e| {
                BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl AsRef<str>) -> Self {
        Self {
            client,
            root_url: Self::root_url(base_url.as_ref()),
        }
    }

    fn root_url(base_url: &str) -> String {
        format!("{}/.json", base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch_root(&self) -> Result<Option<serde_json::Value>> {
        debug!(url = %self.root_url, "Fetching catalog root");

        let response = self.client.get(&self.root_url).send().await.map_err(|e| {
            warn!(error = %e, "Catalog request failed");
            if e.is_timeout() {
                BridgeError::RemoteStore("Request timed out".to_string())
            } else if e.is_connect() {
                BridgeError::RemoteStore(format!("Connection failed: {}", e))
            } else {
                BridgeError::RemoteStore(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "Catalog request rejected");
            return Err(BridgeError::RemoteStore(format!("HTTP {} error", status)));
        }

        let value = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| BridgeError::RemoteStore(format!("Invalid JSON body: {}", e)))?;

        Ok(Some(value))
    }
}
