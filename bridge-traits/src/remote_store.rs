//! Remote key/value store holding the catalog document.

use crate::error::Result;

/// Single-shot read of the catalog root.
///
/// `Ok(None)` means the root does not exist. A root that exists but holds
/// `null` is returned as `Ok(Some(Value::Null))`; the two are reported
/// differently to the user.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch_root(&self) -> Result<Option<serde_json::Value>>;
}
