//! Catalog fetch service
//!
//! Reads the catalog document once per request. There is no retry loop and
//! no live subscription: a failure is reported on the event bus and returned
//! to the caller, who decides whether to ask again.

use crate::error::{FetchError, Result};
use crate::models::{Catalog, PlayList};
use bridge_traits::RemoteStore;
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

pub struct CatalogService {
    store: Arc<dyn RemoteStore>,
    event_bus: EventBus,
    /// Serializes fetches and holds the last catalog that loaded.
    latest: Mutex<Option<Arc<Catalog>>>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn RemoteStore>, event_bus: EventBus) -> Self {
        Self {
            store,
            event_bus,
            latest: Mutex::new(None),
        }
    }

    /// Fetch and parse the catalog.
    ///
    /// Emits `CatalogEvent::Loading` before the request and exactly one of
    /// `Loaded` / `Failed` after it. Concurrent callers queue behind each
    /// other.
    #[instrument(skip(self))]
    pub async fn fetch_catalog(&self) -> Result<Arc<Catalog>> {
        let mut latest = self.latest.lock().await;
        self.emit(CatalogEvent::Loading);

        let outcome = match self.store.fetch_root().await {
            Ok(root) => parse_root(root),
            Err(err) => Err(FetchError::from(err)),
        };

        match outcome {
            Ok(catalog) => {
                info!(playlists = catalog.len(), "Catalog loaded");
                let catalog = Arc::new(catalog);
                *latest = Some(catalog.clone());
                self.emit(CatalogEvent::Loaded {
                    playlist_count: catalog.len(),
                });
                Ok(catalog)
            }
            Err(err) => {
                warn!(error = %err, "Catalog fetch failed");
                self.emit(CatalogEvent::Failed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Last catalog that loaded successfully.
    pub async fn current(&self) -> Option<Arc<Catalog>> {
        self.latest.lock().await.clone()
    }

    fn emit(&self, event: CatalogEvent) {
        self.event_bus.emit(CoreEvent::Catalog(event)).ok();
    }
}

/// Interpret the root document.
///
/// The playlists are the children of the root's first child. Children of an
/// object come in store key order (integer keys numerically first), children of an array in index order; `null`
/// slots left by deleted entries are skipped.
pub fn parse_root(root: Option<Value>) -> Result<Catalog> {
    let root = root.ok_or_else(|| FetchError::Empty("data does not exist".to_string()))?;
    if root.is_null() {
        return Err(FetchError::Empty("data does exist but is null".to_string()));
    }

    let first = children(&root)
        .ok_or_else(|| FetchError::Malformed("root is not a collection".to_string()))?
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Malformed("root has no children".to_string()))?;

    let entries = children(first)
        .ok_or_else(|| FetchError::Malformed("playlist node is not a collection".to_string()))?;

    let playlists = entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| {
            serde_json::from_value::<PlayList>(entry.clone()).map_err(|e| {
                FetchError::Malformed(format!("playlist #{} is invalid: {}", position, e))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(count = playlists.len(), "Parsed catalog document");
    Ok(Catalog::new(playlists))
}

fn children(node: &Value) -> Option<Vec<&Value>> {
    match node {
        Value::Array(items) => Some(items.iter().filter(|v| !v.is_null()).collect()),
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().filter(|(_, v)| !v.is_null()).collect();
            entries.sort_by(|(a, _), (b, _)| key_order(a, b));
            Some(entries.into_iter().map(|(_, v)| v).collect())
        }
        _ => None,
    }
}

/// Store key order: integer keys first by value, then the rest
/// lexicographically.
fn key_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
