//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (transport, audio
//! focus, notification, media session, route monitor, catalog store) into
//! the playback core and exposes the three entry points a host app binds to:
//! the [`SessionHost`] for media-button and transport-control actions, the
//! [`RemoteControlSurface`] for in-app UI, and the catalog fetch. Desktop
//! apps typically enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`) to fill in any bridge they do not inject.

pub mod error;
pub mod host;
pub mod remote;

pub use error::{CoreError, Result};
pub use host::{ActionArgs, MediaAction, SessionHost};
pub use remote::{RemoteControlSurface, SurfaceState};

use std::sync::Arc;

use core_catalog::{Catalog, CatalogService};
use core_playback::{PlaybackBridges, PlaybackConfig};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use core_runtime::logging::{init_logging, LoggingConfig};
use tracing::{info, warn};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    event_bus: EventBus,
    catalog: Option<Arc<CatalogService>>,
    host: Arc<SessionHost>,
    remote: Arc<RemoteControlSurface>,
}

impl CoreService {
    /// Create a service from a validated configuration. Must be called
    /// inside a tokio runtime.
    pub fn new(config: CoreConfig, playback: PlaybackConfig) -> Result<Self> {
        config.validate()?;
        playback.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);
        let catalog = config
            .remote_store
            .clone()
            .map(|store| Arc::new(CatalogService::new(store, event_bus.clone())));
        let host = Arc::new(SessionHost::new(
            PlaybackBridges::from_config(&config),
            event_bus.clone(),
            playback,
        ));
        let remote = Arc::new(RemoteControlSurface::new(host.clone(), event_bus.clone()));

        info!(
            catalog = catalog.is_some(),
            pause_on_becoming_noisy = config.features.pause_on_becoming_noisy,
            "Core service initialized"
        );

        Ok(Self {
            event_bus,
            catalog,
            host,
            remote,
        })
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Stream of every core event, optionally filtered by the caller.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    pub fn host(&self) -> &Arc<SessionHost> {
        &self.host
    }

    pub fn remote(&self) -> &Arc<RemoteControlSurface> {
        &self.remote
    }

    /// Fetch the catalog and make it available for action resolution.
    pub async fn fetch_catalog(&self) -> Result<Arc<Catalog>> {
        let service = self
            .catalog
            .as_ref()
            .ok_or_else(|| CoreError::CapabilityMissing {
                capability: "RemoteStore".to_string(),
                message: "inject a RemoteStore or set a catalog URL to fetch the catalog"
                    .to_string(),
            })?;

        let catalog = service.fetch_catalog().await?;
        self.host.install_catalog(catalog.clone());
        Ok(catalog)
    }

    /// Stop following events, end any session and release the media
    /// session.
    pub async fn shutdown(&self) {
        self.remote.disconnect();
        self.host.shutdown().await;
    }
}

/// Install logging, then build the service.
///
/// The logger sink from `config` is used unless `logging` already names one.
/// A subscriber installed earlier in the process is kept.
pub fn bootstrap(
    config: CoreConfig,
    playback: PlaybackConfig,
    logging: LoggingConfig,
) -> Result<CoreService> {
    let logging = match (&logging.logger_sink, &config.logger_sink) {
        (None, Some(sink)) => logging.with_logger_sink(sink.clone()),
        _ => logging,
    };

    if let Err(e) = init_logging(logging) {
        warn!(error = %e, "Logging already initialized, keeping existing subscriber");
    }

    CoreService::new(config, playback)
}
