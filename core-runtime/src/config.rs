//! # Core Configuration Module
//!
//! Collects the platform bridges the playback core is built on.
//!
//! ## Overview
//!
//! [`CoreConfig`] is assembled through [`CoreConfigBuilder`] and validated
//! fail-fast: a missing required bridge is reported as
//! [`Error::CapabilityMissing`] naming the capability and how to provide it,
//! before any playback object is constructed.
//!
//! ## Required Bridges
//!
//! - `TransportFactory` - builds the decoder/streamer for a playlist
//! - `AudioFocusManager` - OS audio focus
//! - `NotificationSurface` - foreground notification
//! - `MediaSessionSurface` - lock screen / remote controls
//!
//! ## Optional Bridges
//!
//! - `AudioRouteMonitor` - headphone unplug detection
//! - `RemoteStore` - catalog source (or `catalog_url` with desktop shims)
//! - `LoggerSink` - host log forwarding
//!
//! When the `desktop-shims` feature is enabled every missing bridge is filled
//! with its `bridge-desktop` counterpart.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .transport_factory(Arc::new(ExoTransportFactory::new(ctx)))
//!     .focus_manager(Arc::new(AndroidAudioFocus::new(ctx)))
//!     .notification_surface(Arc::new(PlayerNotification::new(ctx)))
//!     .media_session(Arc::new(SessionCompat::new(ctx)))
//!     .route_monitor(Arc::new(NoisyReceiver::new(ctx)))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{
    AudioFocusManager, AudioRouteMonitor, LoggerSink, MediaSessionSurface, NotificationSurface,
    RemoteStore, TransportFactory,
};
use std::sync::Arc;

/// Bridges and settings the core is constructed from.
#[derive(Clone)]
pub struct CoreConfig {
    pub transport_factory: Arc<dyn TransportFactory>,
    pub focus_manager: Arc<dyn AudioFocusManager>,
    pub notification_surface: Arc<dyn NotificationSurface>,
    pub media_session: Arc<dyn MediaSessionSurface>,
    pub route_monitor: Option<Arc<dyn AudioRouteMonitor>>,
    pub remote_store: Option<Arc<dyn RemoteStore>>,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Per-subscriber buffer of the event bus.
    pub event_buffer_size: usize,
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("transport_factory", &"TransportFactory { ... }")
            .field("focus_manager", &"AudioFocusManager { ... }")
            .field("notification_surface", &"NotificationSurface { ... }")
            .field("media_session", &"MediaSessionSurface { ... }")
            .field(
                "route_monitor",
                &self.route_monitor.as_ref().map(|_| "AudioRouteMonitor { ... }"),
            )
            .field(
                "remote_store",
                &self.remote_store.as_ref().map(|_| "RemoteStore { ... }"),
            )
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("event_buffer_size", &self.event_buffer_size)
            .field("features", &self.features)
            .finish()
    }
}

/// Optional behaviour toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Pause when output is about to switch to the speaker. Requires an
    /// `AudioRouteMonitor`.
    pub pause_on_becoming_noisy: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            pause_on_becoming_noisy: true,
        }
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Checks settings that depend on each other.
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.features.pause_on_becoming_noisy && self.route_monitor.is_none() {
            return Err(Error::Config(
                "Pause on becoming noisy enabled but no AudioRouteMonitor provided. \
                 Disable the feature or inject an AudioRouteMonitor implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg_attr(feature = "desktop-shims", allow(dead_code))]
fn capability_missing(capability: &str, purpose: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required {}. \
             Desktop: enable the 'desktop-shims' feature to use the bridge-desktop default. \
             Mobile: inject the platform-native adapter.",
            capability, purpose
        ),
    }
}

#[cfg(feature = "desktop-shims")]
mod defaults {
    use super::*;
    use bridge_desktop::{
        DesktopAudioFocus, DesktopRouteMonitor, HeadlessTransportFactory, HttpRemoteStore,
        TracingMediaSession, TracingNotificationSurface,
    };

    pub fn transport_factory() -> Result<Arc<dyn TransportFactory>> {
        Ok(Arc::new(HeadlessTransportFactory::new()))
    }

    pub fn focus_manager() -> Result<Arc<dyn AudioFocusManager>> {
        Ok(Arc::new(DesktopAudioFocus::new()))
    }

    pub fn notification_surface() -> Result<Arc<dyn NotificationSurface>> {
        Ok(Arc::new(TracingNotificationSurface::new()))
    }

    pub fn media_session() -> Result<Arc<dyn MediaSessionSurface>> {
        Ok(Arc::new(TracingMediaSession::new()))
    }

    pub fn route_monitor() -> Option<Arc<dyn AudioRouteMonitor>> {
        Some(Arc::new(DesktopRouteMonitor::new()))
    }

    pub fn remote_store(url: &str) -> Result<Arc<dyn RemoteStore>> {
        let store = HttpRemoteStore::new(url).map_err(|e| {
            Error::Internal(format!("Failed to initialize default RemoteStore: {}", e))
        })?;
        Ok(Arc::new(store))
    }
}

#[cfg(not(feature = "desktop-shims"))]
mod defaults {
    use super::*;

    pub fn transport_factory() -> Result<Arc<dyn TransportFactory>> {
        Err(capability_missing(
            "TransportFactory",
            "to decode or stream playlist media",
        ))
    }

    pub fn focus_manager() -> Result<Arc<dyn AudioFocusManager>> {
        Err(capability_missing(
            "AudioFocusManager",
            "to request and abandon audio focus",
        ))
    }

    pub fn notification_surface() -> Result<Arc<dyn NotificationSurface>> {
        Err(capability_missing(
            "NotificationSurface",
            "to show the foreground playback notification",
        ))
    }

    pub fn media_session() -> Result<Arc<dyn MediaSessionSurface>> {
        Err(capability_missing(
            "MediaSessionSurface",
            "to publish playback state to system controls",
        ))
    }

    pub fn route_monitor() -> Option<Arc<dyn AudioRouteMonitor>> {
        None
    }

    pub fn remote_store(_url: &str) -> Result<Arc<dyn RemoteStore>> {
        Err(capability_missing(
            "RemoteStore",
            "when a catalog URL is configured",
        ))
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    transport_factory: Option<Arc<dyn TransportFactory>>,
    focus_manager: Option<Arc<dyn AudioFocusManager>>,
    notification_surface: Option<Arc<dyn NotificationSurface>>,
    media_session: Option<Arc<dyn MediaSessionSurface>>,
    route_monitor: Option<Arc<dyn AudioRouteMonitor>>,
    remote_store: Option<Arc<dyn RemoteStore>>,
    catalog_url: Option<String>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    event_buffer_size: Option<usize>,
    features: Option<FeatureFlags>,
}

impl CoreConfigBuilder {
    /// Sets the transport factory (required).
    pub fn transport_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.transport_factory = Some(factory);
        self
    }

    /// Sets the audio focus manager (required).
    pub fn focus_manager(mut self, manager: Arc<dyn AudioFocusManager>) -> Self {
        self.focus_manager = Some(manager);
        self
    }

    /// Sets the notification surface (required).
    pub fn notification_surface(mut self, surface: Arc<dyn NotificationSurface>) -> Self {
        self.notification_surface = Some(surface);
        self
    }

    /// Sets the media session surface (required).
    pub fn media_session(mut self, session: Arc<dyn MediaSessionSurface>) -> Self {
        self.media_session = Some(session);
        self
    }

    pub fn route_monitor(mut self, monitor: Arc<dyn AudioRouteMonitor>) -> Self {
        self.route_monitor = Some(monitor);
        self
    }

    pub fn remote_store(mut self, store: Arc<dyn RemoteStore>) -> Self {
        self.remote_store = Some(store);
        self
    }

    /// Base URL of the catalog database. Only used when no `RemoteStore` is
    /// injected and the desktop shims are available.
    pub fn catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = Some(url.into());
        self
    }

    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Default: [`DEFAULT_EVENT_BUFFER_SIZE`].
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = Some(features);
        self
    }

    pub fn pause_on_becoming_noisy(mut self, enabled: bool) -> Self {
        self.features
            .get_or_insert_with(FeatureFlags::default)
            .pause_on_becoming_noisy = enabled;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge was not injected
    ///   and no desktop default is available
    /// - [`Error::Config`] when settings are inconsistent
    pub fn build(self) -> Result<CoreConfig> {
        let transport_factory = match self.transport_factory {
            Some(factory) => factory,
            None => defaults::transport_factory()?,
        };
        let focus_manager = match self.focus_manager {
            Some(manager) => manager,
            None => defaults::focus_manager()?,
        };
        let notification_surface = match self.notification_surface {
            Some(surface) => surface,
            None => defaults::notification_surface()?,
        };
        let media_session = match self.media_session {
            Some(session) => session,
            None => defaults::media_session()?,
        };
        let route_monitor = self.route_monitor.or_else(defaults::route_monitor);
        let remote_store = match (self.remote_store, self.catalog_url) {
            (Some(store), _) => Some(store),
            (None, Some(url)) => Some(defaults::remote_store(&url)?),
            (None, None) => None,
        };

        // Noisy-pause follows the route monitor unless set explicitly.
        let features = match self.features {
            Some(features) => features,
            None => FeatureFlags {
                pause_on_becoming_noisy: route_monitor.is_some(),
            },
        };

        let config = CoreConfig {
            transport_factory,
            focus_manager,
            notification_surface,
            media_session,
            route_monitor,
            remote_store,
            logger_sink: self.logger_sink,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            features,
        };

        config.validate()?;

        Ok(config)
    }
}
