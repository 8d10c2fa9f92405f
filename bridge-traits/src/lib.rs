//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the
//! platform it runs on. Each trait is a capability the core needs but cannot
//! provide itself: audio output, OS audio focus, the foreground notification,
//! the media session shown on lock screens, audio route changes and the
//! remote catalog store.
//!
//! ## Traits
//!
//! ### Playback
//! - [`TransportFactory`](transport::TransportFactory) / [`MediaTransport`](transport::MediaTransport) - Decoder/streamer driven by the core
//! - [`AudioFocusManager`](focus::AudioFocusManager) - OS audio focus request/abandon
//! - [`AudioRouteMonitor`](route::AudioRouteMonitor) - Headphone unplug ("becoming noisy")
//!
//! ### Presentation
//! - [`NotificationSurface`](notification::NotificationSurface) - Foreground notification
//! - [`MediaSessionSurface`](media_session::MediaSessionSurface) - Lock screen / remote controls
//!
//! ### Data & Utilities
//! - [`RemoteStore`](remote_store::RemoteStore) - Catalog document fetch
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Callbacks
//!
//! Platform callbacks (focus changes, transport status, becoming noisy) are
//! delivered through the `*Listener` traits. The core's listeners only
//! enqueue a message for its coordinator; they never mutate state in place,
//! so hosts may invoke them from any thread.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations should convert their native errors and keep messages
//! actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared across
//! async tasks.

pub mod error;
pub mod focus;
pub mod media_session;
pub mod notification;
pub mod playback;
pub mod remote_store;
pub mod route;
pub mod time;
pub mod transport;

pub use error::BridgeError;

// Re-export commonly used types
pub use focus::{AudioFocusManager, FocusChange, FocusChangeListener, FocusRequestResult};
pub use media_session::MediaSessionSurface;
pub use notification::{NotificationContent, NotificationHandle, NotificationSurface};
pub use playback::{PlaybackActions, PlaybackState, RepeatMode, SessionMetadata, ShuffleMode};
pub use remote_store::RemoteStore;
pub use route::{AudioRouteMonitor, BecomingNoisyListener};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, SystemClock};
pub use transport::{MediaTransport, TransportFactory, TransportListener, TransportStatus};
