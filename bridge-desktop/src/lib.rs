//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! Desktop builds have no OS audio focus, no lock-screen media session and no
//! mandatory foreground notification, so most shims here are thin: they
//! record what the core asked for and log it through `tracing`.
//! - `RemoteStore` over HTTPS using `reqwest` ([`HttpRemoteStore`])
//! - `AudioFocusManager` that always grants ([`DesktopAudioFocus`])
//! - `NotificationSurface` / `MediaSessionSurface` that log ([`TracingNotificationSurface`], [`TracingMediaSession`])
//! - `AudioRouteMonitor` fed by the host ([`DesktopRouteMonitor`])
//! - `TransportFactory` producing wall-clock transports that render no audio ([`HeadlessTransportFactory`])
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HeadlessTransportFactory, HttpRemoteStore};
//!
//! let store = HttpRemoteStore::new("https://example-db.firebaseio.com")?;
//! let transports = HeadlessTransportFactory::new();
//! // Hand both to CoreConfig::builder()
//! ```

mod focus;
mod http;
mod route;
mod surfaces;
mod transport;

pub use focus::DesktopAudioFocus;
pub use http::HttpRemoteStore;
pub use route::DesktopRouteMonitor;
pub use surfaces::{TracingMediaSession, TracingNotificationSurface};
pub use transport::{HeadlessTransport, HeadlessTransportFactory};
