//! # Event Bus System
//!
//! Broadcasts typed events from the playback core to every interested
//! observer (remote-control surfaces, host UI bindings, diagnostics) using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: one enum per domain, wrapped by [`CoreEvent`]
//! - **EventBus**: cloneable handle to the broadcast channel
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  emit   ┌───────────┐  subscribe  ┌───────────────────────┐
//! │ CatalogService   ├────────>│           ├────────────>│ RemoteControlSurface  │
//! └──────────────────┘         │ EventBus  │             └───────────────────────┘
//! ┌──────────────────┐  emit   │ (broadcast│  subscribe  ┌───────────────────────┐
//! │ PlaybackCoord.   ├────────>│  channel) ├────────────>│ Host bindings         │
//! └──────────────────┘         └───────────┘             └───────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Playback(PlaybackEvent::ElapsedTime {
//!         position_ms: 1_000,
//!         duration_ms: Some(180_000),
//!     }))
//!     .ok();
//!
//! assert!(stream.recv().await.is_ok());
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Non-fatal;
//!   state mirrors should re-pull a snapshot when they see it.
//! - **`RecvError::Closed`**: every sender is gone, treat as shutdown.
//!
//! Emitting with no subscribers returns an error that publishers ignore
//! (`.ok()`); a playback core with nobody watching is a normal situation.

use bridge_traits::playback::{PlaybackState, RepeatMode, ShuffleMode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Elapsed-time events arrive once per second while playing, so this leaves
/// plenty of room for bursts around track changes.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published through the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Catalog(CatalogEvent),
    Playback(PlaybackEvent),
    Session(SessionEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Catalog(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Session(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Catalog(CatalogEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::FocusDenied) => EventSeverity::Warning,
            CoreEvent::Catalog(CatalogEvent::Loaded { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::StateChanged { .. }) => EventSeverity::Info,
            CoreEvent::Session(SessionEvent::Prepared { .. }) => EventSeverity::Info,
            CoreEvent::Session(SessionEvent::Released { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Catalog Events
// ============================================================================

/// Progress of the one-shot catalog fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CatalogEvent {
    /// A fetch started; presentation layers show a loading indicator.
    Loading,
    Loaded {
        playlist_count: usize,
    },
    /// The fetch failed. Delivered once, there is no retry loop.
    Failed {
        message: String,
    },
}

impl CatalogEvent {
    fn description(&self) -> &str {
        match self {
            CatalogEvent::Loading => "Catalog loading",
            CatalogEvent::Loaded { .. } => "Catalog loaded",
            CatalogEvent::Failed { .. } => "Catalog fetch failed",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Changes to the externally visible playback state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The derived playback state changed.
    StateChanged {
        state: PlaybackState,
        position_ms: u64,
    },
    /// A different track (or the same track with a newly known duration) is
    /// current.
    MetadataChanged {
        track_id: i32,
        track_name: String,
        playlist_id: i32,
        playlist_name: String,
        duration_ms: Option<u64>,
    },
    /// Periodic position update, only emitted while playing and after a
    /// position discontinuity.
    ElapsedTime {
        position_ms: u64,
        duration_ms: Option<u64>,
    },
    RepeatModeChanged {
        mode: RepeatMode,
    },
    ShuffleModeChanged {
        mode: ShuffleMode,
    },
    /// Session extras: the playlist/track pair currently loaded.
    ExtrasChanged {
        playlist_id: i32,
        track_id: i32,
    },
    /// A play request was refused because audio focus was not granted.
    FocusDenied,
    Error {
        message: String,
        /// Whether re-issuing play can recover.
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::StateChanged { .. } => "Playback state changed",
            PlaybackEvent::MetadataChanged { .. } => "Track metadata changed",
            PlaybackEvent::ElapsedTime { .. } => "Elapsed time updated",
            PlaybackEvent::RepeatModeChanged { .. } => "Repeat mode changed",
            PlaybackEvent::ShuffleModeChanged { .. } => "Shuffle mode changed",
            PlaybackEvent::ExtrasChanged { .. } => "Session extras changed",
            PlaybackEvent::FocusDenied => "Audio focus denied",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Session Events
// ============================================================================

/// Lifecycle of the active media session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// A playlist was bound to a fresh transport.
    Prepared {
        session_id: String,
        playlist_id: i32,
        track_id: i32,
    },
    /// The session and its transport were torn down.
    Released {
        session_id: String,
    },
    ForegroundChanged {
        foreground: bool,
    },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::Prepared { .. } => "Session prepared",
            SessionEvent::Released { .. } => "Session released",
            SessionEvent::ForegroundChanged { .. } => "Foreground state changed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus clones the sender; every clone publishes into the same
/// channel. Slow subscribers get `RecvError::Lagged` instead of blocking
/// publishers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers reached, or an error when nobody is
    /// subscribed.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let playback_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Playback(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once all senders are dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive. `None` when nothing is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
