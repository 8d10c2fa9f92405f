//! Media transport bridge.
//!
//! A transport decodes or streams the URIs it was built with and reports its
//! lifecycle through a [`TransportListener`]. On Android this is an
//! ExoPlayer-style player; on desktop a headless clock. The core never
//! inspects audio data, it only drives and observes the transport.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::playback::RepeatMode;

/// Raw status reported by the transport's state callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportStatus {
    Idle,
    Buffering,
    /// Enough media is loaded to play. Whether it actually plays depends on
    /// the `play_when_ready` flag reported alongside.
    Ready,
    Ended,
}

/// Callbacks from a transport. Like focus callbacks these arrive on
/// whatever thread the platform player uses.
pub trait TransportListener: Send + Sync {
    fn on_state_changed(&self, status: TransportStatus, play_when_ready: bool);

    /// Playback jumped: a seek completed, a skip landed or the transport
    /// auto-advanced to the next window.
    fn on_position_discontinuity(&self);

    fn on_error(&self, message: String);
}

/// Handle to a live transport.
///
/// Window indices address the URI list the transport was created with, in
/// order.
#[async_trait::async_trait]
pub trait MediaTransport: Send + Sync {
    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    /// Free decoder resources. The handle is unusable afterwards.
    async fn release(&self) -> Result<()>;

    async fn seek_to(&self, window_index: usize, position_ms: u64) -> Result<()>;

    /// Volume normalized to `0.0..=1.0`.
    async fn set_volume(&self, volume: f32) -> Result<()>;

    async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()>;

    /// `Some(order)` installs a playback order over window indices, `None`
    /// restores list order.
    async fn set_shuffle_order(&self, order: Option<Vec<usize>>) -> Result<()>;

    fn current_window_index(&self) -> usize;

    fn current_position_ms(&self) -> u64;

    /// `None` until the current window's duration is known.
    fn duration_ms(&self) -> Option<u64>;
}

/// Builds transports. The factory outlives every transport it creates.
#[async_trait::async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        uris: Vec<String>,
        listener: Arc<dyn TransportListener>,
    ) -> Result<Arc<dyn MediaTransport>>;
}
