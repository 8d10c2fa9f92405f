//! Foreground notification surface.
//!
//! While audio plays the host keeps a visible, non-dismissable notification
//! and runs in the foreground. The core decides when; the host decides how it
//! looks.

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub track_title: String,
    pub playlist_title: String,
    /// Selects the play or the pause action button.
    pub paused: bool,
}

/// Opaque id of a rendered notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationHandle(pub u32);

#[async_trait::async_trait]
pub trait NotificationSurface: Send + Sync {
    /// Render or update the playback notification.
    async fn render_notification(&self, content: NotificationContent)
        -> Result<NotificationHandle>;

    /// Enter the foreground, pinning `handle`.
    async fn start_foreground(&self, handle: NotificationHandle) -> Result<()>;

    /// Leave the foreground. `remove_notification` also dismisses it.
    async fn stop_foreground(&self, remove_notification: bool) -> Result<()>;
}
