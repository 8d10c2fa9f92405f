//! Presentation surfaces that log instead of drawing.
//!
//! Both shims keep the last value they were handed so desktop front ends (and
//! tests) can poll them.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    media_session::MediaSessionSurface,
    notification::{NotificationContent, NotificationHandle, NotificationSurface},
    playback::{PlaybackActions, PlaybackState, RepeatMode, SessionMetadata, ShuffleMode},
};
use parking_lot::Mutex;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct NotificationState {
    content: Option<NotificationContent>,
    foreground: bool,
    next_handle: u32,
}

#[derive(Debug, Default)]
pub struct TracingNotificationSurface {
    state: Mutex<NotificationState>,
}

impl TracingNotificationSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content currently shown, if any.
    pub fn current(&self) -> Option<NotificationContent> {
        self.state.lock().content.clone()
    }

    pub fn is_foreground(&self) -> bool {
        self.state.lock().foreground
    }
}

#[async_trait]
impl NotificationSurface for TracingNotificationSurface {
    async fn render_notification(
        &self,
        content: NotificationContent,
    ) -> Result<NotificationHandle> {
        let mut state = self.state.lock();
        debug!(
            track = %content.track_title,
            playlist = %content.playlist_title,
            paused = content.paused,
            "Render notification"
        );
        if state.content.is_none() {
            state.next_handle = state.next_handle.wrapping_add(1);
        }
        state.content = Some(content);
        Ok(NotificationHandle(state.next_handle))
    }

    async fn start_foreground(&self, handle: NotificationHandle) -> Result<()> {
        let mut state = self.state.lock();
        if !state.foreground {
            info!(handle = handle.0, "Entering foreground");
        }
        state.foreground = true;
        Ok(())
    }

    async fn stop_foreground(&self, remove_notification: bool) -> Result<()> {
        let mut state = self.state.lock();
        if state.foreground {
            info!(remove_notification, "Leaving foreground");
        }
        state.foreground = false;
        if remove_notification {
            state.content = None;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
struct SessionState {
    active: bool,
    released: bool,
    metadata: Option<SessionMetadata>,
    playback: Option<(PlaybackState, u64, PlaybackActions)>,
    repeat: RepeatMode,
    shuffle: ShuffleMode,
}

#[derive(Debug, Default)]
pub struct TracingMediaSession {
    state: Mutex<SessionState>,
}

impl TracingMediaSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    pub fn metadata(&self) -> Option<SessionMetadata> {
        self.state.lock().metadata.clone()
    }

    pub fn playback_state(&self) -> Option<PlaybackState> {
        self.state.lock().playback.map(|(state, _, _)| state)
    }

    pub fn modes(&self) -> (RepeatMode, ShuffleMode) {
        let state = self.state.lock();
        (state.repeat, state.shuffle)
    }
}

#[async_trait]
impl MediaSessionSurface for TracingMediaSession {
    async fn set_active(&self, active: bool) -> Result<()> {
        debug!(active, "Media session activation");
        self.state.lock().active = active;
        Ok(())
    }

    async fn set_metadata(&self, metadata: SessionMetadata) -> Result<()> {
        debug!(media_id = %metadata.media_id, title = %metadata.title, "Media session metadata");
        self.state.lock().metadata = Some(metadata);
        Ok(())
    }

    async fn set_playback_state(
        &self,
        state: PlaybackState,
        position_ms: u64,
        actions: PlaybackActions,
    ) -> Result<()> {
        debug!(%state, position_ms, "Media session playback state");
        self.state.lock().playback = Some((state, position_ms, actions));
        Ok(())
    }

    async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        self.state.lock().repeat = mode;
        Ok(())
    }

    async fn set_shuffle_mode(&self, mode: ShuffleMode) -> Result<()> {
        self.state.lock().shuffle = mode;
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.active = false;
        state.released = true;
        info!("Media session released");
        Ok(())
    }
}
