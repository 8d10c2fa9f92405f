//! Platform media session (lock screen, Bluetooth controls, car displays).

use crate::error::Result;
use crate::playback::{PlaybackActions, PlaybackState, RepeatMode, SessionMetadata, ShuffleMode};

#[async_trait::async_trait]
pub trait MediaSessionSurface: Send + Sync {
    async fn set_active(&self, active: bool) -> Result<()>;

    async fn set_metadata(&self, metadata: SessionMetadata) -> Result<()>;

    async fn set_playback_state(
        &self,
        state: PlaybackState,
        position_ms: u64,
        actions: PlaybackActions,
    ) -> Result<()>;

    async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()>;

    async fn set_shuffle_mode(&self, mode: ShuffleMode) -> Result<()>;

    /// Tear the session down for good.
    async fn release(&self) -> Result<()>;
}
