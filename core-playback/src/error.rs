//! # Playback Error Types

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors returned by playback commands.
///
/// Side-effect failures on presentation surfaces (notification, media
/// session) are logged and never surface here.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The command needs a prepared session and none exists. Nothing changed.
    #[error("No active playback session")]
    NoActiveSession,

    #[error("Track not found in playlist: {0}")]
    TrackNotFound(i32),

    #[error("Playlist has no tracks: {0}")]
    EmptyPlaylist(i32),

    // ========================================================================
    // Platform Errors
    // ========================================================================
    /// The OS refused audio focus; play was not started.
    #[error("Audio focus denied")]
    FocusDenied,

    /// The transport reported a failure while playing.
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The coordinator task has shut down.
    #[error("Playback coordinator is closed")]
    CoordinatorClosed,

    #[error("Invalid playback configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Re-issuing the command (or a play) may succeed later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlaybackError::FocusDenied | PlaybackError::Transport(_) | PlaybackError::Bridge(_)
        )
    }

    /// The command was rejected without changing any state.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PlaybackError::NoActiveSession
                | PlaybackError::TrackNotFound(_)
                | PlaybackError::EmptyPlaylist(_)
                | PlaybackError::FocusDenied
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
