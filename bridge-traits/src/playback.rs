//! Playback value types shared between the core and host surfaces.
//!
//! Nothing in here performs I/O. These are the vocabulary the coordinator uses
//! when it talks to the media session, the notification surface and the
//! transport.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Externally visible playback state.
///
/// Always derived from the active session, the transport state and the audio
/// focus hold. Never stored as ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Buffering,
    Playing,
    Paused,
    Error,
}

impl PlaybackState {
    /// Playing or about to play: the states in which a media-button press
    /// should offer "pause".
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Buffering)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Buffering => "buffering",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    #[default]
    Off,
    /// Loop the current track.
    One,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleMode {
    #[default]
    Off,
    All,
}

/// Transport controls a media session advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackActions {
    pub play: bool,
    pub pause: bool,
    pub skip_to_next: bool,
    pub skip_to_previous: bool,
}

impl PlaybackActions {
    /// Playing and buffering offer pause; every other state offers play.
    /// Skipping is always available.
    pub fn for_state(state: PlaybackState) -> Self {
        let active = state.is_active();
        Self {
            play: !active,
            pause: active,
            skip_to_next: true,
            skip_to_previous: true,
        }
    }
}

/// Metadata pushed to the media session for the current track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Track id rendered as a string media id.
    pub media_id: String,
    pub title: String,
    /// Owning playlist's name, shown as the display subtitle.
    pub playlist_title: String,
    pub playlist_id: i32,
    pub duration_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_states_offer_pause() {
        for state in [PlaybackState::Playing, PlaybackState::Buffering] {
            let actions = PlaybackActions::for_state(state);
            assert!(actions.pause);
            assert!(!actions.play);
        }
    }

    #[test]
    fn idle_states_offer_play() {
        for state in [
            PlaybackState::Stopped,
            PlaybackState::Paused,
            PlaybackState::Error,
        ] {
            let actions = PlaybackActions::for_state(state);
            assert!(actions.play);
            assert!(!actions.pause);
            assert!(actions.skip_to_next && actions.skip_to_previous);
        }
    }

    #[test]
    fn modes_default_to_off() {
        assert_eq!(RepeatMode::default(), RepeatMode::Off);
        assert_eq!(ShuffleMode::default(), ShuffleMode::Off);
        assert_eq!(PlaybackState::default(), PlaybackState::Stopped);
    }

    #[test]
    fn state_serializes_snake_case() {
        let json = serde_json::to_string(&PlaybackState::Buffering).unwrap();
        assert_eq!(json, "\"buffering\"");
    }
}
