//! Commands and published session state.

use bridge_traits::playback::{PlaybackState, RepeatMode, ShuffleMode};
use core_catalog::{PlayList, Track};
use std::sync::Arc;
use uuid::Uuid;

/// A request to the coordinator. Commands are applied strictly in the order
/// they were submitted.
#[derive(Debug, Clone)]
pub enum Command {
    /// Bind `playlist` to a fresh transport, positioned at `track_id`.
    Prepare {
        playlist: Arc<PlayList>,
        track_id: i32,
    },
    /// Combined play/pause press for a specific track.
    PlayPause {
        playlist: Arc<PlayList>,
        track_id: i32,
    },
    Play,
    Pause,
    Stop,
    SkipNext,
    SkipPrevious,
    SkipToTrack(i32),
    SeekTo(u64),
    /// Toggles: requesting the active mode switches it off.
    SetRepeat(RepeatMode),
    SetShuffle(ShuffleMode),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Prepare { .. } => "prepare",
            Command::PlayPause { .. } => "play_pause",
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Stop => "stop",
            Command::SkipNext => "skip_next",
            Command::SkipPrevious => "skip_previous",
            Command::SkipToTrack(_) => "skip_to_track",
            Command::SeekTo(_) => "seek_to",
            Command::SetRepeat(_) => "set_repeat",
            Command::SetShuffle(_) => "set_shuffle",
        }
    }

    /// Commands that may create a session.
    pub fn creates_session(&self) -> bool {
        matches!(self, Command::Prepare { .. } | Command::PlayPause { .. })
    }
}

/// Point-in-time view of the session, published after every applied
/// message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub elapsed_ms: u64,
    pub duration_ms: Option<u64>,
    pub current: Option<(Track, Arc<PlayList>)>,
    pub repeat: RepeatMode,
    pub shuffle: ShuffleMode,
    pub session_id: Option<Uuid>,
    pub foreground: bool,
    pub focus_held: bool,
    pub ticking: bool,
    pub play_when_ready: bool,
}

impl SessionSnapshot {
    pub fn is_prepared(&self) -> bool {
        self.session_id.is_some()
    }

    /// `(playlist_id, track_id)` of the current track.
    pub fn current_ids(&self) -> Option<(i32, i32)> {
        self.current
            .as_ref()
            .map(|(track, playlist)| (playlist.id, track.id))
    }
}
