//! Resolution of the combined play/pause command.

use core_catalog::UNSET_ID;

/// What a play/pause press means given what is currently loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayPauseAction {
    /// Nothing (or another playlist) is loaded: load the playlist at the
    /// requested track, then play.
    PrepareAndPlay,
    /// The requested track is the current one: pause if playing, else play.
    Toggle,
    /// Same playlist, different track: jump there, then play.
    SkipAndPlay(i32),
}

/// `current` is the `(playlist_id, track_id)` pair of the prepared session.
pub fn resolve_play_pause(
    current: Option<(i32, i32)>,
    playlist_id: i32,
    track_id: i32,
) -> PlayPauseAction {
    match current {
        None => PlayPauseAction::PrepareAndPlay,
        Some((current_playlist, current_track))
            if current_playlist == UNSET_ID || current_track == UNSET_ID =>
        {
            PlayPauseAction::PrepareAndPlay
        }
        Some((current_playlist, _)) if current_playlist != playlist_id => {
            PlayPauseAction::PrepareAndPlay
        }
        Some((_, current_track)) if current_track == track_id => PlayPauseAction::Toggle,
        Some(_) => PlayPauseAction::SkipAndPlay(track_id),
    }
}
