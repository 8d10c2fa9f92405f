//! Remote control surface
//!
//! Mirrors the session into a small state struct a UI can bind to, and
//! offers the handful of commands a mini-player needs. The mirror follows
//! the event bus; on connect (and after falling behind the bus) it re-pulls
//! a full snapshot from the host.

use bridge_traits::playback::{PlaybackState, RepeatMode, ShuffleMode};
use core_catalog::{PlayList, Track};
use core_playback::{Command, SessionSnapshot};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, RecvError};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;
use crate::host::SessionHost;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceState {
    pub player_state: PlaybackState,
    pub elapsed_ms: u64,
    pub max_duration_ms: u64,
    pub track_name: String,
    pub repeat: RepeatMode,
    pub shuffle: ShuffleMode,
    pub current: Option<(Track, Arc<PlayList>)>,
}

impl SurfaceState {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let mut state = Self {
            player_state: snapshot.state,
            elapsed_ms: snapshot.elapsed_ms,
            max_duration_ms: snapshot.duration_ms.unwrap_or(0),
            track_name: snapshot
                .current
                .as_ref()
                .map(|(track, _)| track.name.clone())
                .unwrap_or_default(),
            repeat: snapshot.repeat,
            shuffle: snapshot.shuffle,
            current: snapshot.current.clone(),
        };
        if state.player_state == PlaybackState::Stopped {
            state.clear_track();
        }
        state
    }

    pub fn is_prepared(&self) -> bool {
        self.current.is_some()
    }

    fn clear_track(&mut self) {
        self.track_name.clear();
        self.elapsed_ms = 0;
        self.max_duration_ms = 0;
        self.current = None;
    }

    /// Fold one bus event into the mirror. Returns whether anything changed.
    ///
    /// `lookup` resolves a `(playlist_id, track_id)` pair the mirror does not
    /// already hold.
    pub fn apply<F>(&mut self, event: &CoreEvent, lookup: F) -> bool
    where
        F: Fn(i32, i32) -> Option<(Track, Arc<PlayList>)>,
    {
        let before = self.clone();

        match event {
            CoreEvent::Playback(PlaybackEvent::StateChanged { state, position_ms }) => {
                self.player_state = *state;
                if *state == PlaybackState::Stopped {
                    self.clear_track();
                } else {
                    self.elapsed_ms = *position_ms;
                }
            }
            CoreEvent::Playback(PlaybackEvent::MetadataChanged {
                track_name,
                duration_ms,
                ..
            }) => {
                self.track_name = track_name.clone();
                self.max_duration_ms = duration_ms.unwrap_or(0);
            }
            CoreEvent::Playback(PlaybackEvent::ElapsedTime {
                position_ms,
                duration_ms,
            }) => {
                self.elapsed_ms = *position_ms;
                if let Some(duration) = duration_ms {
                    self.max_duration_ms = *duration;
                }
            }
            CoreEvent::Playback(PlaybackEvent::RepeatModeChanged { mode }) => self.repeat = *mode,
            CoreEvent::Playback(PlaybackEvent::ShuffleModeChanged { mode }) => {
                self.shuffle = *mode
            }
            CoreEvent::Playback(PlaybackEvent::ExtrasChanged {
                playlist_id,
                track_id,
            }) => {
                let known = self.current.as_ref().and_then(|(_, playlist)| {
                    (playlist.id == *playlist_id)
                        .then(|| playlist.index_of(*track_id))
                        .flatten()
                        .map(|index| (playlist.tracks[index].clone(), playlist.clone()))
                });
                if let Some(current) = known.or_else(|| lookup(*playlist_id, *track_id)) {
                    self.current = Some(current);
                }
            }
            _ => {}
        }

        *self != before
    }
}

pub struct RemoteControlSurface {
    host: Arc<SessionHost>,
    event_bus: EventBus,
    state: watch::Sender<SurfaceState>,
    follower: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteControlSurface {
    pub fn new(host: Arc<SessionHost>, event_bus: EventBus) -> Self {
        let (state, _) = watch::channel(SurfaceState::default());
        Self {
            host,
            event_bus,
            state,
            follower: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SurfaceState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.follower
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Pull the current session state, then follow the event bus.
    pub async fn connect(&self) {
        if self.is_connected() {
            return;
        }

        // Subscribe before pulling so nothing emitted in between is lost.
        let mut events = self.event_bus.subscribe();
        refresh(&self.host, &self.state).await;

        let host = self.host.clone();
        let state = self.state.clone();
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        state.send_if_modified(|mirror| {
                            mirror.apply(&event, |playlist_id, track_id| {
                                lookup(&host, playlist_id, track_id)
                            })
                        });
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Remote surface fell behind, refreshing");
                        refresh(&host, &state).await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Remote surface stopped following");
        });

        if let Some(previous) = self.follower.lock().replace(task) {
            previous.abort();
        }
        debug!("Remote surface connected");
    }

    pub fn disconnect(&self) {
        if let Some(task) = self.follower.lock().take() {
            task.abort();
            debug!("Remote surface disconnected");
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Play or pause `track_id` of `playlist`, starting a session if needed.
    pub async fn play_track(&self, playlist: Arc<PlayList>, track_id: i32) -> Result<()> {
        self.host
            .submit(Command::PlayPause { playlist, track_id })
            .await
    }

    /// Toggle the current track. No-op without a prepared session.
    pub async fn play_pause(&self) -> Result<()> {
        let Some((track, playlist)) = self.state().current else {
            return Ok(());
        };
        self.play_track(playlist, track.id).await
    }

    pub async fn skip_next(&self) -> Result<()> {
        self.when_prepared(Command::SkipNext).await
    }

    pub async fn skip_previous(&self) -> Result<()> {
        self.when_prepared(Command::SkipPrevious).await
    }

    /// Toggle repeat-one.
    pub async fn repeat_one(&self) -> Result<()> {
        self.when_prepared(Command::SetRepeat(RepeatMode::One)).await
    }

    /// Toggle shuffle.
    pub async fn shuffle(&self) -> Result<()> {
        self.when_prepared(Command::SetShuffle(ShuffleMode::All))
            .await
    }

    pub async fn seek_to(&self, position_ms: u64) -> Result<()> {
        self.host.submit(Command::SeekTo(position_ms)).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.host.submit(Command::Stop).await
    }

    async fn when_prepared(&self, command: Command) -> Result<()> {
        if !self.state().is_prepared() {
            debug!(command = command.name(), "Ignoring command without a session");
            return Ok(());
        }
        self.host.submit(command).await
    }
}

impl Drop for RemoteControlSurface {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn lookup(host: &SessionHost, playlist_id: i32, track_id: i32) -> Option<(Track, Arc<PlayList>)> {
    let playlist = host.playlist(playlist_id)?;
    let index = playlist.index_of(track_id)?;
    Some((playlist.tracks[index].clone(), playlist))
}

async fn refresh(host: &SessionHost, state: &watch::Sender<SurfaceState>) {
    let mirror = match host.snapshot().await {
        Some(snapshot) => SurfaceState::from_snapshot(&snapshot),
        None => {
            let previous = state.borrow();
            SurfaceState {
                repeat: previous.repeat,
                shuffle: previous.shuffle,
                ..SurfaceState::default()
            }
        }
    };
    state.send_replace(mirror);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist() -> Arc<PlayList> {
        Arc::new(PlayList::new(
            1,
            "Mix",
            "https://cdn",
            vec![Track::new(1, "One", "1.mp3"), Track::new(2, "Two", "2.mp3")],
        ))
    }

    fn no_lookup(_: i32, _: i32) -> Option<(Track, Arc<PlayList>)> {
        None
    }

    #[test]
    fn stopped_resets_track_fields() {
        let mut mirror = SurfaceState {
            player_state: PlaybackState::Playing,
            elapsed_ms: 5_000,
            max_duration_ms: 60_000,
            track_name: "One".to_string(),
            repeat: RepeatMode::One,
            current: Some((playlist().tracks[0].clone(), playlist())),
            ..SurfaceState::default()
        };

        let changed = mirror.apply(
            &CoreEvent::Playback(PlaybackEvent::StateChanged {
                state: PlaybackState::Stopped,
                position_ms: 5_000,
            }),
            no_lookup,
        );

        assert!(changed);
        assert_eq!(mirror.track_name, "");
        assert_eq!(mirror.elapsed_ms, 0);
        assert_eq!(mirror.max_duration_ms, 0);
        assert!(mirror.current.is_none());
        assert_eq!(mirror.repeat, RepeatMode::One);
    }

    #[test]
    fn extras_resolve_within_current_playlist_first() {
        let mut mirror = SurfaceState {
            current: Some((playlist().tracks[0].clone(), playlist())),
            ..SurfaceState::default()
        };

        mirror.apply(
            &CoreEvent::Playback(PlaybackEvent::ExtrasChanged {
                playlist_id: 1,
                track_id: 2,
            }),
            no_lookup,
        );
        assert_eq!(mirror.current.as_ref().map(|(t, _)| t.id), Some(2));
    }

    #[test]
    fn extras_for_unknown_playlist_use_lookup() {
        let mut mirror = SurfaceState::default();
        let other = playlist();

        mirror.apply(
            &CoreEvent::Playback(PlaybackEvent::ExtrasChanged {
                playlist_id: 1,
                track_id: 1,
            }),
            |_, _| Some((other.tracks[0].clone(), other.clone())),
        );
        assert!(mirror.is_prepared());
    }

    #[test]
    fn unrelated_events_change_nothing() {
        let mut mirror = SurfaceState::default();
        assert!(!mirror.apply(&CoreEvent::Playback(PlaybackEvent::FocusDenied), no_lookup));
    }
}
