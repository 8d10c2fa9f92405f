//! Session host
//!
//! Owns the playback coordinator's lifetime and translates media-button and
//! transport-control actions into coordinator commands. The coordinator is
//! created lazily by the first command able to start a session and shut
//! down again on stop.

use bridge_traits::playback::{RepeatMode, ShuffleMode};
use core_catalog::{Catalog, PlayList};
use core_playback::{
    Command, PlaybackBridges, PlaybackConfig, PlaybackCoordinator, PlaybackError, SessionSnapshot,
};
use core_runtime::events::EventBus;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{CoreError, Result};

/// Action ids delivered by media buttons and transport controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaAction {
    Play,
    Pause,
    PlayPause,
    Stop,
    SkipToNext,
    SkipToPrevious,
    SkipToQueueItem,
    SeekTo,
    SetRepeatMode,
    SetShuffleMode,
    PrepareFromMediaId,
}

impl MediaAction {
    pub const ALL: [MediaAction; 11] = [
        MediaAction::Play,
        MediaAction::Pause,
        MediaAction::PlayPause,
        MediaAction::Stop,
        MediaAction::SkipToNext,
        MediaAction::SkipToPrevious,
        MediaAction::SkipToQueueItem,
        MediaAction::SeekTo,
        MediaAction::SetRepeatMode,
        MediaAction::SetShuffleMode,
        MediaAction::PrepareFromMediaId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaAction::Play => "play",
            MediaAction::Pause => "pause",
            MediaAction::PlayPause => "play_pause",
            MediaAction::Stop => "stop",
            MediaAction::SkipToNext => "skip_to_next",
            MediaAction::SkipToPrevious => "skip_to_previous",
            MediaAction::SkipToQueueItem => "skip_to_queue_item",
            MediaAction::SeekTo => "seek_to",
            MediaAction::SetRepeatMode => "set_repeat_mode",
            MediaAction::SetShuffleMode => "set_shuffle_mode",
            MediaAction::PrepareFromMediaId => "prepare_from_media_id",
        }
    }
}

impl fmt::Display for MediaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        MediaAction::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| CoreError::UnknownAction(s.to_string()))
    }
}

/// Arguments that travel with an action. Which ones are required depends on
/// the action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionArgs {
    /// Track id rendered as a string, as media browsers send it.
    pub media_id: Option<String>,
    pub playlist_id: Option<i32>,
    pub track_id: Option<i32>,
    pub position_ms: Option<u64>,
    pub repeat: Option<RepeatMode>,
    pub shuffle: Option<ShuffleMode>,
}

impl ActionArgs {
    pub fn track(playlist_id: i32, track_id: i32) -> Self {
        Self {
            playlist_id: Some(playlist_id),
            track_id: Some(track_id),
            ..Self::default()
        }
    }

    pub fn media(playlist_id: i32, media_id: impl Into<String>) -> Self {
        Self {
            media_id: Some(media_id.into()),
            playlist_id: Some(playlist_id),
            ..Self::default()
        }
    }

    pub fn position(position_ms: u64) -> Self {
        Self {
            position_ms: Some(position_ms),
            ..Self::default()
        }
    }

    pub fn repeat(mode: RepeatMode) -> Self {
        Self {
            repeat: Some(mode),
            ..Self::default()
        }
    }

    pub fn shuffle(mode: ShuffleMode) -> Self {
        Self {
            shuffle: Some(mode),
            ..Self::default()
        }
    }

    /// Track id from `track_id`, falling back to a numeric `media_id`.
    fn resolved_track_id(&self) -> Result<i32> {
        if let Some(track_id) = self.track_id {
            return Ok(track_id);
        }
        let media_id = self
            .media_id
            .as_deref()
            .ok_or_else(|| CoreError::InvalidArgument("missing track id".to_string()))?;
        media_id
            .parse()
            .map_err(|_| CoreError::InvalidArgument(format!("media id {:?} is not a track id", media_id)))
    }
}

pub struct SessionHost {
    bridges: PlaybackBridges,
    event_bus: EventBus,
    config: PlaybackConfig,
    coordinator: Mutex<Option<PlaybackCoordinator>>,
    catalog: RwLock<Option<Arc<Catalog>>>,
    /// Playlist handed to the most recent session-creating command.
    last_playlist: RwLock<Option<Arc<PlayList>>>,
}

impl SessionHost {
    pub fn new(bridges: PlaybackBridges, event_bus: EventBus, config: PlaybackConfig) -> Self {
        Self {
            bridges,
            event_bus,
            config,
            coordinator: Mutex::new(None),
            catalog: RwLock::new(None),
            last_playlist: RwLock::new(None),
        }
    }

    /// Catalog used to resolve playlist ids in actions.
    pub fn install_catalog(&self, catalog: Arc<Catalog>) {
        debug!(playlists = catalog.len(), "Catalog installed on session host");
        *self.catalog.write() = Some(catalog);
    }

    pub fn catalog(&self) -> Option<Arc<Catalog>> {
        self.catalog.read().clone()
    }

    /// Look a playlist up by id: first the one last played, then the
    /// catalog.
    pub fn playlist(&self, playlist_id: i32) -> Option<Arc<PlayList>> {
        if let Some(last) = self.last_playlist.read().as_ref() {
            if last.id == playlist_id {
                return Some(last.clone());
            }
        }
        self.catalog
            .read()
            .as_ref()
            .and_then(|catalog| catalog.playlist(playlist_id).cloned())
            .map(Arc::new)
    }

    pub async fn has_session(&self) -> bool {
        self.coordinator
            .lock()
            .await
            .as_ref()
            .is_some_and(|coordinator| !coordinator.is_closed())
    }

    /// Snapshot of the live session, or `None` when no coordinator runs.
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let coordinator = self.coordinator.lock().await.clone()?;
        coordinator.snapshot().await.ok()
    }

    /// Route a command to the coordinator, creating it when the command can
    /// start a session.
    #[instrument(skip_all, fields(command = command.name()))]
    pub async fn submit(&self, command: Command) -> Result<()> {
        let mut slot = self.coordinator.lock().await;

        if let Command::Stop = command {
            if let Some(coordinator) = slot.take() {
                let stopped = coordinator.stop().await;
                coordinator.shutdown().await;
                if let Err(e) = self.bridges.media_session.set_active(false).await {
                    warn!(error = %e, "Could not deactivate media session");
                }
                info!("Playback session stopped");
                stopped?;
            }
            return Ok(());
        }

        if let Command::Prepare { playlist, .. } | Command::PlayPause { playlist, .. } = &command
        {
            *self.last_playlist.write() = Some(playlist.clone());
        }

        let coordinator = match slot.as_ref() {
            Some(coordinator) if !coordinator.is_closed() => coordinator.clone(),
            _ if command.creates_session() => {
                let coordinator = PlaybackCoordinator::spawn(
                    self.bridges.clone(),
                    self.event_bus.clone(),
                    self.config.clone(),
                )?;
                if let Err(e) = self.bridges.media_session.set_active(true).await {
                    warn!(error = %e, "Could not activate media session");
                }
                info!("Playback session created");
                *slot = Some(coordinator.clone());
                coordinator
            }
            _ => return Err(PlaybackError::NoActiveSession.into()),
        };
        // The slot lock only guards creation and stop.
        drop(slot);

        coordinator.execute(command).await.map_err(CoreError::from)
    }

    /// Handle an action id from a media button or transport control.
    pub async fn dispatch(&self, action: &str, args: ActionArgs) -> Result<()> {
        let action: MediaAction = action.parse()?;
        debug!(%action, "Media action");
        let command = self.resolve(action, &args)?;
        self.submit(command).await
    }

    fn resolve(&self, action: MediaAction, args: &ActionArgs) -> Result<Command> {
        let command = match action {
            MediaAction::Play => Command::Play,
            MediaAction::Pause => Command::Pause,
            MediaAction::Stop => Command::Stop,
            MediaAction::SkipToNext => Command::SkipNext,
            MediaAction::SkipToPrevious => Command::SkipPrevious,
            MediaAction::SkipToQueueItem => Command::SkipToTrack(args.resolved_track_id()?),
            MediaAction::SeekTo => Command::SeekTo(
                args.position_ms
                    .ok_or_else(|| CoreError::InvalidArgument("missing position".to_string()))?,
            ),
            MediaAction::SetRepeatMode => Command::SetRepeat(
                args.repeat
                    .ok_or_else(|| CoreError::InvalidArgument("missing repeat mode".to_string()))?,
            ),
            MediaAction::SetShuffleMode => Command::SetShuffle(
                args.shuffle
                    .ok_or_else(|| CoreError::InvalidArgument("missing shuffle mode".to_string()))?,
            ),
            MediaAction::PlayPause => Command::PlayPause {
                playlist: self.resolve_playlist(args)?,
                track_id: args.resolved_track_id()?,
            },
            MediaAction::PrepareFromMediaId => Command::Prepare {
                playlist: self.resolve_playlist(args)?,
                track_id: args.resolved_track_id()?,
            },
        };
        Ok(command)
    }

    fn resolve_playlist(&self, args: &ActionArgs) -> Result<Arc<PlayList>> {
        let playlist_id = args
            .playlist_id
            .ok_or_else(|| CoreError::InvalidArgument("missing playlist id".to_string()))?;
        self.playlist(playlist_id).ok_or_else(|| {
            CoreError::InvalidArgument(format!("playlist {} is not in the catalog", playlist_id))
        })
    }

    /// Process teardown: stop any session and release the media session.
    pub async fn shutdown(&self) {
        let coordinator = self.coordinator.lock().await.take();
        if let Some(coordinator) = coordinator {
            coordinator.shutdown().await;
        }

        let media_session = &self.bridges.media_session;
        if let Err(e) = media_session.set_active(false).await {
            warn!(error = %e, "Could not deactivate media session");
        }
        if let Err(e) = media_session.release().await {
            warn!(error = %e, "Could not release media session");
        }
        info!("Session host shut down");
    }
}
