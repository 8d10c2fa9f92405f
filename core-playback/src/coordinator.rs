//! # Playback Coordinator
//!
//! Single owner of the active playback session.
//!
//! ## Overview
//!
//! The coordinator is an actor: one tokio task drains an unbounded queue of
//! [`Message`]s and applies each to completion before reading the next.
//! User commands, transport callbacks, focus changes, becoming-noisy
//! notifications and elapsed-time ticks all arrive on that queue, so the
//! session is never mutated from two places at once.
//!
//! Platform listeners only hold a weak sender into the queue. Once every
//! [`PlaybackCoordinator`] handle is dropped the loop tears the session down
//! and exits.
//!
//! After every message the externally visible [`PlaybackState`] is derived
//! from the transport state, the play intent and the focus hold. When it
//! changes, the presentation surfaces (media session, notification,
//! foreground, becoming-noisy listener, ticker) are reconciled to match.

use bridge_traits::{
    focus::{AudioFocusManager, FocusChange, FocusChangeListener},
    media_session::MediaSessionSurface,
    notification::{NotificationContent, NotificationHandle, NotificationSurface},
    playback::{PlaybackActions, PlaybackState, RepeatMode, SessionMetadata, ShuffleMode},
    route::{AudioRouteMonitor, BecomingNoisyListener},
    transport::{MediaTransport, TransportFactory, TransportListener, TransportStatus},
};
use core_catalog::{PlayList, Track};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, SessionEvent};
use core_runtime::logging::strip_path;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::focus::{AudioFocusArbiter, FocusIntent};
use crate::intent::{resolve_play_pause, PlayPauseAction};
use crate::shuffle::{next_index, previous_index, ShuffleOrder};
use crate::ticker::ElapsedTicker;
use crate::transport::{TransportSignal, TransportState};
use crate::types::{Command, SessionSnapshot};

// ============================================================================
// Bridges
// ============================================================================

/// Platform handles the coordinator drives.
#[derive(Clone)]
pub struct PlaybackBridges {
    pub transport_factory: Arc<dyn TransportFactory>,
    pub focus_manager: Arc<dyn AudioFocusManager>,
    pub notification_surface: Arc<dyn NotificationSurface>,
    pub media_session: Arc<dyn MediaSessionSurface>,
    /// Pause on becoming noisy is disabled when `None`.
    pub route_monitor: Option<Arc<dyn AudioRouteMonitor>>,
}

impl PlaybackBridges {
    pub fn from_config(config: &CoreConfig) -> Self {
        let route_monitor = if config.features.pause_on_becoming_noisy {
            config.route_monitor.clone()
        } else {
            None
        };

        Self {
            transport_factory: config.transport_factory.clone(),
            focus_manager: config.focus_manager.clone(),
            notification_surface: config.notification_surface.clone(),
            media_session: config.media_session.clone(),
            route_monitor,
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

enum Message {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<()>>,
    },
    Transport {
        transport_id: u64,
        signal: TransportSignal,
    },
    Focus(FocusChange),
    BecomingNoisy,
    Tick {
        generation: u64,
    },
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown(oneshot::Sender<()>),
}

fn post(mailbox: &WeakUnboundedSender<Message>, message: Message) -> bool {
    mailbox
        .upgrade()
        .map(|sender| sender.send(message).is_ok())
        .unwrap_or(false)
}

struct TransportMailbox {
    mailbox: WeakUnboundedSender<Message>,
    transport_id: u64,
}

impl TransportMailbox {
    fn send(&self, signal: TransportSignal) {
        post(
            &self.mailbox,
            Message::Transport {
                transport_id: self.transport_id,
                signal,
            },
        );
    }
}

impl TransportListener for TransportMailbox {
    fn on_state_changed(&self, status: TransportStatus, play_when_ready: bool) {
        self.send(TransportSignal::StateChanged {
            status,
            play_when_ready,
        });
    }

    fn on_position_discontinuity(&self) {
        self.send(TransportSignal::Discontinuity);
    }

    fn on_error(&self, message: String) {
        self.send(TransportSignal::Error(message));
    }
}

struct FocusMailbox(WeakUnboundedSender<Message>);

impl FocusChangeListener for FocusMailbox {
    fn on_focus_change(&self, change: FocusChange) {
        post(&self.0, Message::Focus(change));
    }
}

struct NoisyMailbox(WeakUnboundedSender<Message>);

impl BecomingNoisyListener for NoisyMailbox {
    fn on_becoming_noisy(&self) {
        post(&self.0, Message::BecomingNoisy);
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Cloneable handle to the coordinator task.
#[derive(Clone)]
pub struct PlaybackCoordinator {
    sender: UnboundedSender<Message>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl PlaybackCoordinator {
    /// Start the coordinator task on the current tokio runtime.
    pub fn spawn(
        bridges: PlaybackBridges,
        event_bus: EventBus,
        config: PlaybackConfig,
    ) -> Result<Self> {
        config.validate()?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshots) = watch::channel(SessionSnapshot::default());
        let engine = Engine::new(bridges, event_bus, config, sender.downgrade(), snapshot_tx);
        let task = tokio::spawn(engine.run(receiver));

        Ok(Self {
            sender,
            snapshots,
            task: Arc::new(Mutex::new(Some(task))),
        })
    }

    /// Submit a command and wait until it has been applied.
    pub async fn execute(&self, command: Command) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Message::Command { command, reply })
            .map_err(|_| PlaybackError::CoordinatorClosed)?;
        response.await.map_err(|_| PlaybackError::CoordinatorClosed)?
    }

    pub async fn prepare(&self, playlist: Arc<PlayList>, track_id: i32) -> Result<()> {
        self.execute(Command::Prepare { playlist, track_id }).await
    }

    pub async fn play_pause(&self, playlist: Arc<PlayList>, track_id: i32) -> Result<()> {
        self.execute(Command::PlayPause { playlist, track_id }).await
    }

    pub async fn play(&self) -> Result<()> {
        self.execute(Command::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.execute(Command::Pause).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.execute(Command::Stop).await
    }

    pub async fn skip_next(&self) -> Result<()> {
        self.execute(Command::SkipNext).await
    }

    pub async fn skip_previous(&self) -> Result<()> {
        self.execute(Command::SkipPrevious).await
    }

    pub async fn skip_to_track(&self, track_id: i32) -> Result<()> {
        self.execute(Command::SkipToTrack(track_id)).await
    }

    pub async fn seek_to(&self, position_ms: u64) -> Result<()> {
        self.execute(Command::SeekTo(position_ms)).await
    }

    pub async fn set_repeat(&self, mode: RepeatMode) -> Result<()> {
        self.execute(Command::SetRepeat(mode)).await
    }

    pub async fn set_shuffle(&self, mode: ShuffleMode) -> Result<()> {
        self.execute(Command::SetShuffle(mode)).await
    }

    /// Snapshot taken after every message queued before this call has been
    /// applied.
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Message::Snapshot(reply))
            .map_err(|_| PlaybackError::CoordinatorClosed)?;
        response.await.map_err(|_| PlaybackError::CoordinatorClosed)
    }

    /// Last published snapshot, without waiting for the queue.
    pub fn latest(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified whenever the published snapshot changes.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Tear the session down and wait for the task to exit. Safe to call
    /// more than once.
    pub async fn shutdown(&self) {
        let (done, finished) = oneshot::channel();
        if self.sender.send(Message::Shutdown(done)).is_ok() {
            finished.await.ok();
        }

        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Playback coordinator task ended abnormally");
            }
        }
    }
}

// ============================================================================
// Session
// ============================================================================

struct ActiveSession {
    id: Uuid,
    playlist: Arc<PlayList>,
    /// Always a valid position in `playlist.tracks`.
    track_index: usize,
    transport: Arc<dyn MediaTransport>,
    transport_id: u64,
    transport_state: TransportState,
    play_when_ready: bool,
    /// The transport reached Ready at least once.
    prepared: bool,
    repeat: RepeatMode,
    shuffle: ShuffleMode,
    shuffle_order: Option<ShuffleOrder>,
    position_ms: u64,
    duration_ms: Option<u64>,
}

impl ActiveSession {
    fn track(&self) -> &Track {
        &self.playlist.tracks[self.track_index]
    }
}

fn log_side_effect(result: bridge_traits::error::Result<()>, surface: &'static str) {
    if let Err(e) = result {
        warn!(error = %e, surface, "Presentation update failed");
    }
}

// ============================================================================
// Engine
// ============================================================================

struct Engine {
    config: PlaybackConfig,
    bridges: PlaybackBridges,
    event_bus: EventBus,
    mailbox: WeakUnboundedSender<Message>,
    snapshots: watch::Sender<SessionSnapshot>,
    focus: AudioFocusArbiter,
    ticker: ElapsedTicker,
    rng: StdRng,
    session: Option<ActiveSession>,
    /// Modes of the last released session, restored if its playlist is
    /// prepared again.
    retained_modes: Option<(i32, RepeatMode, ShuffleMode)>,
    next_transport_id: u64,
    presented: PlaybackState,
    notification: Option<NotificationHandle>,
    foreground: bool,
    noisy_registered: bool,
}

impl Engine {
    fn new(
        bridges: PlaybackBridges,
        event_bus: EventBus,
        config: PlaybackConfig,
        mailbox: WeakUnboundedSender<Message>,
        snapshots: watch::Sender<SessionSnapshot>,
    ) -> Self {
        let focus = AudioFocusArbiter::new(
            bridges.focus_manager.clone(),
            Arc::new(FocusMailbox(mailbox.clone())),
            config.duck_volume,
        );
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            ticker: ElapsedTicker::new(config.tick_interval()),
            config,
            bridges,
            event_bus,
            mailbox,
            snapshots,
            focus,
            rng,
            session: None,
            retained_modes: None,
            next_transport_id: 0,
            presented: PlaybackState::Stopped,
            notification: None,
            foreground: false,
            noisy_registered: false,
        }
    }

    async fn run(mut self, mut receiver: UnboundedReceiver<Message>) {
        info!("Playback coordinator started");
        let mut shutdown = None;

        while let Some(message) = receiver.recv().await {
            match message {
                Message::Shutdown(done) => {
                    shutdown = Some(done);
                    break;
                }
                Message::Snapshot(reply) => {
                    reply.send(self.snapshot()).ok();
                }
                Message::Command { command, reply } => {
                    let result = self.handle_command(command).await;
                    self.reconcile().await;
                    reply.send(result).ok();
                }
                Message::Transport {
                    transport_id,
                    signal,
                } => {
                    self.on_transport_signal(transport_id, signal).await;
                    self.reconcile().await;
                }
                Message::Focus(change) => {
                    self.on_focus_change(change).await;
                    self.reconcile().await;
                }
                Message::BecomingNoisy => {
                    self.on_becoming_noisy().await;
                    self.reconcile().await;
                }
                Message::Tick { generation } => self.on_tick(generation),
            }
        }

        self.teardown().await;
        self.reconcile().await;
        self.ticker.stop();
        info!("Playback coordinator stopped");

        if let Some(done) = shutdown {
            done.send(()).ok();
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    #[instrument(skip_all, fields(command = command.name()))]
    async fn handle_command(&mut self, command: Command) -> Result<()> {
        let result = match command {
            Command::Prepare { playlist, track_id } => self.prepare(playlist, track_id).await,
            Command::PlayPause { playlist, track_id } => self.play_pause(playlist, track_id).await,
            Command::Play => self.play().await,
            Command::Pause => self.pause().await,
            Command::Stop => {
                self.teardown().await;
                Ok(())
            }
            Command::SkipNext => self.skip(true).await,
            Command::SkipPrevious => self.skip(false).await,
            Command::SkipToTrack(track_id) => self.skip_to_track(track_id).await,
            Command::SeekTo(position_ms) => self.seek_to(position_ms).await,
            Command::SetRepeat(mode) => self.set_repeat(mode).await,
            Command::SetShuffle(mode) => self.set_shuffle(mode).await,
        };

        match &result {
            Err(e) if e.is_rejection() => debug!(error = %e, "Command rejected"),
            Err(e) => warn!(error = %e, recoverable = e.is_recoverable(), "Command failed"),
            Ok(()) => {}
        }
        result
    }

    async fn prepare(&mut self, playlist: Arc<PlayList>, track_id: i32) -> Result<()> {
        if playlist.is_empty() {
            return Err(PlaybackError::EmptyPlaylist(playlist.id));
        }
        let index = playlist
            .index_of(track_id)
            .ok_or(PlaybackError::TrackNotFound(track_id))?;

        let previous_modes = self.current_modes();
        let (repeat, shuffle) = self.modes_for(playlist.id);

        self.release_session().await;
        if self.focus.should_abandon_on_pause() {
            self.focus.abandon().await;
        }

        self.next_transport_id += 1;
        let transport_id = self.next_transport_id;
        let uris = playlist.track_uris();
        debug!(
            transport_id,
            tracks = uris.len(),
            first = uris.first().map(|uri| strip_path(uri)).unwrap_or_default(),
            "Creating transport"
        );

        let listener = Arc::new(TransportMailbox {
            mailbox: self.mailbox.clone(),
            transport_id,
        });
        let transport = self
            .bridges
            .transport_factory
            .create(uris, listener)
            .await?;

        if let Err(e) = transport.seek_to(index, 0).await {
            log_side_effect(transport.release().await, "transport");
            return Err(e.into());
        }

        let shuffle_order = (shuffle == ShuffleMode::All)
            .then(|| ShuffleOrder::new(playlist.len(), index, &mut self.rng));
        let session = ActiveSession {
            id: Uuid::new_v4(),
            playlist: playlist.clone(),
            track_index: index,
            transport,
            transport_id,
            transport_state: TransportState::Buffering,
            play_when_ready: false,
            prepared: false,
            repeat,
            shuffle,
            shuffle_order,
            position_ms: 0,
            duration_ms: None,
        };
        let session_id = session.id;
        self.session = Some(session);

        info!(
            %session_id,
            playlist_id = playlist.id,
            track_id,
            "Session prepared"
        );
        self.emit_session(SessionEvent::Prepared {
            session_id: session_id.to_string(),
            playlist_id: playlist.id,
            track_id,
        });
        self.emit(PlaybackEvent::ExtrasChanged {
            playlist_id: playlist.id,
            track_id,
        });

        if previous_modes.0 != repeat {
            self.publish_repeat(repeat).await;
        }
        if previous_modes.1 != shuffle {
            self.publish_shuffle(shuffle).await;
        }

        Ok(())
    }

    async fn play_pause(&mut self, playlist: Arc<PlayList>, track_id: i32) -> Result<()> {
        let current = self
            .session
            .as_ref()
            .map(|s| (s.playlist.id, s.track().id));

        match resolve_play_pause(current, playlist.id, track_id) {
            PlayPauseAction::PrepareAndPlay => {
                self.prepare(playlist, track_id).await?;
                self.play().await
            }
            PlayPauseAction::Toggle => {
                let playing = self.session.as_ref().is_some_and(|s| s.play_when_ready);
                if playing {
                    self.pause().await
                } else {
                    self.play().await
                }
            }
            PlayPauseAction::SkipAndPlay(track_id) => {
                self.skip_to_track(track_id).await?;
                self.play().await
            }
        }
    }

    async fn play(&mut self) -> Result<()> {
        let session = self.session.as_ref().ok_or(PlaybackError::NoActiveSession)?;

        if let TransportState::Error(_) = session.transport_state {
            let playlist = session.playlist.clone();
            let track_id = session.track().id;
            info!(playlist_id = playlist.id, track_id, "Rebuilding failed transport");
            self.prepare(playlist, track_id).await?;
        }

        let already_playing = self.session.as_ref().is_some_and(|s| s.play_when_ready);
        if already_playing && self.focus.is_held() {
            return Ok(());
        }

        if !self.focus.request().await? {
            warn!("Audio focus denied, not starting playback");
            self.emit(PlaybackEvent::FocusDenied);
            return Err(PlaybackError::FocusDenied);
        }

        let session = self.session.as_mut().ok_or(PlaybackError::NoActiveSession)?;
        log_side_effect(
            session.transport.set_volume(self.config.full_volume).await,
            "transport volume",
        );
        session.transport.play().await?;
        session.play_when_ready = true;
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(PlaybackError::NoActiveSession)?;
        session.play_when_ready = false;
        log_side_effect(session.transport.pause().await, "transport");

        if self.focus.should_abandon_on_pause() {
            self.focus.abandon().await;
        }
        Ok(())
    }

    async fn skip(&mut self, forward: bool) -> Result<()> {
        let session = self.session.as_mut().ok_or(PlaybackError::NoActiveSession)?;
        let len = session.playlist.len();
        let current = session.track_index;

        let target = match (&session.shuffle_order, forward) {
            (Some(order), true) => order.next_after(current),
            (Some(order), false) => order.previous_before(current),
            (None, true) => next_index(len, current),
            (None, false) => previous_index(len, current),
        };

        session.transport.seek_to(target, 0).await?;
        session.track_index = target;
        session.position_ms = 0;
        debug!(from = current, to = target, forward, "Skipped");

        if !session.play_when_ready {
            self.play().await?;
        }
        Ok(())
    }

    async fn skip_to_track(&mut self, track_id: i32) -> Result<()> {
        let session = self.session.as_mut().ok_or(PlaybackError::NoActiveSession)?;
        let index = session
            .playlist
            .index_of(track_id)
            .ok_or(PlaybackError::TrackNotFound(track_id))?;

        session.transport.seek_to(index, 0).await?;
        session.track_index = index;
        session.position_ms = 0;
        Ok(())
    }

    async fn seek_to(&mut self, position_ms: u64) -> Result<()> {
        let session = self.session.as_ref().ok_or(PlaybackError::NoActiveSession)?;
        let target = match session.transport.duration_ms() {
            Some(duration) => position_ms.min(duration),
            None => position_ms,
        };

        session
            .transport
            .seek_to(session.track_index, target)
            .await?;
        Ok(())
    }

    async fn set_repeat(&mut self, mode: RepeatMode) -> Result<()> {
        let session = self.session.as_mut().ok_or(PlaybackError::NoActiveSession)?;
        let mode = if mode == session.repeat {
            RepeatMode::Off
        } else {
            mode
        };
        session.repeat = mode;

        if session.prepared {
            session.transport.set_repeat_mode(mode).await?;
        }
        self.publish_repeat(mode).await;
        Ok(())
    }

    async fn set_shuffle(&mut self, mode: ShuffleMode) -> Result<()> {
        let session = self.session.as_mut().ok_or(PlaybackError::NoActiveSession)?;
        let mode = if mode == session.shuffle {
            ShuffleMode::Off
        } else {
            mode
        };
        session.shuffle = mode;
        let (len, current) = (session.playlist.len(), session.track_index);
        session.shuffle_order =
            (mode == ShuffleMode::All).then(|| ShuffleOrder::new(len, current, &mut self.rng));

        if session.prepared {
            let order = session.shuffle_order.clone().map(ShuffleOrder::into_vec);
            session.transport.set_shuffle_order(order).await?;
        }
        self.publish_shuffle(mode).await;
        Ok(())
    }

    /// Stop and release the transport and drop the session. Focus and
    /// presentation are left alone.
    async fn release_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        if session.play_when_ready {
            log_side_effect(session.transport.pause().await, "transport");
        }
        log_side_effect(session.transport.stop().await, "transport");
        log_side_effect(session.transport.release().await, "transport");

        self.retained_modes = Some((session.playlist.id, session.repeat, session.shuffle));
        info!(session_id = %session.id, "Session released");
        self.emit_session(SessionEvent::Released {
            session_id: session.id.to_string(),
        });
    }

    /// Full stop. Idempotent.
    async fn teardown(&mut self) {
        self.release_session().await;
        self.focus.abandon().await;
    }

    // ------------------------------------------------------------------------
    // Platform callbacks
    // ------------------------------------------------------------------------

    async fn on_transport_signal(&mut self, transport_id: u64, signal: TransportSignal) {
        let Some(session) = self.session.as_mut() else {
            trace!(transport_id, "Callback without a session");
            return;
        };
        if session.transport_id != transport_id {
            trace!(transport_id, "Dropping callback from released transport");
            return;
        }

        if signal == TransportSignal::Discontinuity {
            self.on_discontinuity().await;
            return;
        }

        let Some(next) = session.transport_state.apply(&signal) else {
            return;
        };
        debug!(from = ?session.transport_state, to = ?next, "Transport state changed");
        session.transport_state = next.clone();

        match next {
            TransportState::Ended => {
                info!("Playlist finished");
                self.teardown().await;
            }
            TransportState::Error(message) => {
                error!(%message, "Transport failed");
                session.play_when_ready = false;
                self.focus.abandon().await;
            }
            TransportState::Playing | TransportState::Paused => {
                let duration = session.transport.duration_ms();
                let duration_changed = duration != session.duration_ms;
                session.duration_ms = duration;

                if !session.prepared {
                    session.prepared = true;
                    let order = session.shuffle_order.clone().map(ShuffleOrder::into_vec);
                    log_side_effect(
                        session.transport.set_repeat_mode(session.repeat).await,
                        "transport repeat",
                    );
                    log_side_effect(
                        session.transport.set_shuffle_order(order).await,
                        "transport shuffle",
                    );
                }

                if duration_changed {
                    self.push_metadata().await;
                }
            }
            TransportState::Idle | TransportState::Buffering => {}
        }
    }

    async fn on_discontinuity(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let last = session.playlist.len().saturating_sub(1);
        session.track_index = session.transport.current_window_index().min(last);
        session.position_ms = session.transport.current_position_ms();
        session.duration_ms = session.transport.duration_ms();

        let playlist_id = session.playlist.id;
        let track_id = session.track().id;
        let position_ms = session.position_ms;
        let duration_ms = session.duration_ms;
        debug!(track_id, position_ms, "Position discontinuity");

        self.push_metadata().await;
        if self.presented != PlaybackState::Stopped {
            let paused = !self.presented.is_active();
            self.render_notification(paused).await;
        }
        self.emit(PlaybackEvent::ExtrasChanged {
            playlist_id,
            track_id,
        });
        self.emit(PlaybackEvent::ElapsedTime {
            position_ms,
            duration_ms,
        });
    }

    async fn on_focus_change(&mut self, change: FocusChange) {
        let playing = self.session.as_ref().is_some_and(|s| s.play_when_ready);

        match self.focus.on_focus_change(change, playing) {
            FocusIntent::Resume => {
                if let Err(e) = self.play().await {
                    warn!(error = %e, "Could not resume after focus gain");
                }
            }
            FocusIntent::RestoreVolume => self.set_volume(self.config.full_volume).await,
            FocusIntent::Duck { volume } => self.set_volume(volume).await,
            FocusIntent::Pause => {
                if let Err(e) = self.pause().await {
                    debug!(error = %e, "Nothing to pause on focus loss");
                }
            }
            FocusIntent::Abandon => self.focus.abandon().await,
            FocusIntent::Ignore => {}
        }
    }

    async fn on_becoming_noisy(&mut self) {
        let playing = self.session.as_ref().is_some_and(|s| s.play_when_ready);
        if playing {
            info!("Audio output becoming noisy, pausing");
            if let Err(e) = self.pause().await {
                warn!(error = %e, "Pause on becoming noisy failed");
            }
        }
    }

    fn on_tick(&mut self, generation: u64) {
        if !self.ticker.is_current(generation) {
            trace!(generation, "Stale tick");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        session.position_ms = session.transport.current_position_ms();
        let event = PlaybackEvent::ElapsedTime {
            position_ms: session.position_ms,
            duration_ms: session.duration_ms,
        };
        self.emit(event);
        self.publish_snapshot();
    }

    async fn set_volume(&self, volume: f32) {
        if let Some(session) = &self.session {
            log_side_effect(session.transport.set_volume(volume).await, "transport volume");
        }
    }

    // ------------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------------

    fn derive_state(&self) -> PlaybackState {
        let Some(session) = &self.session else {
            return PlaybackState::Stopped;
        };

        match session.transport_state {
            TransportState::Idle | TransportState::Ended => PlaybackState::Stopped,
            TransportState::Buffering => PlaybackState::Buffering,
            TransportState::Playing | TransportState::Paused => {
                if session.play_when_ready && self.focus.is_held() {
                    if session.transport_state == TransportState::Playing {
                        PlaybackState::Playing
                    } else {
                        PlaybackState::Buffering
                    }
                } else {
                    PlaybackState::Paused
                }
            }
            TransportState::Error(_) => PlaybackState::Error,
        }
    }

    async fn reconcile(&mut self) {
        let state = self.derive_state();

        if state == PlaybackState::Playing {
            let mailbox = self.mailbox.clone();
            self.ticker
                .start(move |generation| post(&mailbox, Message::Tick { generation }));
        } else {
            self.ticker.stop();
        }

        if state != self.presented {
            info!(from = %self.presented, to = %state, "Playback state changed");
            self.presented = state;

            let position_ms = self.session.as_ref().map_or(0, |s| s.position_ms);
            log_side_effect(
                self.bridges
                    .media_session
                    .set_playback_state(state, position_ms, PlaybackActions::for_state(state))
                    .await,
                "media session",
            );
            self.emit(PlaybackEvent::StateChanged { state, position_ms });
            self.present(state).await;
        }

        self.publish_snapshot();
    }

    async fn present(&mut self, state: PlaybackState) {
        match state {
            PlaybackState::Playing => {
                self.push_metadata().await;
                if let Some(handle) = self.render_notification(false).await {
                    let entered = self
                        .bridges
                        .notification_surface
                        .start_foreground(handle)
                        .await;
                    match entered {
                        Ok(()) => self.set_foreground(true),
                        Err(e) => warn!(error = %e, "Could not enter foreground"),
                    }
                }
                self.register_noisy_listener().await;
            }
            PlaybackState::Buffering => {
                self.push_metadata().await;
                self.render_notification(false).await;
                self.leave_foreground(false).await;
            }
            PlaybackState::Paused => {
                self.render_notification(true).await;
                self.leave_foreground(false).await;
                self.unregister_noisy_listener().await;
            }
            PlaybackState::Stopped => {
                self.leave_foreground(true).await;
                self.notification = None;
                self.unregister_noisy_listener().await;
            }
            PlaybackState::Error => {
                self.render_notification(true).await;
                self.leave_foreground(false).await;
                self.unregister_noisy_listener().await;

                let message = match self.session.as_ref().map(|s| &s.transport_state) {
                    Some(TransportState::Error(message)) => message.clone(),
                    _ => "transport failure".to_string(),
                };
                let recoverable = PlaybackError::Transport(message.clone()).is_recoverable();
                self.emit(PlaybackEvent::Error {
                    message,
                    recoverable,
                });
            }
        }
    }

    // ------------------------------------------------------------------------
    // Presentation
    // ------------------------------------------------------------------------

    async fn push_metadata(&self) {
        let Some(session) = &self.session else {
            return;
        };
        let track = session.track();

        log_side_effect(
            self.bridges
                .media_session
                .set_metadata(SessionMetadata {
                    media_id: track.id.to_string(),
                    title: track.name.clone(),
                    playlist_title: session.playlist.name.clone(),
                    playlist_id: session.playlist.id,
                    duration_ms: session.duration_ms,
                })
                .await,
            "media session",
        );
        self.emit(PlaybackEvent::MetadataChanged {
            track_id: track.id,
            track_name: track.name.clone(),
            playlist_id: session.playlist.id,
            playlist_name: session.playlist.name.clone(),
            duration_ms: session.duration_ms,
        });
    }

    async fn render_notification(&mut self, paused: bool) -> Option<NotificationHandle> {
        let session = self.session.as_ref()?;
        let content = NotificationContent {
            track_title: session.track().name.clone(),
            playlist_title: session.playlist.name.clone(),
            paused,
        };

        let rendered = self
            .bridges
            .notification_surface
            .render_notification(content)
            .await;
        match rendered {
            Ok(handle) => {
                self.notification = Some(handle);
                Some(handle)
            }
            Err(e) => {
                warn!(error = %e, "Could not render notification");
                None
            }
        }
    }

    async fn leave_foreground(&mut self, remove_notification: bool) {
        log_side_effect(
            self.bridges
                .notification_surface
                .stop_foreground(remove_notification)
                .await,
            "notification",
        );
        self.set_foreground(false);
    }

    fn set_foreground(&mut self, foreground: bool) {
        if self.foreground != foreground {
            self.foreground = foreground;
            self.emit_session(SessionEvent::ForegroundChanged { foreground });
        }
    }

    async fn register_noisy_listener(&mut self) {
        if self.noisy_registered {
            return;
        }
        let Some(monitor) = &self.bridges.route_monitor else {
            return;
        };

        let listener = Arc::new(NoisyMailbox(self.mailbox.clone()));
        let registered = monitor.register(listener).await;
        match registered {
            Ok(()) => self.noisy_registered = true,
            Err(e) => warn!(error = %e, "Could not register becoming-noisy listener"),
        }
    }

    async fn unregister_noisy_listener(&mut self) {
        if !self.noisy_registered {
            return;
        }
        if let Some(monitor) = &self.bridges.route_monitor {
            log_side_effect(monitor.unregister().await, "route monitor");
        }
        self.noisy_registered = false;
    }

    async fn publish_repeat(&self, mode: RepeatMode) {
        log_side_effect(
            self.bridges.media_session.set_repeat_mode(mode).await,
            "media session",
        );
        self.emit(PlaybackEvent::RepeatModeChanged { mode });
    }

    async fn publish_shuffle(&self, mode: ShuffleMode) {
        log_side_effect(
            self.bridges.media_session.set_shuffle_mode(mode).await,
            "media session",
        );
        self.emit(PlaybackEvent::ShuffleModeChanged { mode });
    }

    // ------------------------------------------------------------------------
    // Snapshots and events
    // ------------------------------------------------------------------------

    fn current_modes(&self) -> (RepeatMode, ShuffleMode) {
        match (&self.session, self.retained_modes) {
            (Some(session), _) => (session.repeat, session.shuffle),
            (None, Some((_, repeat, shuffle))) => (repeat, shuffle),
            (None, None) => (RepeatMode::Off, ShuffleMode::Off),
        }
    }

    /// Modes a session for `playlist_id` starts with.
    fn modes_for(&self, playlist_id: i32) -> (RepeatMode, ShuffleMode) {
        match (&self.session, self.retained_modes) {
            (Some(session), _) if session.playlist.id == playlist_id => {
                (session.repeat, session.shuffle)
            }
            (None, Some((retained, repeat, shuffle))) if retained == playlist_id => {
                (repeat, shuffle)
            }
            _ => (RepeatMode::Off, ShuffleMode::Off),
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        let (repeat, shuffle) = self.current_modes();
        let session = self.session.as_ref();

        SessionSnapshot {
            state: self.presented,
            elapsed_ms: session.map_or(0, |s| s.position_ms),
            duration_ms: session.and_then(|s| s.duration_ms),
            current: session.map(|s| (s.track().clone(), s.playlist.clone())),
            repeat,
            shuffle,
            session_id: session.map(|s| s.id),
            foreground: self.foreground,
            focus_held: self.focus.is_held(),
            ticking: self.ticker.is_running(),
            play_when_ready: session.is_some_and(|s| s.play_when_ready),
        }
    }

    fn publish_snapshot(&self) {
        let snapshot = self.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        self.event_bus.emit(CoreEvent::Playback(event)).ok();
    }

    fn emit_session(&self, event: SessionEvent) {
        self.event_bus.emit(CoreEvent::Session(event)).ok();
    }
}
