//! Recording fakes for the platform bridges.
//!
//! Every fake reports its callbacks synchronously from inside the call that
//! triggers them, like a player posting to its own looper would.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    focus::{AudioFocusManager, FocusChange, FocusChangeListener, FocusRequestResult},
    media_session::MediaSessionSurface,
    notification::{NotificationContent, NotificationHandle, NotificationSurface},
    playback::{PlaybackActions, PlaybackState, RepeatMode, SessionMetadata, ShuffleMode},
    route::{AudioRouteMonitor, BecomingNoisyListener},
    transport::{MediaTransport, TransportFactory, TransportListener, TransportStatus},
};
use core_catalog::{PlayList, Track};
use core_playback::{PlaybackBridges, PlaybackConfig, PlaybackCoordinator, SessionSnapshot};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

pub const TRACK_DURATION_MS: u64 = 180_000;

pub fn playlist(id: i32, track_ids: &[i32]) -> Arc<PlayList> {
    let tracks = track_ids
        .iter()
        .map(|&tid| Track::new(tid, format!("Track {}", tid), format!("{}.mp3", tid)))
        .collect();
    Arc::new(PlayList::new(
        id,
        format!("Playlist {}", id),
        format!("https://cdn.example.com/{}", id),
        tracks,
    ))
}

// ============================================================================
// Transport
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Play,
    Pause,
    Stop,
    Release,
    Seek(usize, u64),
    Volume(f32),
    Repeat(RepeatMode),
    Shuffle(Option<Vec<usize>>),
}

#[derive(Default)]
struct FakeState {
    window: usize,
    position: u64,
    playing: bool,
    released: bool,
    volume: f32,
}

pub struct FakeTransport {
    uris: Vec<String>,
    listener: Arc<dyn TransportListener>,
    state: Mutex<FakeState>,
    calls: Mutex<Vec<TransportCall>>,
}

impl FakeTransport {
    fn live_listener(&self) -> Option<Arc<dyn TransportListener>> {
        (!self.state.lock().released).then(|| self.listener.clone())
    }

    fn emit(&self, status: TransportStatus, play_when_ready: bool) {
        if let Some(listener) = self.live_listener() {
            listener.on_state_changed(status, play_when_ready);
        }
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().push(call);
    }

    pub fn uris(&self) -> &[String] {
        &self.uris
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    pub fn seeks(&self) -> Vec<(usize, u64)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::Seek(window, position) => Some((*window, *position)),
                _ => None,
            })
            .collect()
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    /// The last window finished.
    pub fn finish(&self) {
        self.state.lock().playing = false;
        self.emit(TransportStatus::Ended, false);
    }

    pub fn fail(&self, message: &str) {
        if let Some(listener) = self.live_listener() {
            listener.on_error(message.to_string());
        }
    }

    /// Move to `window` on its own, as auto-advance would.
    pub fn advance_to(&self, window: usize) {
        {
            let mut state = self.state.lock();
            state.window = window;
            state.position = 0;
        }
        if let Some(listener) = self.live_listener() {
            listener.on_position_discontinuity();
        }
    }

    /// Always emit directly, even after release.
    pub fn emit_stale(&self, status: TransportStatus, play_when_ready: bool) {
        self.listener.on_state_changed(status, play_when_ready);
    }
}

#[async_trait]
impl MediaTransport for FakeTransport {
    async fn play(&self) -> Result<()> {
        self.record(TransportCall::Play);
        self.state.lock().playing = true;
        self.emit(TransportStatus::Ready, true);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.record(TransportCall::Pause);
        self.state.lock().playing = false;
        self.emit(TransportStatus::Ready, false);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.record(TransportCall::Stop);
        self.state.lock().playing = false;
        self.emit(TransportStatus::Idle, false);
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        self.record(TransportCall::Release);
        self.state.lock().released = true;
        Ok(())
    }

    async fn seek_to(&self, window_index: usize, position_ms: u64) -> Result<()> {
        self.record(TransportCall::Seek(window_index, position_ms));
        if window_index >= self.uris.len() {
            return Err(BridgeError::OperationFailed("no such window".to_string()));
        }
        {
            let mut state = self.state.lock();
            state.window = window_index;
            state.position = position_ms;
        }
        if let Some(listener) = self.live_listener() {
            listener.on_position_discontinuity();
        }
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        self.record(TransportCall::Volume(volume));
        self.state.lock().volume = volume;
        Ok(())
    }

    async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        self.record(TransportCall::Repeat(mode));
        Ok(())
    }

    async fn set_shuffle_order(&self, order: Option<Vec<usize>>) -> Result<()> {
        self.record(TransportCall::Shuffle(order));
        Ok(())
    }

    fn current_window_index(&self) -> usize {
        self.state.lock().window
    }

    fn current_position_ms(&self) -> u64 {
        self.state.lock().position
    }

    fn duration_ms(&self) -> Option<u64> {
        Some(TRACK_DURATION_MS)
    }
}

#[derive(Default)]
pub struct FakeTransportFactory {
    created: Mutex<Vec<Arc<FakeTransport>>>,
}

impl FakeTransportFactory {
    pub fn created(&self) -> usize {
        self.created.lock().len()
    }

    pub fn transport(&self, index: usize) -> Arc<FakeTransport> {
        self.created.lock()[index].clone()
    }

    pub fn last(&self) -> Arc<FakeTransport> {
        let created = self.created.lock();
        created[created.len() - 1].clone()
    }

    pub fn live(&self) -> usize {
        self.created
            .lock()
            .iter()
            .filter(|transport| !transport.is_released())
            .count()
    }
}

#[async_trait]
impl TransportFactory for FakeTransportFactory {
    async fn create(
        &self,
        uris: Vec<String>,
        listener: Arc<dyn TransportListener>,
    ) -> Result<Arc<dyn MediaTransport>> {
        let transport = Arc::new(FakeTransport {
            uris,
            listener,
            state: Mutex::new(FakeState {
                volume: 1.0,
                ..FakeState::default()
            }),
            calls: Mutex::new(Vec::new()),
        });
        self.created.lock().push(transport.clone());

        transport.emit(TransportStatus::Buffering, false);
        transport.emit(TransportStatus::Ready, false);
        Ok(transport)
    }
}

// ============================================================================
// Focus
// ============================================================================

pub struct FakeFocus {
    grant: AtomicBool,
    requests: AtomicUsize,
    abandons: AtomicUsize,
    held: AtomicBool,
    listener: Mutex<Option<Arc<dyn FocusChangeListener>>>,
}

impl Default for FakeFocus {
    fn default() -> Self {
        Self {
            grant: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
            abandons: AtomicUsize::new(0),
            held: AtomicBool::new(false),
            listener: Mutex::new(None),
        }
    }
}

impl FakeFocus {
    pub fn deny(&self) {
        self.grant.store(false, Ordering::SeqCst);
    }

    pub fn allow(&self) {
        self.grant.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn abandons(&self) -> usize {
        self.abandons.load(Ordering::SeqCst)
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    /// Deliver a change to the last registered listener, held or not.
    pub fn dispatch(&self, change: FocusChange) {
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_focus_change(change);
        }
    }
}

#[async_trait]
impl AudioFocusManager for FakeFocus {
    async fn request_focus(
        &self,
        listener: Arc<dyn FocusChangeListener>,
    ) -> Result<FocusRequestResult> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.grant.load(Ordering::SeqCst) {
            return Ok(FocusRequestResult::Failed);
        }
        *self.listener.lock() = Some(listener);
        self.held.store(true, Ordering::SeqCst);
        Ok(FocusRequestResult::Granted)
    }

    async fn abandon_focus(&self) -> Result<()> {
        self.abandons.fetch_add(1, Ordering::SeqCst);
        self.held.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Presentation surfaces
// ============================================================================

#[derive(Default)]
struct NotificationLog {
    rendered: Vec<NotificationContent>,
    foreground: bool,
    visible: bool,
}

#[derive(Default)]
pub struct RecordingNotification {
    log: Mutex<NotificationLog>,
}

impl RecordingNotification {
    pub fn is_foreground(&self) -> bool {
        self.log.lock().foreground
    }

    pub fn is_visible(&self) -> bool {
        self.log.lock().visible
    }

    pub fn last(&self) -> Option<NotificationContent> {
        self.log.lock().rendered.last().cloned()
    }
}

#[async_trait]
impl NotificationSurface for RecordingNotification {
    async fn render_notification(
        &self,
        content: NotificationContent,
    ) -> Result<NotificationHandle> {
        let mut log = self.log.lock();
        log.rendered.push(content);
        log.visible = true;
        Ok(NotificationHandle(log.rendered.len() as u32))
    }

    async fn start_foreground(&self, _handle: NotificationHandle) -> Result<()> {
        self.log.lock().foreground = true;
        Ok(())
    }

    async fn stop_foreground(&self, remove_notification: bool) -> Result<()> {
        let mut log = self.log.lock();
        log.foreground = false;
        if remove_notification {
            log.visible = false;
        }
        Ok(())
    }
}

#[derive(Default)]
struct SessionLog {
    states: Vec<(PlaybackState, PlaybackActions)>,
    metadata: Vec<SessionMetadata>,
    repeat: RepeatMode,
    shuffle: ShuffleMode,
}

#[derive(Default)]
pub struct RecordingSession {
    log: Mutex<SessionLog>,
}

impl RecordingSession {
    pub fn states(&self) -> Vec<PlaybackState> {
        self.log.lock().states.iter().map(|(state, _)| *state).collect()
    }

    pub fn last_actions(&self) -> Option<PlaybackActions> {
        self.log.lock().states.last().map(|(_, actions)| *actions)
    }

    pub fn last_metadata(&self) -> Option<SessionMetadata> {
        self.log.lock().metadata.last().cloned()
    }

    pub fn modes(&self) -> (RepeatMode, ShuffleMode) {
        let log = self.log.lock();
        (log.repeat, log.shuffle)
    }
}

#[async_trait]
impl MediaSessionSurface for RecordingSession {
    async fn set_active(&self, _active: bool) -> Result<()> {
        Ok(())
    }

    async fn set_metadata(&self, metadata: SessionMetadata) -> Result<()> {
        self.log.lock().metadata.push(metadata);
        Ok(())
    }

    async fn set_playback_state(
        &self,
        state: PlaybackState,
        _position_ms: u64,
        actions: PlaybackActions,
    ) -> Result<()> {
        self.log.lock().states.push((state, actions));
        Ok(())
    }

    async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        self.log.lock().repeat = mode;
        Ok(())
    }

    async fn set_shuffle_mode(&self, mode: ShuffleMode) -> Result<()> {
        self.log.lock().shuffle = mode;
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRoute {
    listener: Mutex<Option<Arc<dyn BecomingNoisyListener>>>,
}

impl FakeRoute {
    pub fn is_registered(&self) -> bool {
        self.listener.lock().is_some()
    }

    pub fn unplug_headphones(&self) {
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_becoming_noisy();
        }
    }
}

#[async_trait]
impl AudioRouteMonitor for FakeRoute {
    async fn register(&self, listener: Arc<dyn BecomingNoisyListener>) -> Result<()> {
        *self.listener.lock() = Some(listener);
        Ok(())
    }

    async fn unregister(&self) -> Result<()> {
        *self.listener.lock() = None;
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub coordinator: PlaybackCoordinator,
    pub factory: Arc<FakeTransportFactory>,
    pub focus: Arc<FakeFocus>,
    pub notification: Arc<RecordingNotification>,
    pub media_session: Arc<RecordingSession>,
    pub route: Arc<FakeRoute>,
    pub events: broadcast::Receiver<CoreEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(PlaybackConfig::default().with_shuffle_seed(42))
    }

    pub fn with_config(config: PlaybackConfig) -> Self {
        let factory = Arc::new(FakeTransportFactory::default());
        let focus = Arc::new(FakeFocus::default());
        let notification = Arc::new(RecordingNotification::default());
        let media_session = Arc::new(RecordingSession::default());
        let route = Arc::new(FakeRoute::default());

        let bridges = PlaybackBridges {
            transport_factory: factory.clone(),
            focus_manager: focus.clone(),
            notification_surface: notification.clone(),
            media_session: media_session.clone(),
            route_monitor: Some(route.clone()),
        };
        let bus = EventBus::new(512);
        let events = bus.subscribe();
        let coordinator =
            PlaybackCoordinator::spawn(bridges, bus, config).expect("valid playback config");

        Self {
            coordinator,
            factory,
            focus,
            notification,
            media_session,
            route,
            events,
        }
    }

    /// Snapshot once every callback chain triggered so far has drained.
    ///
    /// A command's callbacks are queued behind it; handling them can queue
    /// one more round (focus gain resumes, which makes the transport report
    /// Ready), so a few round-trips are enough.
    pub async fn settle(&self) -> SessionSnapshot {
        let mut snapshot = self.coordinator.snapshot().await.expect("coordinator alive");
        for _ in 0..3 {
            snapshot = self.coordinator.snapshot().await.expect("coordinator alive");
        }
        snapshot
    }

    pub fn drain_events(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn drain_states(&mut self) -> Vec<PlaybackState> {
        self.drain_events()
            .into_iter()
            .filter_map(|event| match event {
                CoreEvent::Playback(PlaybackEvent::StateChanged { state, .. }) => Some(state),
                _ => None,
            })
            .collect()
    }
}

pub fn elapsed_events(events: &[CoreEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, CoreEvent::Playback(PlaybackEvent::ElapsedTime { .. })))
        .count()
}
