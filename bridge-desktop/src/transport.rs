//! Headless transport.
//!
//! Renders no audio. Position advances with the injected [`Clock`] while
//! playing, and lifecycle callbacks are emitted the way a streaming player
//! would emit them: `Buffering` right after creation, `Ready` once "loaded",
//! `Ready(play_when_ready = true)` on play. Useful for desktop hosts without
//! an audio backend and for exercising the core end to end.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    playback::RepeatMode,
    time::{Clock, SystemClock},
    transport::{MediaTransport, TransportFactory, TransportListener, TransportStatus},
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

pub struct HeadlessTransportFactory {
    clock: Arc<dyn Clock>,
    track_duration: Option<Duration>,
    live: Arc<AtomicUsize>,
    last: Mutex<Option<Arc<HeadlessTransport>>>,
}

impl HeadlessTransportFactory {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            track_duration: None,
            live: Arc::new(AtomicUsize::new(0)),
            last: Mutex::new(None),
        }
    }

    /// Report every window as lasting `duration`.
    pub fn with_track_duration(mut self, duration: Duration) -> Self {
        self.track_duration = Some(duration);
        self
    }

    /// Transports created and not yet released.
    pub fn live_transports(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Most recently created transport.
    pub fn last_transport(&self) -> Option<Arc<HeadlessTransport>> {
        self.last.lock().clone()
    }
}

impl Default for HeadlessTransportFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportFactory for HeadlessTransportFactory {
    async fn create(
        &self,
        uris: Vec<String>,
        listener: Arc<dyn TransportListener>,
    ) -> Result<Arc<dyn MediaTransport>> {
        if uris.is_empty() {
            return Err(BridgeError::OperationFailed(
                "Cannot build a transport without media".to_string(),
            ));
        }

        debug!(windows = uris.len(), "Creating headless transport");
        let transport = Arc::new(HeadlessTransport {
            uris,
            listener,
            clock: self.clock.clone(),
            duration_ms: self.track_duration.map(|d| d.as_millis() as u64),
            live: self.live.clone(),
            state: Mutex::new(HeadlessState {
                volume: 1.0,
                ..HeadlessState::default()
            }),
        });
        self.live.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Some(transport.clone());

        transport.emit(TransportStatus::Buffering, false);
        transport.emit(TransportStatus::Ready, false);

        Ok(transport)
    }
}

#[derive(Debug, Default)]
struct HeadlessState {
    window: usize,
    /// Position at the moment `started_at` was taken (or the frozen position
    /// while paused).
    anchor_ms: u64,
    started_at: Option<i64>,
    volume: f32,
    repeat: RepeatMode,
    order: Option<Vec<usize>>,
    released: bool,
}

pub struct HeadlessTransport {
    uris: Vec<String>,
    listener: Arc<dyn TransportListener>,
    clock: Arc<dyn Clock>,
    duration_ms: Option<u64>,
    live: Arc<AtomicUsize>,
    state: Mutex<HeadlessState>,
}

impl HeadlessTransport {
    pub fn uris(&self) -> &[String] {
        &self.uris
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().started_at.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.state.lock().repeat
    }

    /// Simulate the current window running out: loop it under repeat-one,
    /// advance to the next window in play order, or end after the last one.
    pub fn finish_current(&self) {
        let advanced = {
            let mut state = self.state.lock();
            if state.released {
                return;
            }
            if state.repeat == RepeatMode::One {
                self.restart(&mut state);
                true
            } else {
                match self.next_window(&state) {
                    Some(next) => {
                        state.window = next;
                        self.restart(&mut state);
                        true
                    }
                    None => {
                        state.started_at = None;
                        state.anchor_ms = 0;
                        false
                    }
                }
            }
        };

        if advanced {
            self.listener.on_position_discontinuity();
        } else {
            self.emit(TransportStatus::Ended, false);
        }
    }

    /// Surface a decoder failure.
    pub fn fail(&self, message: impl Into<String>) {
        if !self.state.lock().released {
            self.listener.on_error(message.into());
        }
    }

    fn next_window(&self, state: &HeadlessState) -> Option<usize> {
        match &state.order {
            Some(order) => {
                let at = order.iter().position(|w| *w == state.window)?;
                order.get(at + 1).copied()
            }
            None => {
                let next = state.window + 1;
                (next < self.uris.len()).then_some(next)
            }
        }
    }

    fn restart(&self, state: &mut HeadlessState) {
        state.anchor_ms = 0;
        if state.started_at.is_some() {
            state.started_at = Some(self.clock.unix_timestamp_millis());
        }
    }

    fn position(&self, state: &HeadlessState) -> u64 {
        let running = state
            .started_at
            .map(|start| (self.clock.unix_timestamp_millis() - start).max(0) as u64)
            .unwrap_or(0);
        let position = state.anchor_ms.saturating_add(running);
        match self.duration_ms {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    fn emit(&self, status: TransportStatus, play_when_ready: bool) {
        if self.state.lock().released {
            return;
        }
        trace!(?status, play_when_ready, "Headless transport status");
        self.listener.on_state_changed(status, play_when_ready);
    }

    fn ensure_live(&self) -> Result<()> {
        if self.state.lock().released {
            return Err(BridgeError::OperationFailed(
                "Transport already released".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaTransport for HeadlessTransport {
    async fn play(&self) -> Result<()> {
        self.ensure_live()?;
        {
            let mut state = self.state.lock();
            if state.started_at.is_none() {
                state.started_at = Some(self.clock.unix_timestamp_millis());
            }
        }
        self.emit(TransportStatus::Ready, true);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.ensure_live()?;
        {
            let mut state = self.state.lock();
            state.anchor_ms = self.position(&state);
            state.started_at = None;
        }
        self.emit(TransportStatus::Ready, false);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.ensure_live()?;
        {
            let mut state = self.state.lock();
            state.anchor_ms = 0;
            state.started_at = None;
        }
        self.emit(TransportStatus::Idle, false);
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        let mut state = self.state.lock();
        if !state.released {
            state.released = true;
            state.started_at = None;
            self.live.fetch_sub(1, Ordering::SeqCst);
            debug!("Headless transport released");
        }
        Ok(())
    }

    async fn seek_to(&self, window_index: usize, position_ms: u64) -> Result<()> {
        self.ensure_live()?;
        if window_index >= self.uris.len() {
            return Err(BridgeError::OperationFailed(format!(
                "Window {} out of range ({} windows)",
                window_index,
                self.uris.len()
            )));
        }
        {
            let mut state = self.state.lock();
            state.window = window_index;
            state.anchor_ms = match self.duration_ms {
                Some(duration) => position_ms.min(duration),
                None => position_ms,
            };
            if state.started_at.is_some() {
                state.started_at = Some(self.clock.unix_timestamp_millis());
            }
        }
        self.listener.on_position_discontinuity();
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        self.state.lock().volume = volume.clamp(0.0, 1.0);
        Ok(())
    }

    async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        self.state.lock().repeat = mode;
        Ok(())
    }

    async fn set_shuffle_order(&self, order: Option<Vec<usize>>) -> Result<()> {
        self.state.lock().order = order;
        Ok(())
    }

    fn current_window_index(&self) -> usize {
        self.state.lock().window
    }

    fn current_position_ms(&self) -> u64 {
        let state = self.state.lock();
        self.position(&state)
    }

    fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }
}
