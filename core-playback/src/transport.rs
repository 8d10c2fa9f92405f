//! Transport state tracking
//!
//! Folds raw transport callbacks into a [`TransportState`]. `Ended` and
//! `Error` are terminal: a transport in either state is torn down or
//! rebuilt, never revived.

use bridge_traits::transport::TransportStatus;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransportState {
    Idle,
    /// Freshly created transports start out loading.
    #[default]
    Buffering,
    Playing,
    Paused,
    Ended,
    Error(String),
}

/// A callback from the transport, detached from the platform thread it
/// arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSignal {
    StateChanged {
        status: TransportStatus,
        play_when_ready: bool,
    },
    Discontinuity,
    Error(String),
}

impl TransportState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransportState::Ended | TransportState::Error(_))
    }

    /// Ready to render: the first time a transport gets here its modes can
    /// be applied.
    pub fn is_ready(&self) -> bool {
        matches!(self, TransportState::Playing | TransportState::Paused)
    }

    /// State after `signal`, or `None` if nothing changed.
    pub fn apply(&self, signal: &TransportSignal) -> Option<TransportState> {
        if self.is_terminal() {
            return None;
        }

        let next = match signal {
            TransportSignal::Discontinuity => return None,
            TransportSignal::Error(message) => TransportState::Error(message.clone()),
            TransportSignal::StateChanged {
                status,
                play_when_ready,
            } => match status {
                TransportStatus::Idle => TransportState::Idle,
                TransportStatus::Buffering => TransportState::Buffering,
                TransportStatus::Ready if *play_when_ready => TransportState::Playing,
                TransportStatus::Ready => TransportState::Paused,
                TransportStatus::Ended => TransportState::Ended,
            },
        };

        (next != *self).then_some(next)
    }
}
