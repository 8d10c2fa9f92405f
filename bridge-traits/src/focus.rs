//! Audio focus bridge.
//!
//! The OS owns audio output and hands out focus to one application at a time.
//! Hosts wrap their platform API (Android `AudioManager`, an iOS audio
//! session) behind [`AudioFocusManager`] and report focus changes through the
//! [`FocusChangeListener`] the core registers with each request.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;

/// Focus change reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusChange {
    /// Focus (re)acquired.
    Gain,
    /// Another app needs output briefly and tolerates us playing quietly.
    LossTransientCanDuck,
    /// Another app needs output briefly; we are expected to pause.
    LossTransient,
    /// Focus lost for an unbounded time.
    Loss,
}

/// Outcome of a focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusRequestResult {
    Granted,
    /// The OS will grant focus later through a `Gain` callback.
    Delayed,
    Failed,
}

impl FocusRequestResult {
    /// Delayed grants are treated as granted.
    pub fn is_granted(&self) -> bool {
        matches!(self, FocusRequestResult::Granted | FocusRequestResult::Delayed)
    }
}

/// Receives focus changes. Invoked on an arbitrary platform thread, so
/// implementations must only enqueue work.
pub trait FocusChangeListener: Send + Sync {
    fn on_focus_change(&self, change: FocusChange);
}

/// Platform audio focus API.
#[async_trait::async_trait]
pub trait AudioFocusManager: Send + Sync {
    /// Request focus for music playback. `listener` receives every later
    /// change until [`abandon_focus`](Self::abandon_focus) is called.
    async fn request_focus(&self, listener: Arc<dyn FocusChangeListener>)
        -> Result<FocusRequestResult>;

    /// Give focus back. Calling it without holding focus is harmless.
    async fn abandon_focus(&self) -> Result<()>;
}
