//! Audio focus arbitration
//!
//! Tracks whether the session holds OS audio focus and turns focus changes
//! into playback intents. The arbiter never touches the transport itself;
//! the coordinator applies the returned [`FocusIntent`].

use bridge_traits::focus::{AudioFocusManager, FocusChange, FocusChangeListener};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;

/// What the session currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusHold {
    /// Never requested, or abandoned.
    #[default]
    None,
    Held,
    /// Held, but another app asked us to play quietly.
    Ducked,
    /// Taken away briefly. A later `Gain` resumes playback.
    TransientlyLost,
    /// Taken away for good. Still registered until abandoned.
    Lost,
}

impl FocusHold {
    /// Playback may be audible in this hold.
    pub fn allows_output(&self) -> bool {
        matches!(self, FocusHold::Held | FocusHold::Ducked)
    }
}

/// Reaction the coordinator should apply after a focus change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusIntent {
    /// Start playing again at full volume.
    Resume,
    RestoreVolume,
    Duck { volume: f32 },
    Pause,
    /// Already silent, but the claim is gone for good: give it back.
    Abandon,
    Ignore,
}

/// Pure focus-change policy.
///
/// `hold` is the hold before the change, `is_playing` whether the session
/// wants to play right now.
pub fn classify(
    hold: FocusHold,
    change: FocusChange,
    is_playing: bool,
    resume_on_gain: bool,
    duck_volume: f32,
) -> FocusIntent {
    if hold == FocusHold::None {
        // Stale callback after abandon.
        return FocusIntent::Ignore;
    }

    match change {
        FocusChange::Gain if resume_on_gain && !is_playing => FocusIntent::Resume,
        FocusChange::Gain => FocusIntent::RestoreVolume,
        FocusChange::LossTransientCanDuck if is_playing => FocusIntent::Duck {
            volume: duck_volume,
        },
        FocusChange::LossTransientCanDuck => FocusIntent::Ignore,
        FocusChange::LossTransient | FocusChange::Loss if is_playing => FocusIntent::Pause,
        FocusChange::Loss => FocusIntent::Abandon,
        FocusChange::LossTransient => FocusIntent::Ignore,
    }
}

pub struct AudioFocusArbiter {
    manager: Arc<dyn AudioFocusManager>,
    listener: Arc<dyn FocusChangeListener>,
    hold: FocusHold,
    resume_on_gain: bool,
    duck_volume: f32,
}

impl AudioFocusArbiter {
    pub fn new(
        manager: Arc<dyn AudioFocusManager>,
        listener: Arc<dyn FocusChangeListener>,
        duck_volume: f32,
    ) -> Self {
        Self {
            manager,
            listener,
            hold: FocusHold::None,
            resume_on_gain: false,
            duck_volume,
        }
    }

    pub fn hold(&self) -> FocusHold {
        self.hold
    }

    pub fn is_held(&self) -> bool {
        self.hold.allows_output()
    }

    pub fn resume_on_gain(&self) -> bool {
        self.resume_on_gain
    }

    /// Ask the OS for focus. Returns whether playback may start.
    ///
    /// Requests while focus is already held succeed without another
    /// round-trip.
    pub async fn request(&mut self) -> Result<bool> {
        if self.is_held() {
            return Ok(true);
        }

        let result = self.manager.request_focus(self.listener.clone()).await?;
        debug!(?result, "Audio focus requested");

        if result.is_granted() {
            self.hold = FocusHold::Held;
            self.resume_on_gain = false;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Give focus back. No-op when nothing is held.
    pub async fn abandon(&mut self) {
        self.resume_on_gain = false;
        if self.hold == FocusHold::None {
            return;
        }

        self.hold = FocusHold::None;
        if let Err(e) = self.manager.abandon_focus().await {
            warn!(error = %e, "Failed to abandon audio focus");
        }
    }

    /// Whether a user pause should give focus back. A pause caused by a
    /// transient loss keeps the registration so the gain can resume.
    pub fn should_abandon_on_pause(&self) -> bool {
        !self.resume_on_gain
    }

    /// Record a focus change and return the reaction to apply.
    pub fn on_focus_change(&mut self, change: FocusChange, is_playing: bool) -> FocusIntent {
        let intent = classify(
            self.hold,
            change,
            is_playing,
            self.resume_on_gain,
            self.duck_volume,
        );

        if self.hold == FocusHold::None {
            return intent;
        }

        match change {
            FocusChange::Gain => {
                self.hold = FocusHold::Held;
                self.resume_on_gain = false;
            }
            FocusChange::LossTransientCanDuck => self.hold = FocusHold::Ducked,
            FocusChange::LossTransient => {
                self.hold = FocusHold::TransientlyLost;
                self.resume_on_gain = is_playing || self.resume_on_gain;
            }
            FocusChange::Loss => {
                self.hold = FocusHold::Lost;
                self.resume_on_gain = false;
            }
        }

        debug!(?change, hold = ?self.hold, ?intent, "Audio focus changed");
        intent
    }
}
