//! Audio focus on desktop.
//!
//! Desktop mixers let every application play at once, so focus is granted
//! unconditionally. The listener is kept so a host that does observe
//! competing audio (e.g. a call starting) can forward it with
//! [`DesktopAudioFocus::dispatch`].

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    focus::{AudioFocusManager, FocusChange, FocusChangeListener, FocusRequestResult},
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
pub struct DesktopAudioFocus {
    listener: Mutex<Option<Arc<dyn FocusChangeListener>>>,
}

impl DesktopAudioFocus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Deliver a focus change to the current holder. Returns `false` when
    /// nobody holds focus.
    pub fn dispatch(&self, change: FocusChange) -> bool {
        let listener = self.listener.lock().clone();
        match listener {
            Some(listener) => {
                listener.on_focus_change(change);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl AudioFocusManager for DesktopAudioFocus {
    async fn request_focus(
        &self,
        listener: Arc<dyn FocusChangeListener>,
    ) -> Result<FocusRequestResult> {
        *self.listener.lock() = Some(listener);
        debug!("Audio focus granted");
        Ok(FocusRequestResult::Granted)
    }

    async fn abandon_focus(&self) -> Result<()> {
        if self.listener.lock().take().is_some() {
            debug!("Audio focus abandoned");
        }
        Ok(())
    }
}
