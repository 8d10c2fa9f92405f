//! Audio route monitoring on desktop.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    route::{AudioRouteMonitor, BecomingNoisyListener},
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Holds the registered listener; the host calls
/// [`notify_becoming_noisy`](Self::notify_becoming_noisy) when its output
/// device disappears.
#[derive(Default)]
pub struct DesktopRouteMonitor {
    listener: Mutex<Option<Arc<dyn BecomingNoisyListener>>>,
}

impl DesktopRouteMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self) -> bool {
        self.listener.lock().is_some()
    }

    pub fn notify_becoming_noisy(&self) {
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            debug!("Output route became noisy");
            listener.on_becoming_noisy();
        }
    }
}

#[async_trait]
impl AudioRouteMonitor for DesktopRouteMonitor {
    async fn register(&self, listener: Arc<dyn BecomingNoisyListener>) -> Result<()> {
        *self.listener.lock() = Some(listener);
        Ok(())
    }

    async fn unregister(&self) -> Result<()> {
        self.listener.lock().take();
        Ok(())
    }
}
