//! Audio route changes.
//!
//! "Becoming noisy" is the moment output is about to move to the built-in
//! speaker, typically because headphones were unplugged.

use std::sync::Arc;

use crate::error::Result;

pub trait BecomingNoisyListener: Send + Sync {
    fn on_becoming_noisy(&self);
}

#[async_trait::async_trait]
pub trait AudioRouteMonitor: Send + Sync {
    /// Replaces any previously registered listener.
    async fn register(&self, listener: Arc<dyn BecomingNoisyListener>) -> Result<()>;

    async fn unregister(&self) -> Result<()>;
}
