//! Workspace facade crate.
//!
//! Exposes the feature flags that map onto the individual workspace crates
//! (`core-service`, `core-playback`, `core-catalog`). Host applications can
//! depend on `cadence-workspace` and enable `desktop-shims` to get a fully
//! wired playback core without naming each crate.

#[cfg(feature = "desktop-shims")]
pub use core_catalog as catalog;
#[cfg(feature = "desktop-shims")]
pub use core_playback as playback;
#[cfg(feature = "desktop-shims")]
pub use core_service as service;
