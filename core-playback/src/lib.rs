//! # Playback Coordination Module
//!
//! Owns the single active playback session and keeps the platform surfaces
//! consistent with it.
//!
//! ## Overview
//!
//! This module handles:
//! - Serialized command processing through the [`PlaybackCoordinator`] actor
//! - Audio focus arbitration (duck, transient pause, permanent loss)
//! - Transport lifecycle tracking and derived playback state
//! - Repeat and shuffle modes, including the shuffle permutation
//! - Elapsed-time ticks while audibly playing
//! - Media session, notification and foreground reconciliation
//!
//! ## Usage
//!
//! ```ignore
//! let coordinator = PlaybackCoordinator::spawn(
//!     PlaybackBridges::from_config(&config),
//!     event_bus.clone(),
//!     PlaybackConfig::default(),
//! )?;
//!
//! coordinator.play_pause(playlist, track_id).await?;
//! let snapshot = coordinator.snapshot().await?;
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod focus;
pub mod intent;
pub mod shuffle;
pub mod ticker;
pub mod transport;
pub mod types;

pub use config::PlaybackConfig;
pub use coordinator::{PlaybackBridges, PlaybackCoordinator};
pub use error::{PlaybackError, Result};
pub use focus::{AudioFocusArbiter, FocusHold, FocusIntent};
pub use intent::{resolve_play_pause, PlayPauseAction};
pub use shuffle::ShuffleOrder;
pub use transport::{TransportSignal, TransportState};
pub use types::{Command, SessionSnapshot};
