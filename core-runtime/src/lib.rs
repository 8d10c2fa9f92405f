//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the playback core crates:
//! - Logging and tracing initialisation with host log forwarding
//! - Bridge configuration with fail-fast capability checks
//! - The event bus every state change is broadcast on
//!
//! ## Overview
//!
//! Nothing here knows about playlists or transports. Higher crates publish
//! their events through [`events::EventBus`] and receive their bridges from
//! [`config::CoreConfig`].

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
