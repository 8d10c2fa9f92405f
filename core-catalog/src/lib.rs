//! # Catalog Module
//!
//! The playlist catalog the player works from.
//!
//! ## Overview
//!
//! - [`models`]: immutable `Track` / `PlayList` / `Catalog` values and the
//!   URI resolution used to build transports
//! - [`service`]: single-shot fetch of the catalog document from a
//!   [`RemoteStore`](bridge_traits::RemoteStore), reported on the event bus
//!
//! Playlists are handed to the playback coordinator as `Arc<PlayList>` and
//! never mutated afterwards.

pub mod error;
pub mod models;
pub mod service;

pub use error::{FetchError, Result};
pub use models::{Catalog, PlayList, Track, UNSET_ID};
pub use service::CatalogService;
