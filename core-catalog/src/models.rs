//! Catalog domain models
//!
//! Field names on the wire follow the catalog document (`URL`, `baseURL`);
//! missing fields fall back to the same defaults the document's producers
//! use: `-1` for ids and empty strings elsewhere.

use serde::{Deserialize, Serialize};

/// Id carried by tracks and playlists whose id was never assigned.
pub const UNSET_ID: i32 = -1;

fn unset_id() -> i32 {
    UNSET_ID
}

/// A playable item, unique by id within its playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default = "unset_id")]
    pub id: i32,
    #[serde(default)]
    pub name: String,
    /// Path relative to the owning playlist's base path.
    #[serde(rename = "URL", default)]
    pub path: String,
}

impl Track {
    pub fn new(id: i32, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            path: path.into(),
        }
    }
}

/// An ordered list of tracks sharing a base path. Track order defines skip
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayList {
    #[serde(default = "unset_id")]
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "baseURL", default)]
    pub base_path: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl PlayList {
    pub fn new(id: i32, name: impl Into<String>, base_path: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            id,
            name: name.into(),
            base_path: base_path.into(),
            tracks,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Position of the track with `track_id`.
    pub fn index_of(&self, track_id: i32) -> Option<usize> {
        self.tracks.iter().position(|track| track.id == track_id)
    }

    pub fn track_at(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Media URI of the track at `index`.
    pub fn track_uri(&self, index: usize) -> Option<String> {
        self.track_at(index)
            .map(|track| join_path(&self.base_path, &track.path))
    }

    /// Media URIs for every track, in list order. Paths are appended to the
    /// base as-is: they are expected to be encoded already.
    pub fn track_uris(&self) -> Vec<String> {
        self.tracks
            .iter()
            .map(|track| join_path(&self.base_path, &track.path))
            .collect()
    }
}

fn join_path(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if base.is_empty() {
        return path.to_string();
    }
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// Every playlist from one catalog fetch, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "playLists", default)]
    pub playlists: Vec<PlayList>,
}

impl Catalog {
    pub fn new(playlists: Vec<PlayList>) -> Self {
        Self { playlists }
    }

    pub fn playlist(&self, playlist_id: i32) -> Option<&PlayList> {
        self.playlists.iter().find(|playlist| playlist.id == playlist_id)
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }
}
