use super::blob::SyncBlob;
use crate::sync_store::SyncRecord;
use serde::{Deserialize, Serialize};

/// Body of `POST /user/sync`.
#[derive(Debug, Deserialize)]
pub struct UserSyncRequest {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Query of `GET /sync/pull`.
#[derive(Debug)]
pub struct PullQuery {
    pub uid: Option<String>,
}

impl PullQuery {
    /// Builds the query from decoded pairs. A repeated `uid` keeps its first
    /// value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        PullQuery {
            uid: pairs
                .into_iter()
                .find(|(key, _)| key == "uid")
                .map(|(_, value)| value),
        }
    }
}

/// Body of `POST /sync/push`. Every field is optional on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub favorites: Option<SyncBlob>,
    #[serde(default)]
    pub fm_favorites: Option<SyncBlob>,
    #[serde(default)]
    pub playlists: Option<SyncBlob>,
    #[serde(default)]
    pub favorites_updated_at: Option<i64>,
    #[serde(default)]
    pub fm_favorites_updated_at: Option<i64>,
    #[serde(default)]
    pub playlists_updated_at: Option<i64>,
}

impl PushRequest {
    /// The row this push replaces the stored one with.
    pub fn to_record(&self) -> SyncRecord {
        SyncRecord {
            favorites: Some(SyncBlob::to_stored(self.favorites.as_ref())),
            fm_favorites: Some(SyncBlob::to_stored(self.fm_favorites.as_ref())),
            playlists: Some(SyncBlob::to_stored(self.playlists.as_ref())),
            favorites_updated_at: self.favorites_updated_at.unwrap_or(0),
            fm_favorites_updated_at: self.fm_favorites_updated_at.unwrap_or(0),
            playlists_updated_at: self.playlists_updated_at.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    pub favorites: SyncBlob,
    pub fm_favorites: SyncBlob,
    pub playlists: SyncBlob,
    pub favorites_updated_at: i64,
    pub fm_favorites_updated_at: i64,
    pub playlists_updated_at: i64,
}

impl PullResponse {
    /// Returned for a uid that never pushed.
    pub fn empty() -> Self {
        PullResponse {
            favorites: SyncBlob::empty_array(),
            fm_favorites: SyncBlob::empty_array(),
            playlists: SyncBlob::empty_array(),
            favorites_updated_at: 0,
            fm_favorites_updated_at: 0,
            playlists_updated_at: 0,
        }
    }

    pub fn from_record(record: &SyncRecord) -> Self {
        PullResponse {
            favorites: SyncBlob::from_stored(record.favorites.as_deref()),
            fm_favorites: SyncBlob::from_stored(record.fm_favorites.as_deref()),
            playlists: SyncBlob::from_stored(record.playlists.as_deref()),
            favorites_updated_at: record.favorites_updated_at,
            fm_favorites_updated_at: record.fm_favorites_updated_at,
            playlists_updated_at: record.playlists_updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        OkResponse { ok: true }
    }
}
