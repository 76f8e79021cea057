/// A registered client, keyed by its self-chosen uid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub uid: String,
    pub username: String,
    /// Server time of the last login call, epoch millis.
    pub last_seen_at: i64,
}

/// The latest pushed snapshot for one uid.
///
/// Blobs are opaque serialized JSON; `None` only shows up for rows whose
/// column was never written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncRecord {
    pub favorites: Option<Vec<u8>>,
    pub fm_favorites: Option<Vec<u8>>,
    pub playlists: Option<Vec<u8>>,
    pub favorites_updated_at: i64,
    pub fm_favorites_updated_at: i64,
    pub playlists_updated_at: i64,
}
