use super::models::{SyncRecord, UserRecord};
use anyhow::Result;

pub trait SyncStore: Send + Sync {
    /// Inserts the user, or updates username and last_seen_at if the uid
    /// already exists.
    fn upsert_user(&self, uid: &str, username: &str, last_seen_at: i64) -> Result<()>;

    /// Returns Ok(None) if the user never logged in.
    fn get_user(&self, uid: &str) -> Result<Option<UserRecord>>;

    /// Inserts the record, or replaces all of its columns if the uid already
    /// has one. Single statement: either everything is written or nothing.
    fn upsert_sync_record(&self, uid: &str, record: &SyncRecord) -> Result<()>;

    /// Returns Ok(None) if the uid never pushed.
    fn get_sync_record(&self, uid: &str) -> Result<Option<SyncRecord>>;

    /// Checks that a connection can be acquired and used.
    fn ping(&self) -> Result<()>;
}
