//! Durable per-user storage for the sync service.

mod models;
mod pool;
mod schema;
mod store;
mod trait_def;

pub use models::{SyncRecord, UserRecord};
pub use schema::SYNC_VERSIONED_SCHEMAS;
pub use store::SqliteSyncStore;
pub use trait_def::SyncStore;
