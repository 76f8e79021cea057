//! Request contracts and handling for login, pull and push.

mod blob;
mod error;
mod models;
mod service;

pub use blob::SyncBlob;
pub use error::SyncError;
pub use models::{OkResponse, PullQuery, PullResponse, PushRequest, UserSyncRequest};
pub use service::SyncService;
