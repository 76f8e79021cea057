//! Multi-device sync backend: clients log in with a self-chosen uid and push
//! or pull three JSON collections, last write wins.

pub mod config;
pub mod server;
pub mod sqlite_persistence;
pub mod sync;
pub mod sync_store;
