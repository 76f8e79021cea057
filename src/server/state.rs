use axum::extract::FromRef;

use crate::sync::SyncService;
use crate::sync_store::SyncStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedSyncStore = Arc<dyn SyncStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub sync_service: SyncService,
}

impl ServerState {
    pub fn new(config: ServerConfig, store: GuardedSyncStore) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            sync_service: SyncService::new(store),
        }
    }
}

impl FromRef<ServerState> for SyncService {
    fn from_ref(input: &ServerState) -> Self {
        input.sync_service.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
