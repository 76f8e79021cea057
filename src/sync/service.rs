use super::error::SyncError;
use super::models::{PullQuery, PullResponse, PushRequest, UserSyncRequest};
use crate::server::metrics::{record_db_error, record_db_query, record_sync_operation};
use crate::sync_store::SyncStore;
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Validates sync requests and turns them into store calls.
///
/// Holds no state of its own besides the store handle, so it is cheap to
/// clone into every request.
#[derive(Clone)]
pub struct SyncService {
    store: Arc<dyn SyncStore>,
}

fn require_uid(uid: Option<String>) -> Result<String, SyncError> {
    uid.filter(|uid| !uid.is_empty())
        .ok_or(SyncError::UidRequired)
}

fn record_outcome<T>(operation: &str, result: &Result<T, SyncError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(err) => err.code(),
    };
    record_sync_operation(operation, outcome);
}

impl SyncService {
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        SyncService { store }
    }

    /// Runs a store call on the blocking pool, timing it and mapping its
    /// failure to `SyncError::Store`.
    async fn run_store<T, F>(&self, operation: &'static str, call: F) -> Result<T, SyncError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn SyncStore) -> anyhow::Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        let start = Instant::now();
        let result = tokio::task::spawn_blocking(move || call(&*store))
            .await
            .context("Store task did not complete")
            .and_then(|result| result);
        record_db_query(operation, start.elapsed());

        result.map_err(|cause| {
            record_db_error(operation);
            SyncError::Store { operation, cause }
        })
    }

    /// Registers the user or refreshes its username and last-seen time.
    pub async fn touch_user(&self, request: UserSyncRequest) -> Result<(), SyncError> {
        let result = self.touch_user_inner(request).await;
        record_outcome("login", &result);
        result
    }

    async fn touch_user_inner(&self, request: UserSyncRequest) -> Result<(), SyncError> {
        let uid = require_uid(request.uid)?;
        let username = request.username.unwrap_or_default();
        let last_seen_at = chrono::Utc::now().timestamp_millis();
        debug!("Login from {} ({:?})", uid, username);

        self.run_store("upsert_user", move |store| {
            store.upsert_user(&uid, &username, last_seen_at)
        })
        .await
    }

    /// Latest snapshot for the uid, or the empty one if it never pushed.
    pub async fn pull(&self, query: PullQuery) -> Result<PullResponse, SyncError> {
        let result = self.pull_inner(query).await;
        record_outcome("pull", &result);
        result
    }

    async fn pull_inner(&self, query: PullQuery) -> Result<PullResponse, SyncError> {
        let uid = require_uid(query.uid)?;

        let record = self
            .run_store("get_sync_record", move |store| store.get_sync_record(&uid))
            .await?;

        Ok(match record {
            Some(record) => PullResponse::from_record(&record),
            None => PullResponse::empty(),
        })
    }

    /// Replaces the stored snapshot with the pushed one, all six fields at
    /// once. Timestamps are not compared.
    pub async fn push(&self, request: PushRequest) -> Result<(), SyncError> {
        let result = self.push_inner(request).await;
        record_outcome("push", &result);
        result
    }

    async fn push_inner(&self, request: PushRequest) -> Result<(), SyncError> {
        let record = request.to_record();
        let uid = require_uid(request.uid)?;
        debug!("Push from {}", uid);

        self.run_store("upsert_sync_record", move |store| {
            store.upsert_sync_record(&uid, &record)
        })
        .await
    }
}
