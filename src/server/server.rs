use anyhow::{bail, Context, Result};
use std::future::Future;
use std::time::Duration;

use tracing::info;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, DefaultBodyLimit, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpListener;

use super::metrics::metrics_handler;
use super::state::{GuardedSyncStore, ServerState};
use super::{cors, log_requests, ServerConfig};
use crate::sync::{
    OkResponse, PullQuery, PullResponse, PushRequest, SyncError, SyncService, UserSyncRequest,
};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: &'static str,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

/// Bodies are decoded whatever their content type, clients are not
/// required to send `application/json`.
fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, SyncError> {
    Ok(serde_json::from_slice(body)?)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION"),
    };
    Json(stats)
}

async fn user_sync(
    State(sync_service): State<SyncService>,
    body: Bytes,
) -> Result<Json<OkResponse>, SyncError> {
    let request: UserSyncRequest = decode_body(&body)?;
    sync_service.touch_user(request).await?;
    Ok(Json(OkResponse::ok()))
}

async fn sync_pull(
    State(sync_service): State<SyncService>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<PullResponse>, SyncError> {
    let Query(pairs) = query?;
    Ok(Json(sync_service.pull(PullQuery::from_pairs(pairs)).await?))
}

async fn sync_push(
    State(sync_service): State<SyncService>,
    body: Bytes,
) -> Result<Json<OkResponse>, SyncError> {
    let request: PushRequest = decode_body(&body)?;
    sync_service.push(request).await?;
    Ok(Json(OkResponse::ok()))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found")
}

/// Builds the application router: the status endpoint at the root plus one
/// copy of the sync routes per configured mount prefix.
pub fn make_app(config: ServerConfig, store: GuardedSyncStore) -> Result<Router> {
    if config.mount_prefixes.is_empty() {
        bail!("At least one mount prefix must be configured");
    }

    let state = ServerState::new(config.clone(), store);

    let sync_routes: Router = Router::new()
        .route("/user/sync", post(user_sync))
        .route("/sync/pull", get(sync_pull))
        .route("/sync/push", post(sync_push))
        .with_state(state.clone());

    let mut app: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let mut mounted: Vec<&str> = Vec::with_capacity(config.mount_prefixes.len());
    for prefix in &config.mount_prefixes {
        if mounted.contains(&prefix.as_str()) {
            bail!("Mount prefix {:?} configured twice", prefix);
        }
        // nest() refuses the root, so the root copy is merged in instead.
        if prefix.is_empty() {
            app = app.merge(sync_routes.clone());
        } else if prefix.starts_with('/') && !prefix.ends_with('/') {
            app = app.nest(prefix, sync_routes.clone());
        } else {
            bail!("Invalid mount prefix {:?}", prefix);
        }
        mounted.push(prefix);
    }

    app = app
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(middleware::from_fn(cors))
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Serves the sync API and the metrics endpoint until `shutdown` resolves.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn run_server<F>(config: ServerConfig, store: GuardedSyncStore, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = make_app(config.clone(), store)?;

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    let metrics_listener = TcpListener::bind(("0.0.0.0", config.metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", config.metrics_port))?;

    info!(
        "Sync routes mounted under {:?}",
        config
            .mount_prefixes
            .iter()
            .map(|p| if p.is_empty() { "/" } else { p.as_str() })
            .collect::<Vec<_>>()
    );

    let metrics_server = tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
            tracing::error!("Metrics server failed: {}", err);
        }
    });

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed");

    metrics_server.abort();
    info!("HTTP server stopped");
    result
}
