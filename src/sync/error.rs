use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum SyncError {
    /// No uid, an empty one, or a request that could not be decoded at all.
    #[error("uid_required")]
    UidRequired,
    #[error("{operation} failed: {cause:#}")]
    Store {
        operation: &'static str,
        cause: anyhow::Error,
    },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl SyncError {
    /// The machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UidRequired => "uid_required",
            Self::Store { .. } => "db_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::UidRequired => StatusCode::BAD_REQUEST,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        debug!("Undecodable sync body: {}", err);
        Self::UidRequired
    }
}

impl From<QueryRejection> for SyncError {
    fn from(rejection: QueryRejection) -> Self {
        debug!("Undecodable sync query: {}", rejection.body_text());
        Self::UidRequired
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        match &self {
            Self::UidRequired => debug!("Rejecting sync request without uid"),
            Self::Store { .. } => error!("Sync store error: {}", self),
        }
        let body = ErrorBody { error: self.code() };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uid_required_is_a_bad_request() {
        let response = SyncError::UidRequired.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"error":"uid_required"}"#);
    }

    #[tokio::test]
    async fn store_error_hides_the_cause() {
        let err = SyncError::Store {
            operation: "get_sync_record",
            cause: anyhow::anyhow!("disk I/O error at /secret/path"),
        };
        assert!(err.to_string().contains("disk I/O error"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"error":"db_error"}"#);
    }
}
