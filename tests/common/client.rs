//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per sync endpoint. When routes or request
//! formats change, update only this file.

use super::constants::*;
use reqwest::{Method, Response};
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// Mount prefix prepended to every sync route ("" for the root)
    pub prefix: String,
}

impl TestClient {
    /// Creates a client talking to the routes mounted at the root
    pub fn new(base_url: String) -> Self {
        Self::with_prefix(base_url, "")
    }

    /// Creates a client talking to the routes mounted under `prefix`
    pub fn with_prefix(base_url: String, prefix: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            prefix: prefix.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.prefix, path)
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// GET /
    #[allow(dead_code)]
    pub async fn get_status(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Status request failed")
    }

    // ========================================================================
    // Sync Endpoints
    // ========================================================================

    /// POST /user/sync
    #[allow(dead_code)]
    pub async fn login(&self, uid: &str, username: &str) -> Response {
        self.login_raw(&json!({ "uid": uid, "username": username }))
            .await
    }

    /// POST /user/sync with an arbitrary JSON body
    #[allow(dead_code)]
    pub async fn login_raw(&self, body: &Value) -> Response {
        self.client
            .post(self.url("/user/sync"))
            .json(body)
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET /sync/pull?uid={uid}
    #[allow(dead_code)]
    pub async fn pull(&self, uid: &str) -> Response {
        self.client
            .get(self.url("/sync/pull"))
            .query(&[("uid", uid)])
            .send()
            .await
            .expect("Pull request failed")
    }

    /// GET /sync/pull without a uid
    #[allow(dead_code)]
    pub async fn pull_without_uid(&self) -> Response {
        self.client
            .get(self.url("/sync/pull"))
            .send()
            .await
            .expect("Pull request failed")
    }

    /// POST /sync/push
    #[allow(dead_code)]
    pub async fn push(&self, body: &Value) -> Response {
        self.client
            .post(self.url("/sync/push"))
            .json(body)
            .send()
            .await
            .expect("Push request failed")
    }

    /// POST with a raw, possibly malformed body
    #[allow(dead_code)]
    pub async fn post_raw(&self, path: &str, body: &str) -> Response {
        self.client
            .post(self.url(path))
            .body(body.to_string())
            .send()
            .await
            .expect("Raw POST request failed")
    }

    /// OPTIONS {path}, without any preflight headers
    #[allow(dead_code)]
    pub async fn options(&self, path: &str) -> Response {
        self.client
            .request(Method::OPTIONS, self.url(path))
            .send()
            .await
            .expect("OPTIONS request failed")
    }
}
