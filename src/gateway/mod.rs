//! HTTP gateway to the backend API.
//!
//! Every outbound call goes through `ApiGateway::execute`, which attaches the
//! credential, applies the configured timeout and classifies the outcome. A 401
//! on a session-mode request is the only path allowed to mutate session state: it
//! tears the session down once and redirects to login once per lost session.

mod classify;
mod request;

use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{AppError, AppResult};
use crate::identity::SessionStore;

pub use classify::{classify_status, classify_transport, error_detail};
pub use request::{segment, ApiRequest, AuthMode, Body};

/// Receives the forced redirect to the login entry point.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self, route: &str);
}

/// Default navigator for headless use: records the redirect in the log.
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect_to_login(&self, route: &str) {
        info!(target: "helpdesk", "redirect to {}", route);
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

pub struct ApiGateway {
    base: String,
    client: reqwest::Client,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
    login_route: String,
    /// Store generation up to which the login redirect has already been issued.
    redirected_through: Mutex<Option<u64>>,
}

impl ApiGateway {
    pub fn new(cfg: &ClientConfig, session: SessionStore, navigator: Arc<dyn Navigator>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base: cfg.api_url.trim_end_matches('/').to_string(),
            client,
            session,
            navigator,
            login_route: cfg.login_route.clone(),
            redirected_through: Mutex::new(None),
        })
    }

    pub fn session(&self) -> &SessionStore { &self.session }

    pub fn url(&self, path: &str) -> String { format!("{}{}", self.base, path) }

    pub async fn execute(&self, req: &mut ApiRequest) -> AppResult<RawResponse> {
        let request_id = Uuid::new_v4().to_string();
        // `generation` is set for session-mode requests: the committed session's
        // generation, or the store generation when no session was attached.
        let (token, generation) = match req.auth() {
            AuthMode::Session => match self.session.current() {
                Some(s) => (Some(s.credential.token().to_string()), Some(s.generation())),
                None => (None, Some(self.session.generation())),
            },
            AuthMode::Bearer(t) => (Some(t.clone()), None),
            AuthMode::Anonymous => (None, None),
        };

        let mut rb = self
            .client
            .request(req.method().clone(), self.url(req.path()))
            .header("x-request-id", request_id.as_str());
        if !req.query_pairs().is_empty() {
            rb = rb.query(req.query_pairs());
        }
        if let Some(t) = &token {
            rb = rb.bearer_auth(t);
        }
        rb = match req.body() {
            Body::Empty => rb,
            Body::Json(v) => rb.json(v),
            Body::Form(pairs) => rb.form(pairs),
        };

        debug!(target: "helpdesk", method = %req.method(), path = req.path(), request_id = %request_id, "request");
        let resp = match rb.send().await {
            Ok(r) => r,
            Err(e) => {
                let err = classify_transport(&e);
                warn!(target: "helpdesk", method = %req.method(), path = req.path(), request_id = %request_id, "request failed: {}", err);
                return Err(err);
            }
        };
        let status = resp.status().as_u16();
        let body = match resp.bytes().await {
            Ok(b) => b.to_vec(),
            Err(e) => return Err(classify_transport(&e)),
        };

        if status == 401 {
            if let Some(generation) = generation {
                return Err(self.session_rejected(req, generation));
            }
        }
        if let Some(err) = classify_status(status, &body) {
            warn!(target: "helpdesk", method = %req.method(), path = req.path(), request_id = %request_id, status, "request rejected: {}", err);
            return Err(err);
        }
        Ok(RawResponse { status, body })
    }

    fn session_rejected(&self, req: &mut ApiRequest, generation: u64) -> AppError {
        req.suppress_retry();
        if self.session.teardown_generation(generation) {
            warn!(target: "helpdesk", path = req.path(), "session rejected by server; signing out");
        }
        let mut through = self.redirected_through.lock();
        if !through.is_some_and(|g| g >= generation) {
            // Covers the teardown just performed, so later unauthenticated calls stay quiet.
            *through = Some(self.session.generation());
            drop(through);
            self.navigator.redirect_to_login(&self.login_route);
        }
        AppError::session_expired("session_expired", "your session has expired; please sign in again")
    }

    pub async fn send(&self, mut req: ApiRequest) -> AppResult<RawResponse> {
        self.execute(&mut req).await
    }

    pub async fn send_json<T: DeserializeOwned>(&self, mut req: ApiRequest) -> AppResult<T> {
        let raw = self.execute(&mut req).await?;
        decode(&raw.body)
    }
}

/// Decode a success body. An empty body decodes as JSON `null`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    let body: &[u8] = if body.iter().all(|b| b.is_ascii_whitespace()) { b"null" } else { body };
    serde_json::from_slice(body)
        .map_err(|e| AppError::server("malformed_response".to_string(), format!("unexpected response body: {}", e)))
}
