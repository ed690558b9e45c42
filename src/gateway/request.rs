use std::fmt;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Which credential, if any, a request carries.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Attach the session credential when one is present.
    Session,
    /// Attach this token; the session store is not consulted.
    Bearer(String),
    Anonymous,
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Session => f.write_str("Session"),
            AuthMode::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            AuthMode::Anonymous => f.write_str("Anonymous"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Body,
    auth: AuthMode,
    retry_suppressed: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: Body::Empty, auth: AuthMode::Session, retry_suppressed: false }
    }

    pub fn get(path: impl Into<String>) -> Self { Self::new(Method::GET, path) }
    pub fn post(path: impl Into<String>) -> Self { Self::new(Method::POST, path) }
    pub fn put(path: impl Into<String>) -> Self { Self::new(Method::PUT, path) }
    pub fn delete(path: impl Into<String>) -> Self { Self::new(Method::DELETE, path) }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> AppResult<Self> {
        let v = serde_json::to_value(body)
            .map_err(|e| AppError::validation("unserializable_body".to_string(), format!("request body could not be encoded: {}", e)))?;
        self.body = Body::Json(v);
        Ok(self)
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = Body::Form(pairs);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.auth = AuthMode::Anonymous;
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMode::Bearer(token.into());
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query_pairs(&self) -> &[(String, String)] { &self.query }
    pub fn body(&self) -> &Body { &self.body }
    pub fn auth(&self) -> &AuthMode { &self.auth }

    /// Set once the request has been rejected with 401; it must not be replayed.
    pub fn retry_suppressed(&self) -> bool { self.retry_suppressed }

    /// Mark the request as not retryable. Returns false if it already was.
    pub(crate) fn suppress_retry(&mut self) -> bool {
        !std::mem::replace(&mut self.retry_suppressed, true)
    }
}

/// Percent-encode a single path segment (ids, usernames).
pub fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}
