//! Unified client error model and the structured outcome handed to presentation code.
//! Every failure the core can report maps onto one `AppError` kind; callers never
//! need to inspect transport errors directly.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Discriminant of an `AppError`, surfaced to the UI as `messageKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    AuthFailure,
    SessionExpired,
    Forbidden,
    NotFound,
    ValidationFailed,
    ServerError,
    NetworkUnreachable,
    Unauthorized,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::AuthFailure => "authFailure",
            MessageKind::SessionExpired => "sessionExpired",
            MessageKind::Forbidden => "forbidden",
            MessageKind::NotFound => "notFound",
            MessageKind::ValidationFailed => "validationFailed",
            MessageKind::ServerError => "serverError",
            MessageKind::NetworkUnreachable => "networkUnreachable",
            MessageKind::Unauthorized => "unauthorized",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Bad credentials at login, or a principal fetch that failed while establishing a session.
    AuthFailure { code: String, message: String },
    /// 401 on a call that carried the session credential.
    SessionExpired { code: String, message: String },
    Forbidden { code: String, message: String },
    NotFound { code: String, message: String },
    ValidationFailed { code: String, message: String },
    ServerError { code: String, message: String },
    /// No response at all: connect failure, timeout, truncated body.
    NetworkUnreachable { code: String, message: String },
    /// Local authorization denial. Never reaches the network.
    Unauthorized { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::AuthFailure { code, .. }
            | AppError::SessionExpired { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::ValidationFailed { code, .. }
            | AppError::ServerError { code, .. }
            | AppError::NetworkUnreachable { code, .. }
            | AppError::Unauthorized { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::AuthFailure { message, .. }
            | AppError::SessionExpired { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::ValidationFailed { message, .. }
            | AppError::ServerError { message, .. }
            | AppError::NetworkUnreachable { message, .. }
            | AppError::Unauthorized { message, .. } => message.as_str(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            AppError::AuthFailure { .. } => MessageKind::AuthFailure,
            AppError::SessionExpired { .. } => MessageKind::SessionExpired,
            AppError::Forbidden { .. } => MessageKind::Forbidden,
            AppError::NotFound { .. } => MessageKind::NotFound,
            AppError::ValidationFailed { .. } => MessageKind::ValidationFailed,
            AppError::ServerError { .. } => MessageKind::ServerError,
            AppError::NetworkUnreachable { .. } => MessageKind::NetworkUnreachable,
            AppError::Unauthorized { .. } => MessageKind::Unauthorized,
        }
    }

    pub fn auth_failure<S: Into<String>>(code: S, msg: S) -> Self { AppError::AuthFailure { code: code.into(), message: msg.into() } }
    pub fn session_expired<S: Into<String>>(code: S, msg: S) -> Self { AppError::SessionExpired { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn validation<S: Into<String>>(code: S, msg: S) -> Self { AppError::ValidationFailed { code: code.into(), message: msg.into() } }
    pub fn server<S: Into<String>>(code: S, msg: S) -> Self { AppError::ServerError { code: code.into(), message: msg.into() } }
    pub fn network<S: Into<String>>(code: S, msg: S) -> Self { AppError::NetworkUnreachable { code: code.into(), message: msg.into() } }
    pub fn unauthorized<S: Into<String>>(code: S, msg: S) -> Self { AppError::Unauthorized { code: code.into(), message: msg.into() } }

    /// Canonical HTTP status of this kind, not the status seen on the wire
    /// (that one is kept in `code` as `http_<status>`). Local-only kinds have none.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AppError::AuthFailure { .. } => Some(401),
            AppError::SessionExpired { .. } => Some(401),
            AppError::Forbidden { .. } => Some(403),
            AppError::NotFound { .. } => Some(404),
            AppError::ValidationFailed { .. } => Some(422),
            AppError::ServerError { .. } => Some(500),
            AppError::NetworkUnreachable { .. } => None,
            AppError::Unauthorized { .. } => None,
        }
    }

    /// True when the failure was decided locally and no request was sent.
    pub fn is_local(&self) -> bool {
        matches!(self, AppError::Unauthorized { .. })
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

/// Result shape consumed by presentation code:
/// `{success: true, data}` or `{success: false, messageKind, message}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_kind: Option<MessageKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), message_kind: None, message: None }
    }

    pub fn failed(err: &AppError) -> Self {
        Self {
            success: false,
            data: None,
            message_kind: Some(err.kind()),
            message: Some(err.message().to_string()),
        }
    }
}

impl<T> From<AppResult<T>> for Outcome<T> {
    fn from(res: AppResult<T>) -> Self {
        match res {
            Ok(v) => Outcome::ok(v),
            Err(e) => Outcome::failed(&e),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
