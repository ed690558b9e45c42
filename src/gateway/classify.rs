//! Maps HTTP outcomes onto the error taxonomy. Side-effect free; the 401 teardown
//! lives in the gateway itself.

use serde_json::Value;

use crate::error::AppError;

const FALLBACK_AUTH: &str = "authentication failed";
const FALLBACK_FORBIDDEN: &str = "you do not have permission to perform this action";
const FALLBACK_NOT_FOUND: &str = "the requested resource was not found";
const FALLBACK_INVALID: &str = "the request was rejected as invalid";
const FALLBACK_SERVER: &str = "the server encountered an error";

/// Human-readable message from an error body's `detail` field.
/// Handles both a plain string and a list of `{msg}` objects.
pub fn error_detail(body: &[u8]) -> Option<String> {
    let v: Value = serde_json::from_slice(body).ok()?;
    match v.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|it| match it {
                    Value::String(s) => Some(s.clone()),
                    other => other.get("msg").and_then(|m| m.as_str()).map(|s| s.to_string()),
                })
                .collect();
            if msgs.is_empty() { None } else { Some(msgs.join("; ")) }
        }
        _ => None,
    }
}

/// `None` for success statuses, otherwise the classified error.
pub fn classify_status(status: u16, body: &[u8]) -> Option<AppError> {
    if (200..300).contains(&status) {
        return None;
    }
    let detail = error_detail(body);
    let msg = |fallback: &str| detail.clone().unwrap_or_else(|| fallback.to_string());
    let code = format!("http_{}", status);
    let err = match status {
        401 => AppError::auth_failure(code, msg(FALLBACK_AUTH)),
        403 => AppError::forbidden(code, msg(FALLBACK_FORBIDDEN)),
        404 => AppError::not_found(code, msg(FALLBACK_NOT_FOUND)),
        400..=499 => AppError::validation(code, msg(FALLBACK_INVALID)),
        500..=599 => AppError::server(code, msg(FALLBACK_SERVER)),
        _ => AppError::server(code, format!("unexpected response status {}", status)),
    };
    Some(err)
}

/// Failures with no HTTP response at all.
pub fn classify_transport(err: &reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::network("timeout".to_string(), "the request timed out".to_string())
    } else {
        AppError::network("unreachable".to_string(), format!("the server could not be reached: {}", err))
    }
}
