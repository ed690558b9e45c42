//! Client configuration, read from `HELPDESK_*` environment variables with defaults.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(8 * 60 * 60);
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API base URL, without trailing slash.
    pub api_url: String,
    pub timeout: Duration,
    pub token_file: PathBuf,
    /// Lifetime assumed for tokens that carry no `exp` claim.
    pub session_ttl: Duration,
    pub login_route: String,
    pub strict_transitions: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            token_file: default_token_file(),
            session_ttl: DEFAULT_SESSION_TTL,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            strict_transitions: false,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = ClientConfig::default();
        if let Some(url) = get("HELPDESK_API_URL") {
            cfg.api_url = url;
        }
        let url = cfg.api_url.clone();
        cfg = cfg.with_api_url(url)?;
        if let Some(ms) = get("HELPDESK_TIMEOUT_MS") {
            let ms = parse_u64("HELPDESK_TIMEOUT_MS", &ms)?;
            if ms == 0 {
                return Err(ConfigError::Invalid { var: "HELPDESK_TIMEOUT_MS", reason: "must be greater than zero".into() });
            }
            cfg.timeout = Duration::from_millis(ms);
        }
        if let Some(p) = get("HELPDESK_TOKEN_FILE") {
            cfg.token_file = PathBuf::from(p);
        }
        if let Some(s) = get("HELPDESK_SESSION_TTL_SECS") {
            cfg.session_ttl = Duration::from_secs(parse_u64("HELPDESK_SESSION_TTL_SECS", &s)?);
        }
        if let Some(r) = get("HELPDESK_LOGIN_ROUTE") {
            if !r.starts_with('/') {
                return Err(ConfigError::Invalid { var: "HELPDESK_LOGIN_ROUTE", reason: format!("'{}' is not an absolute route", r) });
            }
            cfg.login_route = r;
        }
        if let Some(b) = get("HELPDESK_STRICT_TRANSITIONS") {
            cfg.strict_transitions = parse_bool("HELPDESK_STRICT_TRANSITIONS", &b)?;
        }
        Ok(cfg)
    }

    /// Validates and normalizes the base URL (scheme must be http or https).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = url.into();
        let parsed = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid { var: "HELPDESK_API_URL", reason: e.to_string() })?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::Invalid { var: "HELPDESK_API_URL", reason: format!("unsupported scheme '{}'", other) }),
        }
        self.api_url = raw.trim().trim_end_matches('/').to_string();
        Ok(self)
    }
}

fn default_token_file() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".helpdesk")
        .join("token")
}

fn parse_u64(var: &'static str, v: &str) -> Result<u64, ConfigError> {
    v.trim().parse::<u64>().map_err(|e| ConfigError::Invalid { var, reason: e.to_string() })
}

fn parse_bool(var: &'static str, v: &str) -> Result<bool, ConfigError> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::Invalid { var, reason: format!("'{}' is not a boolean", other) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| m.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert_eq!(cfg.login_route, "/login");
        assert!(!cfg.strict_transitions);
    }

    #[test]
    fn reads_overrides_and_trims_trailing_slash() {
        let cfg = ClientConfig::from_lookup(lookup(&[
            ("HELPDESK_API_URL", "https://desk.example.com/api/"),
            ("HELPDESK_TIMEOUT_MS", "2500"),
            ("HELPDESK_TOKEN_FILE", "/tmp/tok"),
            ("HELPDESK_SESSION_TTL_SECS", "60"),
            ("HELPDESK_STRICT_TRANSITIONS", "yes"),
        ]))
        .unwrap();
        assert_eq!(cfg.api_url, "https://desk.example.com/api");
        assert_eq!(cfg.timeout, Duration::from_millis(2500));
        assert_eq!(cfg.token_file, PathBuf::from("/tmp/tok"));
        assert_eq!(cfg.session_ttl, Duration::from_secs(60));
        assert!(cfg.strict_transitions);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ClientConfig::from_lookup(lookup(&[("HELPDESK_API_URL", "ftp://x")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("HELPDESK_TIMEOUT_MS", "0")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("HELPDESK_TIMEOUT_MS", "soon")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("HELPDESK_LOGIN_ROUTE", "login")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("HELPDESK_STRICT_TRANSITIONS", "maybe")])).is_err());
    }
}
