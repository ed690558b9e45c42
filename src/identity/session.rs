use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::tprintln;

use super::principal::Principal;
use super::storage::{MemoryTokenStorage, TokenStorage};

/// Bearer token with its validity window. Valid while `issued_at <= now < expires_at`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self { token: token.into(), issued_at, expires_at }
    }

    /// Derive the window from the token's `iat`/`exp` claims when it is a JWT,
    /// otherwise `now .. now + fallback_ttl`. `iat` is clamped to `now` to absorb clock skew.
    pub fn from_token(token: &str, fallback_ttl: Duration, now: DateTime<Utc>) -> Self {
        let claims = decode_claims(token);
        let issued_at = claims
            .iat
            .and_then(to_datetime)
            .map(|iat| iat.min(now))
            .unwrap_or(now);
        let expires_at = claims.exp.and_then(to_datetime).unwrap_or_else(|| {
            TimeDelta::from_std(fallback_ttl)
                .ok()
                .and_then(|d| now.checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });
        Self { token: token.to_string(), issued_at, expires_at }
    }

    pub fn token(&self) -> &str { &self.token }
    pub fn issued_at(&self) -> DateTime<Utc> { self.issued_at }
    pub fn expires_at(&self) -> DateTime<Utc> { self.expires_at }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.issued_at <= now && now < self.expires_at
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<f64>,
    #[serde(default)]
    iat: Option<f64>,
}

fn decode_claims(token: &str) -> Claims {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Claims::default();
    }
    let payload = parts[1].trim_end_matches('=');
    let Ok(bytes) = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(payload) else {
        return Claims::default();
    };
    serde_json::from_slice(&bytes).unwrap_or_default()
}

fn to_datetime(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp(secs.trunc() as i64, 0)
}

/// Principal and credential always travel together; there is no representation
/// in which one exists without the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub principal: Principal,
    pub credential: Credential,
    generation: u64,
}

impl Session {
    /// Store generation at which this session was committed.
    pub fn generation(&self) -> u64 { self.generation }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(Principal),
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    active: Option<Session>,
}

/// Sole writer of the principal and credential.
///
/// Every teardown advances the generation. Authentication attempts record the
/// generation they started from and may only commit if it is unchanged, so an
/// invalidation can never be undone by a slower login or restore.
#[derive(Clone)]
pub struct SessionStore {
    slot: Arc<RwLock<Slot>>,
    storage: Arc<dyn TokenStorage>,
    events: Arc<watch::Sender<AuthState>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        let (tx, _rx) = watch::channel(AuthState::Unauthenticated);
        Self { slot: Arc::new(RwLock::new(Slot::default())), storage, events: Arc::new(tx) }
    }

    pub fn in_memory() -> Self { Self::new(Arc::new(MemoryTokenStorage::new())) }

    /// Current session, if any and still valid. Never performs I/O; an expired
    /// credential is dropped from memory here and its persisted copy on the next restore.
    pub fn current(&self) -> Option<Session> {
        let now = Utc::now();
        {
            let slot = self.slot.read();
            match &slot.active {
                None => return None,
                Some(s) if s.credential.is_valid_at(now) => return Some(s.clone()),
                Some(_) => {}
            }
        }
        let mut slot = self.slot.write();
        let expired = slot.active.as_ref().is_some_and(|s| !s.credential.is_valid_at(now));
        if expired {
            slot.active = None;
            slot.generation += 1;
            info!(target: "helpdesk", "session expired; credential dropped");
            self.events.send_replace(AuthState::Unauthenticated);
            return None;
        }
        slot.active.clone()
    }

    pub fn principal(&self) -> Option<Principal> { self.current().map(|s| s.principal) }

    pub fn is_authenticated(&self) -> bool { self.current().is_some() }

    pub fn generation(&self) -> u64 { self.slot.read().generation }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> { self.events.subscribe() }

    /// Clear credential and principal. Re-entrant; returns whether a session was active.
    pub fn teardown(&self) -> bool {
        let mut slot = self.slot.write();
        self.clear_locked(&mut slot)
    }

    /// Teardown only if the session committed at `generation` is still the active one.
    /// Lets concurrent 401s for the same session collapse into a single teardown.
    pub fn teardown_generation(&self, generation: u64) -> bool {
        let mut slot = self.slot.write();
        if !slot.active.as_ref().is_some_and(|s| s.generation == generation) {
            return false;
        }
        self.clear_locked(&mut slot)
    }

    /// Teardown on behalf of an attempt that started at `observed`, but only if
    /// nothing has committed or torn down since. Returns whether it cleared.
    pub(crate) fn abandon(&self, observed: u64) -> bool {
        let mut slot = self.slot.write();
        if slot.generation != observed {
            return false;
        }
        self.clear_locked(&mut slot);
        true
    }

    fn clear_locked(&self, slot: &mut Slot) -> bool {
        slot.generation += 1;
        let was_active = slot.active.take().is_some();
        if let Err(e) = self.storage.clear() {
            warn!(target: "helpdesk", "failed to clear persisted token: {:#}", e);
        }
        if was_active {
            self.events.send_replace(AuthState::Unauthenticated);
        }
        tprintln!("session.teardown active={} generation={}", was_active, slot.generation);
        was_active
    }

    /// Install a session if no teardown or other commit happened since `observed`.
    pub(crate) fn commit(&self, observed: u64, principal: Principal, credential: Credential) -> Option<Session> {
        let mut slot = self.slot.write();
        if slot.generation != observed {
            tprintln!("session.commit rejected observed={} generation={}", observed, slot.generation);
            return None;
        }
        slot.generation += 1;
        let session = Session { principal, credential, generation: slot.generation };
        if let Err(e) = self.storage.save(session.credential.token()) {
            warn!(target: "helpdesk", "failed to persist token: {:#}", e);
        }
        slot.active = Some(session.clone());
        self.events.send_replace(AuthState::Authenticated(session.principal.clone()));
        tprintln!("session.commit user={} generation={}", session.principal.id, session.generation);
        Some(session)
    }

    pub(crate) fn persisted_token(&self) -> Option<String> {
        match self.storage.load() {
            Ok(t) => t,
            Err(e) => {
                warn!(target: "helpdesk", "failed to read persisted token: {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
