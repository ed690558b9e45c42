use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::api::AuthApi;
use crate::error::{AppError, AppResult};
use crate::tprintln;

use super::session::{AuthState, Credential, Session, SessionStore};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Session lifecycle: restore at startup, establish from a token, login, teardown.
///
/// The store is only written through `SessionStore::commit`, after the principal
/// has been fetched, so a token is never visible without its principal.
#[derive(Clone)]
pub struct SessionManager {
    store: SessionStore,
    auth: AuthApi,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(store: SessionStore, auth: AuthApi, ttl: Duration) -> Self { Self { store, auth, ttl } }

    pub fn store(&self) -> &SessionStore { &self.store }

    pub fn current(&self) -> Option<Session> { self.store.current() }

    pub fn teardown(&self) -> bool { self.store.teardown() }

    /// Load the persisted token and rebuild the session from it. Any failure
    /// leaves the store empty. Calling it again with a live session is a no-op.
    pub async fn restore(&self) -> AuthState {
        if let Some(s) = self.store.current() {
            return AuthState::Authenticated(s.principal);
        }
        let observed = self.store.generation();
        let Some(token) = self.store.persisted_token() else {
            debug!(target: "helpdesk", "restore: no persisted token");
            return AuthState::Unauthenticated;
        };
        let credential = Credential::from_token(&token, self.ttl, Utc::now());
        if !credential.is_valid_at(Utc::now()) {
            info!(target: "helpdesk", "restore: persisted token expired");
            self.store.abandon(observed);
            return AuthState::Unauthenticated;
        }
        match self.fetch_and_commit(observed, credential).await {
            Ok(session) => {
                info!(target: "helpdesk", user = %session.principal.id, role = session.principal.role.as_str(), "session restored");
                AuthState::Authenticated(session.principal)
            }
            Err(e) => {
                // Another restore, establish or teardown got there first; report its result.
                if !self.store.abandon(observed) {
                    debug!(target: "helpdesk", "restore superseded: {}", e);
                    return self.auth_state();
                }
                warn!(target: "helpdesk", "restore failed: {}", e);
                AuthState::Unauthenticated
            }
        }
    }

    fn auth_state(&self) -> AuthState {
        match self.store.current() {
            Some(s) => AuthState::Authenticated(s.principal),
            None => AuthState::Unauthenticated,
        }
    }

    /// Replace any current session with one built from `token`.
    pub async fn establish(&self, token: &str) -> AppResult<Session> {
        self.store.teardown();
        let observed = self.store.generation();
        let credential = Credential::from_token(token, self.ttl, Utc::now());
        if !credential.is_valid_at(Utc::now()) {
            return Err(AppError::auth_failure("token_expired", "the issued token is not currently valid"));
        }
        let session = self.fetch_and_commit(observed, credential).await?;
        info!(target: "helpdesk", user = %session.principal.id, role = session.principal.role.as_str(), "session established");
        Ok(session)
    }

    pub async fn login(&self, req: &LoginRequest) -> AppResult<Session> {
        let resp = self.auth.login(&req.username, &req.password).await?;
        tprintln!("auth.login user={} token_type={:?}", req.username, resp.token_type);
        self.establish(&resp.access_token).await
    }

    pub fn logout(&self) {
        if self.store.teardown() {
            info!(target: "helpdesk", "signed out");
        }
    }

    pub async fn forgot_password(&self, email: &str) -> AppResult<()> { self.auth.forgot_password(email).await }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        self.auth.reset_password(token, new_password).await
    }

    async fn fetch_and_commit(&self, observed: u64, credential: Credential) -> AppResult<Session> {
        let profile = self.auth.me(credential.token()).await.map_err(|e| {
            AppError::auth_failure("profile_unavailable".to_string(), format!("could not load the signed-in profile: {}", e.message()))
        })?;
        let principal = profile
            .into_principal()
            .ok_or_else(|| AppError::auth_failure("malformed_profile", "the profile response carried no user id"))?;
        self.store
            .commit(observed, principal, credential)
            .ok_or_else(|| AppError::auth_failure("superseded", "the session was signed out while signing in"))
    }
}
