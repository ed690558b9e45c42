use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult, MessageKind};
use crate::gateway::{ApiGateway, ApiRequest};
use crate::identity::Profile;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ResetPassword<'a> {
    token: &'a str,
    new_password: &'a str,
}

/// `/auth/*` endpoints. None of these carry the session credential.
#[derive(Clone)]
pub struct AuthApi {
    gateway: Arc<ApiGateway>,
}

impl AuthApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self { Self { gateway } }

    /// Form-encoded credential exchange. Rejections come back as `AuthFailure`.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let req = ApiRequest::post("/auth/login").anonymous().form(vec![
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ]);
        let resp: LoginResponse = self.gateway.send_json(req).await.map_err(|e| match e.kind() {
            MessageKind::NetworkUnreachable | MessageKind::ServerError | MessageKind::AuthFailure => e,
            _ => AppError::auth_failure(e.code_str().to_string(), e.message().to_string()),
        })?;
        if resp.access_token.trim().is_empty() {
            return Err(AppError::auth_failure("empty_token", "login response carried no access token"));
        }
        Ok(resp)
    }

    /// Profile of the holder of `token`, before that token is committed as a session.
    pub async fn me(&self, token: &str) -> AppResult<Profile> {
        self.gateway.send_json(ApiRequest::get("/auth/me").bearer(token)).await
    }

    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let req = ApiRequest::post("/auth/forgot-password").anonymous().json(&json!({ "email": email }))?;
        self.gateway.send(req).await.map(|_| ())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let req = ApiRequest::post("/auth/reset-password")
            .anonymous()
            .json(&ResetPassword { token, new_password })?;
        self.gateway.send(req).await.map(|_| ())
    }
}
