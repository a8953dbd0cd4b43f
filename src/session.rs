// Session store and auth extractor - resolves a request to a user identity
// Opaque bearer tokens over an in-memory map; no hashing or CSRF hardening

use std::collections::HashMap;

use axum::{extract::FromRequestParts, http::request::Parts};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::models::{EntityId, User};

/// Maps opaque session tokens to user IDs. Sessions live exactly as long as
/// the process, like everything else in the store.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, EntityId>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session for the user and hand back its token.
    pub async fn open(&self, user_id: EntityId) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone(), user_id);
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<EntityId> {
        self.sessions.read().await.get(token).copied()
    }

    pub async fn revoke(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }
}

/// The authenticated caller, extracted from the `Authorization: Bearer`
/// header or the `session` cookie.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

fn cookie_token(parts: &Parts) -> Option<String> {
    let cookies = parts.headers.get("cookie")?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "session").then(|| value.to_string())
    })
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

        let user_id = state
            .sessions
            .resolve(&token)
            .await
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

        let user = state
            .repository
            .get_user(user_id)
            .await
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        Ok(AuthSession { user, token })
    }
}
