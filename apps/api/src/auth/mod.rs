// Email/password accounts with opaque bearer sessions.
// Every other API route takes an `AuthUser` and scopes its SQL by `user_id`.

pub mod handlers;
pub mod password;
pub mod session;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// The caller behind a valid `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let token = session::parse_bearer(header).ok_or(AppError::Unauthorized)?;

        let user_id = session::lookup_session(&state.db, token, state.clock.now())
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser {
            user_id,
            token: token.to_string(),
        })
    }
}
