use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::auth::session::{create_session, revoke_session};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::{PublicUser, User};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: PublicUser,
}

fn validate_registration(req: &RegisterRequest) -> Result<String, AppError> {
    let email = req.email.trim().to_lowercase();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(AppError::Validation("A valid email address is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(email)
}

async fn issue_session(state: &AppState, user: User) -> Result<SessionResponse, AppError> {
    let session = create_session(
        &state.db,
        user.id,
        state.clock.now(),
        state.config.session_ttl_days,
    )
    .await?;
    Ok(SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: user.into(),
    })
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let email = validate_registration(&req)?;
    let password = req.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    let display_name = req
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, display_name, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(&password_hash)
    .bind(display_name)
    .bind(state.clock.now())
    .fetch_one(&state.db)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Email is already registered".to_string())
        }
        other => AppError::Database(other),
    })?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(issue_session(&state, user).await?)))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE lower(email) = lower($1)")
        .bind(req.email.trim())
        .fetch_optional(&state.db)
        .await?;
    let user = user.ok_or(AppError::Unauthorized)?;

    let password = req.password;
    let stored = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    if !verified {
        return Err(AppError::Unauthorized);
    }

    info!("User {} logged in", user.id);
    Ok(Json(issue_session(&state, user).await?))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<StatusCode, AppError> {
    revoke_session(&state.db, &auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_one(&state.db)
        .await?;
    Ok(Json(user.into()))
}
