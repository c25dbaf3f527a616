use anyhow::Result;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::user::SessionRow;

/// Generate a 32-byte random token encoded as base64url (no padding).
/// Produces a 43-character string.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Extracts the token from an `Authorization` header value of the form `Bearer <token>`.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn create_session(
    pool: &PgPool,
    user_id: Uuid,
    now: DateTime<Utc>,
    ttl_days: i64,
) -> Result<SessionRow> {
    let session = sqlx::query_as::<_, SessionRow>(
        r#"
        INSERT INTO sessions (token, user_id, created_at, expires_at)
        VALUES ($1, $2, $3, $4)
        RETURNING token, expires_at
        "#,
    )
    .bind(generate_token())
    .bind(user_id)
    .bind(now)
    .bind(now + Duration::days(ttl_days))
    .fetch_one(pool)
    .await?;

    debug!("Session created for user {user_id}");
    Ok(session)
}

/// Resolves a token to its user, ignoring expired sessions.
pub async fn lookup_session(
    pool: &PgPool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_id FROM sessions WHERE token = $1 AND expires_at > $2")
        .bind(token)
        .bind(now)
        .fetch_optional(pool)
        .await
}

pub async fn revoke_session(pool: &PgPool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Drops every expired session; run once at startup.
pub async fn purge_expired(pool: &PgPool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
