use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::tag::{TagRow, TagUsageRow};
use crate::state::AppState;

pub const MAX_TAG_LEN: usize = 64;

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub name: String,
}

fn normalize_tag_name(name: &str) -> Result<String, AppError> {
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return Err(AppError::Validation("Tag name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_TAG_LEN {
        return Err(AppError::Validation(format!(
            "Tag name must be at most {MAX_TAG_LEN} characters"
        )));
    }
    Ok(name)
}

fn map_duplicate(e: sqlx::Error, name: &str) -> AppError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("Tag '{name}' already exists"))
        }
        other => AppError::Database(other),
    }
}

/// GET /api/v1/tags
pub async fn handle_list_tags(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<TagUsageRow>>, AppError> {
    let tags = sqlx::query_as::<_, TagUsageRow>(
        r#"
        SELECT t.id, t.name, t.created_at, COUNT(ct.contact_id) AS contact_count
        FROM tags t
        LEFT JOIN contact_tags ct ON ct.tag_id = t.id
        WHERE t.user_id = $1
        GROUP BY t.id
        ORDER BY lower(t.name)
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(tags))
}

/// POST /api/v1/tags
pub async fn handle_create_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<TagRequest>,
) -> Result<(StatusCode, Json<TagRow>), AppError> {
    let name = normalize_tag_name(&req.name)?;
    let tag = sqlx::query_as::<_, TagRow>(
        r#"
        INSERT INTO tags (id, user_id, name, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth.user_id)
    .bind(&name)
    .bind(state.clock.now())
    .fetch_one(&state.db)
    .await
    .map_err(|e| map_duplicate(e, &name))?;

    info!("Created tag {} for user {}", tag.id, auth.user_id);
    Ok((StatusCode::CREATED, Json(tag)))
}

/// PATCH /api/v1/tags/:id
pub async fn handle_rename_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<TagRequest>,
) -> Result<Json<TagRow>, AppError> {
    let name = normalize_tag_name(&req.name)?;
    let tag: Option<TagRow> =
        sqlx::query_as("UPDATE tags SET name = $3 WHERE id = $1 AND user_id = $2 RETURNING *")
            .bind(id)
            .bind(auth.user_id)
            .bind(&name)
            .fetch_optional(&state.db)
            .await
            .map_err(|e| map_duplicate(e, &name))?;

    tag.map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Tag {id} not found")))
}

/// DELETE /api/v1/tags/:id
pub async fn handle_delete_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Tag {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_owned(state: &AppState, user_id: Uuid, contact_id: Uuid, tag_id: Uuid) -> Result<(), AppError> {
    let owned: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (SELECT 1 FROM contacts WHERE id = $1 AND user_id = $3)
           AND EXISTS (SELECT 1 FROM tags WHERE id = $2 AND user_id = $3)
        "#,
    )
    .bind(contact_id)
    .bind(tag_id)
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;
    if !owned {
        return Err(AppError::NotFound("Contact or tag not found".to_string()));
    }
    Ok(())
}

/// PUT /api/v1/contacts/:id/tags/:tag_id
pub async fn handle_attach_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((contact_id, tag_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    ensure_owned(&state, auth.user_id, contact_id, tag_id).await?;
    sqlx::query(
        "INSERT INTO contact_tags (contact_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(contact_id)
    .bind(tag_id)
    .execute(&state.db)
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/contacts/:id/tags/:tag_id
pub async fn handle_detach_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((contact_id, tag_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    ensure_owned(&state, auth.user_id, contact_id, tag_id).await?;
    sqlx::query("DELETE FROM contact_tags WHERE contact_id = $1 AND tag_id = $2")
        .bind(contact_id)
        .bind(tag_id)
        .execute(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
