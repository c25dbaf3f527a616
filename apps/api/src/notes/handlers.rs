use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::note::NoteRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub content: String,
}

fn validate_content(content: &str) -> Result<&str, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Note content must not be empty".to_string()));
    }
    Ok(content)
}

/// GET /api/v1/contacts/:id/notes
pub async fn handle_list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(contact_id): Path<Uuid>,
) -> Result<Json<Vec<NoteRow>>, AppError> {
    let notes = sqlx::query_as::<_, NoteRow>(
        r#"
        SELECT * FROM notes
        WHERE contact_id = $1 AND user_id = $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(contact_id)
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(notes))
}

/// POST /api/v1/contacts/:id/notes
pub async fn handle_create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(contact_id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<(StatusCode, Json<NoteRow>), AppError> {
    let content = validate_content(&req.content)?;

    // Only attach to a contact the caller owns.
    let note: Option<NoteRow> = sqlx::query_as(
        r#"
        INSERT INTO notes (id, contact_id, user_id, content, created_at)
        SELECT $1, c.id, c.user_id, $4, $5
        FROM contacts c
        WHERE c.id = $2 AND c.user_id = $3
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(contact_id)
    .bind(auth.user_id)
    .bind(content)
    .bind(state.clock.now())
    .fetch_optional(&state.db)
    .await?;

    let note = note.ok_or_else(|| AppError::NotFound(format!("Contact {contact_id} not found")))?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// PATCH /api/v1/notes/:id
pub async fn handle_update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<NoteRow>, AppError> {
    let content = validate_content(&req.content)?;
    let note: Option<NoteRow> = sqlx::query_as(
        r#"
        UPDATE notes SET content = $3, modified_at = $4
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(auth.user_id)
    .bind(content)
    .bind(state.clock.now())
    .fetch_optional(&state.db)
    .await?;

    note.map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Note {id} not found")))
}

/// DELETE /api/v1/notes/:id
pub async fn handle_delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Note {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
