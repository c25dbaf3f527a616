use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::contacts::models::{build_views, ContactPatch, ContactView, NewContactRequest};
use crate::contacts::queries::{
    checkin_contacts, delete_contacts, get_contact, insert_contact, list_contacts, save_contact,
    set_flag, set_snooze, snooze_contacts, tags_for_contacts, ContactFilter, ContactFlag,
};
use crate::errors::AppError;
use crate::models::contact::ContactRow;
use crate::reminders::{resolve_snooze, SnoozeTarget};
use crate::state::AppState;

/// Upper bound on ids in one batch request.
pub const MAX_BATCH: usize = 500;

#[derive(Debug, Default, Deserialize)]
pub struct ListContactsQuery {
    #[serde(default)]
    pub archived: bool,
    pub tag: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PinToggle {
    pub is_pinned: bool,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveToggle {
    pub is_archived: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BatchAction {
    Checkin,
    Snooze { target: SnoozeTarget },
    Archive,
    Unarchive,
    Delete,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub ids: Vec<Uuid>,
    #[serde(flatten)]
    pub action: BatchAction,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub affected: u64,
    pub contacts: Vec<ContactView>,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Contact {id} not found"))
}

/// Attaches tags and computed reminder fields to rows.
pub async fn render_views(
    state: &AppState,
    user_id: Uuid,
    rows: Vec<ContactRow>,
) -> Result<Vec<ContactView>, AppError> {
    let ids: Vec<Uuid> = rows.iter().map(|c| c.id).collect();
    let tags = if ids.is_empty() {
        Vec::new()
    } else {
        tags_for_contacts(&state.db, user_id, &ids).await?
    };
    Ok(build_views(rows, tags, state.clock.today()))
}

async fn render_one(state: &AppState, user_id: Uuid, row: ContactRow) -> Result<ContactView, AppError> {
    let id = row.id;
    render_views(state, user_id, vec![row])
        .await?
        .pop()
        .ok_or_else(|| not_found(id))
}

async fn load_owned(state: &AppState, user_id: Uuid, id: Uuid) -> Result<ContactRow, AppError> {
    get_contact(&state.db, user_id, id)
        .await?
        .ok_or_else(|| not_found(id))
}

/// GET /api/v1/contacts
pub async fn handle_list_contacts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListContactsQuery>,
) -> Result<Json<Vec<ContactView>>, AppError> {
    let filter = ContactFilter {
        archived: params.archived,
        tag: params.tag,
        search: params.q,
    };
    let rows = list_contacts(&state.db, auth.user_id, &filter).await?;
    Ok(Json(render_views(&state, auth.user_id, rows).await?))
}

/// POST /api/v1/contacts
pub async fn handle_create_contact(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<NewContactRequest>,
) -> Result<(StatusCode, Json<ContactView>), AppError> {
    let row = req.into_row(auth.user_id, state.clock.now())?;
    let row = insert_contact(&state.db, &row).await?;
    info!("Created contact {} for user {}", row.id, auth.user_id);
    Ok((StatusCode::CREATED, Json(render_one(&state, auth.user_id, row).await?)))
}

/// GET /api/v1/contacts/:id
pub async fn handle_get_contact(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactView>, AppError> {
    let row = load_owned(&state, auth.user_id, id).await?;
    Ok(Json(render_one(&state, auth.user_id, row).await?))
}

/// PATCH /api/v1/contacts/:id
pub async fn handle_update_contact(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<ContactPatch>,
) -> Result<Json<ContactView>, AppError> {
    let mut row = load_owned(&state, auth.user_id, id).await?;
    patch.apply(&mut row, state.clock.now())?;
    let row = save_contact(&state.db, &row)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(render_one(&state, auth.user_id, row).await?))
}

/// DELETE /api/v1/contacts/:id
pub async fn handle_delete_contact(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    match delete_contacts(&state.db, auth.user_id, &[id]).await? {
        0 => Err(not_found(id)),
        _ => {
            info!("Deleted contact {id} for user {}", auth.user_id);
            Ok(StatusCode::NO_CONTENT)
        }
    }
}

/// POST /api/v1/contacts/:id/checkin
pub async fn handle_checkin(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactView>, AppError> {
    let row = checkin_contacts(&state.db, auth.user_id, &[id], state.clock.now())
        .await?
        .pop()
        .ok_or_else(|| not_found(id))?;
    Ok(Json(render_one(&state, auth.user_id, row).await?))
}

/// POST /api/v1/contacts/:id/snooze
pub async fn handle_snooze(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(target): Json<SnoozeTarget>,
) -> Result<Json<ContactView>, AppError> {
    let target = target.validate()?;
    let now = state.clock.now();
    let row = load_owned(&state, auth.user_id, id).await?;
    let until = resolve_snooze(target, &row.reminder_state(), now)?;

    let row = set_snooze(&state.db, auth.user_id, id, until, now)
        .await?
        .ok_or_else(|| not_found(id))?;
    info!("Snoozed contact {id} until {until}");
    Ok(Json(render_one(&state, auth.user_id, row).await?))
}

/// PATCH /api/v1/contacts/:id/pin
pub async fn handle_toggle_pin(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PinToggle>,
) -> Result<Json<ContactView>, AppError> {
    let row = set_flag(&state.db, auth.user_id, &[id], ContactFlag::Pinned, req.is_pinned, state.clock.now())
        .await?
        .pop()
        .ok_or_else(|| not_found(id))?;
    Ok(Json(render_one(&state, auth.user_id, row).await?))
}

/// PATCH /api/v1/contacts/:id/archive
pub async fn handle_toggle_archive(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ArchiveToggle>,
) -> Result<Json<ContactView>, AppError> {
    let row = set_flag(
        &state.db,
        auth.user_id,
        &[id],
        ContactFlag::Archived,
        req.is_archived,
        state.clock.now(),
    )
    .await?
    .pop()
    .ok_or_else(|| not_found(id))?;
    Ok(Json(render_one(&state, auth.user_id, row).await?))
}

fn validate_batch(req: &BatchRequest) -> Result<(), AppError> {
    if req.ids.is_empty() {
        return Err(AppError::Validation("ids must not be empty".to_string()));
    }
    if req.ids.len() > MAX_BATCH {
        return Err(AppError::Validation(format!(
            "At most {MAX_BATCH} contacts per batch"
        )));
    }
    if let BatchAction::Snooze { target } = req.action {
        target.validate()?;
    }
    Ok(())
}

/// POST /api/v1/contacts/batch
///
/// Ids that do not belong to the caller are ignored; `affected` reports how
/// many rows actually changed.
pub async fn handle_batch(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    validate_batch(&req)?;
    let now = state.clock.now();
    let (db, user_id, ids) = (&state.db, auth.user_id, req.ids.as_slice());

    let rows = match req.action {
        BatchAction::Checkin => checkin_contacts(db, user_id, ids, now).await?,
        BatchAction::Snooze { target } => snooze_contacts(db, user_id, ids, target, now).await?,
        BatchAction::Archive => set_flag(db, user_id, ids, ContactFlag::Archived, true, now).await?,
        BatchAction::Unarchive => set_flag(db, user_id, ids, ContactFlag::Archived, false, now).await?,
        BatchAction::Delete => {
            let affected = delete_contacts(db, user_id, ids).await?;
            info!("Batch deleted {affected} contacts for user {user_id}");
            return Ok(Json(BatchResponse {
                affected,
                contacts: Vec::new(),
            }));
        }
    };

    info!("Batch {:?} touched {} contacts for user {user_id}", req.action, rows.len());
    Ok(Json(BatchResponse {
        affected: rows.len() as u64,
        contacts: render_views(&state, user_id, rows).await?,
    }))
}
