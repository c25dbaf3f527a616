use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::contacts::handlers::render_views;
use crate::contacts::models::ContactView;
use crate::contacts::queries::{active_contacts, due_contacts};
use crate::errors::AppError;
use crate::reminders::agenda::{project_agenda, AgendaDay};
use crate::reminders::calendar::{render_calendar, Horizon};
use crate::reminders::dates::parse_day;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AgendaQuery {
    /// First day of the window as `YYYY-MM-DD`; defaults to today.
    pub from: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub horizon: Option<String>,
}

/// GET /api/v1/contacts/due
pub async fn handle_due_contacts(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ContactView>>, AppError> {
    let rows = due_contacts(&state.db, auth.user_id, state.clock.today()).await?;
    Ok(Json(render_views(&state, auth.user_id, rows).await?))
}

/// GET /api/v1/agenda?from=YYYY-MM-DD
pub async fn handle_agenda(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<AgendaQuery>,
) -> Result<Json<Vec<AgendaDay>>, AppError> {
    let start = match params.from.as_deref() {
        Some(raw) => parse_day(raw)?,
        None => state.clock.today(),
    };
    let contacts = active_contacts(&state.db, auth.user_id).await?;
    Ok(Json(project_agenda(&contacts, start)))
}

/// GET /api/v1/calendar.ics?horizon=7|30|365|all (default 30)
pub async fn handle_calendar_export(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<CalendarQuery>,
) -> Result<impl IntoResponse, AppError> {
    let horizon: Horizon = params.horizon.as_deref().unwrap_or("30").parse()?;
    let contacts = active_contacts(&state.db, auth.user_id).await?;
    let body = render_calendar(&contacts, state.clock.now(), horizon);

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"checkins.ics\"",
            ),
        ],
        body,
    ))
}
