pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::auth::handlers as auth;
use crate::contacts::handlers as contacts;
use crate::notes::handlers as notes;
use crate::reminders::handlers as reminders;
use crate::state::AppState;
use crate::tags::handlers as tags;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/register", post(auth::handle_register))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/auth/me", get(auth::handle_me))
        // Contacts
        .route(
            "/api/v1/contacts",
            get(contacts::handle_list_contacts).post(contacts::handle_create_contact),
        )
        .route("/api/v1/contacts/due", get(reminders::handle_due_contacts))
        .route("/api/v1/contacts/batch", post(contacts::handle_batch))
        .route(
            "/api/v1/contacts/:id",
            get(contacts::handle_get_contact)
                .patch(contacts::handle_update_contact)
                .delete(contacts::handle_delete_contact),
        )
        .route("/api/v1/contacts/:id/checkin", post(contacts::handle_checkin))
        .route("/api/v1/contacts/:id/snooze", post(contacts::handle_snooze))
        .route("/api/v1/contacts/:id/pin", patch(contacts::handle_toggle_pin))
        .route(
            "/api/v1/contacts/:id/archive",
            patch(contacts::handle_toggle_archive),
        )
        // Notes
        .route(
            "/api/v1/contacts/:id/notes",
            get(notes::handle_list_notes).post(notes::handle_create_note),
        )
        .route(
            "/api/v1/notes/:id",
            patch(notes::handle_update_note).delete(notes::handle_delete_note),
        )
        // Tags
        .route(
            "/api/v1/tags",
            get(tags::handle_list_tags).post(tags::handle_create_tag),
        )
        .route(
            "/api/v1/tags/:id",
            patch(tags::handle_rename_tag).delete(tags::handle_delete_tag),
        )
        .route(
            "/api/v1/contacts/:id/tags/:tag_id",
            put(tags::handle_attach_tag).delete(tags::handle_detach_tag),
        )
        // Reminders
        .route("/api/v1/agenda", get(reminders::handle_agenda))
        .route("/api/v1/calendar.ics", get(reminders::handle_calendar_export))
        .with_state(state)
}
