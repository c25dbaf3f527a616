use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::reminders::Clock;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Source of "now" for every due-date, snooze and agenda computation.
    pub clock: Arc<dyn Clock>,
}
