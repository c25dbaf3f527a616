use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TagRow {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A tag together with how many of the user's contacts carry it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TagUsageRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub contact_count: i64,
}

/// One (contact, tag) pair, used to attach tags to a page of contacts in one query.
#[derive(Debug, Clone, FromRow)]
pub struct ContactTagRow {
    pub contact_id: Uuid,
    pub id: Uuid,
    pub name: String,
}
