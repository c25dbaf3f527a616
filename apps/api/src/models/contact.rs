use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::reminders::ReminderState;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactRow {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
    pub checkin_frequency_days: i32,
    pub last_checkin: Option<DateTime<Utc>>,
    pub snooze_until: Option<DateTime<Utc>>,
    pub is_archived: bool,
    pub is_pinned: bool,
    pub birthday: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub how_we_met: Option<String>,
    pub interests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContactRow {
    pub fn reminder_state(&self) -> ReminderState {
        ReminderState {
            last_checkin: self.last_checkin,
            frequency_days: self.checkin_frequency_days,
            snooze_until: self.snooze_until,
        }
    }
}

/// In-memory contact for date-math tests.
#[cfg(test)]
pub fn contact_fixture(name: &str, last_checkin: Option<DateTime<Utc>>, frequency_days: i32) -> ContactRow {
    let created = last_checkin.unwrap_or_else(Utc::now);
    ContactRow {
        id: Uuid::new_v4(),
        user_id: Uuid::nil(),
        name: name.to_string(),
        checkin_frequency_days: frequency_days,
        last_checkin,
        snooze_until: None,
        is_archived: false,
        is_pinned: false,
        birthday: None,
        email: None,
        phone: None,
        how_we_met: None,
        interests: None,
        created_at: created,
        updated_at: created,
    }
}
