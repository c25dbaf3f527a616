use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::contact::ContactRow;
use crate::models::tag::ContactTagRow;
use crate::reminders::dates::MAX_FREQUENCY_DAYS;
use crate::reminders::{days_since, is_overdue, next_due_date, reminder_status, ReminderStatus};

/// Distinguishes "field absent" (`None`) from "field set to null" (`Some(None)`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct NewContactRequest {
    pub name: String,
    pub checkin_frequency_days: i32,
    /// Defaults to now: a new contact starts a fresh cycle.
    pub last_checkin: Option<DateTime<Utc>>,
    pub birthday: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub how_we_met: Option<String>,
    pub interests: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub checkin_frequency_days: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub last_checkin: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub birthday: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub how_we_met: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub interests: Option<Option<String>>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
}

pub fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Contact name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

pub fn validate_frequency(days: i32) -> Result<i32, AppError> {
    if !(1..=MAX_FREQUENCY_DAYS).contains(&days) {
        return Err(AppError::Validation(format!(
            "checkin_frequency_days must be between 1 and {MAX_FREQUENCY_DAYS}"
        )));
    }
    Ok(days)
}

/// Keeps check-ins to four-digit years so due dates and snoozes stay representable.
pub fn validate_checkin(at: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
    if !(1..=9999).contains(&at.year()) {
        return Err(AppError::Validation(
            "last_checkin must fall between years 1 and 9999".to_string(),
        ));
    }
    Ok(at)
}

/// Trims free text; blank becomes NULL.
fn clean_text(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl NewContactRequest {
    pub fn into_row(self, user_id: Uuid, now: DateTime<Utc>) -> Result<ContactRow, AppError> {
        Ok(ContactRow {
            id: Uuid::new_v4(),
            user_id,
            name: validate_name(&self.name)?,
            checkin_frequency_days: validate_frequency(self.checkin_frequency_days)?,
            last_checkin: Some(validate_checkin(self.last_checkin.unwrap_or(now))?),
            snooze_until: None,
            is_archived: false,
            is_pinned: self.is_pinned,
            birthday: self.birthday,
            email: clean_text(self.email),
            phone: clean_text(self.phone),
            how_we_met: clean_text(self.how_we_met),
            interests: clean_text(self.interests),
            created_at: now,
            updated_at: now,
        })
    }
}

impl ContactPatch {
    /// Applies the patch in place. Nothing is written if validation fails.
    pub fn apply(self, row: &mut ContactRow, now: DateTime<Utc>) -> Result<(), AppError> {
        let name = self.name.as_deref().map(validate_name).transpose()?;
        let frequency = self.checkin_frequency_days.map(validate_frequency).transpose()?;
        let last_checkin = self
            .last_checkin
            .map(|last| last.map(validate_checkin).transpose())
            .transpose()?;

        if let Some(name) = name {
            row.name = name;
        }
        if let Some(frequency) = frequency {
            row.checkin_frequency_days = frequency;
        }
        if let Some(last) = last_checkin {
            row.last_checkin = last;
        }
        if let Some(birthday) = self.birthday {
            row.birthday = birthday;
        }
        if let Some(email) = self.email {
            row.email = clean_text(email);
        }
        if let Some(phone) = self.phone {
            row.phone = clean_text(phone);
        }
        if let Some(how_we_met) = self.how_we_met {
            row.how_we_met = clean_text(how_we_met);
        }
        if let Some(interests) = self.interests {
            row.interests = clean_text(interests);
        }
        if let Some(pinned) = self.is_pinned {
            row.is_pinned = pinned;
        }
        if let Some(archived) = self.is_archived {
            row.is_archived = archived;
        }
        row.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TagRef {
    pub id: Uuid,
    pub name: String,
}

/// A contact as returned by the API: the row plus its tags and reminder fields
/// computed for today.
#[derive(Debug, Clone, Serialize)]
pub struct ContactView {
    #[serde(flatten)]
    pub contact: ContactRow,
    pub tags: Vec<TagRef>,
    pub next_due_date: Option<NaiveDate>,
    pub days_since_checkin: Option<i64>,
    pub is_overdue: bool,
    pub status: ReminderStatus,
}

impl ContactView {
    pub fn new(contact: ContactRow, tags: Vec<TagRef>, today: NaiveDate) -> Self {
        let state = contact.reminder_state();
        ContactView {
            next_due_date: next_due_date(state.last_checkin, state.frequency_days, today),
            days_since_checkin: state.last_checkin.map(|last| days_since(last, today)),
            is_overdue: is_overdue(&state, today),
            status: reminder_status(&state, today),
            tags,
            contact,
        }
    }
}

/// Pairs each contact with its tags from a flat (contact, tag) list.
pub fn build_views(contacts: Vec<ContactRow>, tags: Vec<ContactTagRow>, today: NaiveDate) -> Vec<ContactView> {
    let mut by_contact: HashMap<Uuid, Vec<TagRef>> = HashMap::new();
    for row in tags {
        by_contact.entry(row.contact_id).or_default().push(TagRef {
            id: row.id,
            name: row.name,
        });
    }
    contacts
        .into_iter()
        .map(|c| {
            let tags = by_contact.remove(&c.id).unwrap_or_default();
            ContactView::new(c, tags, today)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::contact::contact_fixture;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 20, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_new_contact_defaults_last_checkin_to_now() {
        let req: NewContactRequest = serde_json::from_str(
            r#"{"name":"  Priya ","checkin_frequency_days":14,"email":"  ","phone":"555"}"#,
        )
        .unwrap();
        let row = req.into_row(Uuid::nil(), now()).unwrap();
        assert_eq!(row.name, "Priya");
        assert_eq!(row.last_checkin, Some(now()));
        assert_eq!(row.email, None);
        assert_eq!(row.phone.as_deref(), Some("555"));
        assert!(!row.is_archived);
    }

    #[test]
    fn test_new_contact_rejects_out_of_range_frequency() {
        for freq in [0, -7, MAX_FREQUENCY_DAYS + 1, i32::MAX] {
            let req = NewContactRequest {
                name: "Lee".to_string(),
                checkin_frequency_days: freq,
                last_checkin: None,
                birthday: None,
                email: None,
                phone: None,
                how_we_met: None,
                interests: None,
                is_pinned: false,
            };
            assert!(matches!(req.into_row(Uuid::nil(), now()), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn test_frequency_upper_bound_inclusive() {
        assert_eq!(validate_frequency(1).unwrap(), 1);
        assert_eq!(validate_frequency(MAX_FREQUENCY_DAYS).unwrap(), MAX_FREQUENCY_DAYS);
        assert!(validate_frequency(MAX_FREQUENCY_DAYS + 1).is_err());
    }

    #[test]
    fn test_far_future_checkin_rejected() {
        let far = Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap();
        assert!(validate_checkin(far).is_err());
        assert!(validate_checkin(now()).is_ok());

        let mut row = contact_fixture("Lee", Some(now()), 7);
        let patch = ContactPatch {
            last_checkin: Some(Some(DateTime::<Utc>::MAX_UTC)),
            ..Default::default()
        };
        assert!(patch.apply(&mut row, now()).is_err());
        assert_eq!(row.last_checkin, Some(now()));
    }

    #[test]
    fn test_patch_distinguishes_absent_from_null() {
        let mut row = contact_fixture("Lee", Some(now()), 7);
        row.email = Some("lee@example.com".to_string());
        row.phone = Some("555".to_string());

        let patch: ContactPatch =
            serde_json::from_str(r#"{"email":null,"last_checkin":null,"checkin_frequency_days":30}"#).unwrap();
        patch.apply(&mut row, now()).unwrap();

        assert_eq!(row.email, None);
        assert_eq!(row.phone.as_deref(), Some("555"));
        assert_eq!(row.last_checkin, None);
        assert_eq!(row.checkin_frequency_days, 30);
    }

    #[test]
    fn test_invalid_patch_leaves_row_untouched() {
        let mut row = contact_fixture("Lee", Some(now()), 7);
        let patch: ContactPatch =
            serde_json::from_str(r#"{"name":"Lena","checkin_frequency_days":0}"#).unwrap();
        assert!(patch.apply(&mut row, now()).is_err());
        assert_eq!(row.name, "Lee");
        assert_eq!(row.checkin_frequency_days, 7);
    }

    #[test]
    fn test_view_computes_reminder_fields() {
        let last = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let view = ContactView::new(contact_fixture("Lee", Some(last), 7), vec![], now().date_naive());
        assert_eq!(view.next_due_date, NaiveDate::from_ymd_opt(2024, 1, 22));
        assert_eq!(view.days_since_checkin, Some(19));
        assert!(view.is_overdue);
        assert_eq!(view.status, ReminderStatus::Overdue);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["name"], "Lee");
        assert_eq!(json["status"], "overdue");
        assert_eq!(json["next_due_date"], "2024-01-22");
    }

    #[test]
    fn test_view_survives_rows_outside_validated_range() {
        let today = now().date_naive();
        let view = ContactView::new(contact_fixture("Lee", Some(now()), i32::MAX), vec![], today);
        assert_eq!(view.next_due_date, None);
        assert!(!view.is_overdue);
        assert_eq!(view.status, ReminderStatus::Active);

        let end = DateTime::<Utc>::MAX_UTC;
        let view = ContactView::new(contact_fixture("Lee", Some(end), MAX_FREQUENCY_DAYS), vec![], today);
        assert_eq!(view.next_due_date, None);
        assert!(!view.is_overdue);
    }

    #[test]
    fn test_build_views_groups_tags() {
        let a = contact_fixture("A", Some(now()), 7);
        let b = contact_fixture("B", Some(now()), 7);
        let tag_id = Uuid::new_v4();
        let tags = vec![ContactTagRow {
            contact_id: b.id,
            id: tag_id,
            name: "family".to_string(),
        }];
        let views = build_views(vec![a, b], tags, now().date_naive());
        assert!(views[0].tags.is_empty());
        assert_eq!(
            views[1].tags,
            vec![TagRef {
                id: tag_id,
                name: "family".to_string()
            }]
        );
    }
}
