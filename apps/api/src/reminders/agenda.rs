use chrono::{Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use super::dates::{effective_date, reminder_status, ReminderStatus};
use crate::models::contact::ContactRow;

/// Days covered by the agenda, today included.
pub const AGENDA_DAYS: i64 = 8;

#[derive(Debug, Clone, Serialize)]
pub struct AgendaEntry {
    pub contact_id: Uuid,
    pub name: String,
    pub effective_date: NaiveDate,
    pub status: ReminderStatus,
    pub is_pinned: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgendaDay {
    pub date: NaiveDate,
    pub offset: i64,
    pub label: String,
    pub entries: Vec<AgendaEntry>,
}

/// "Today", "Tomorrow", then e.g. "Monday, Jun 17".
pub fn day_label(offset: i64, date: NaiveDate) -> String {
    match offset {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%A, %b %-d").to_string(),
    }
}

/// Buckets contacts into the 8-day window starting at `today`.
///
/// Archived contacts and contacts without an effective date inside
/// `[today, today + 7]` are left out. Every day is present even when empty;
/// the window is cut short only at the end of the calendar.
pub fn project_agenda(contacts: &[ContactRow], today: NaiveDate) -> Vec<AgendaDay> {
    let mut days: Vec<AgendaDay> = (0..AGENDA_DAYS)
        .map_while(|offset| {
            let date = today.checked_add_signed(Duration::days(offset))?;
            Some(AgendaDay {
                date,
                offset,
                label: day_label(offset, date),
                entries: Vec::new(),
            })
        })
        .collect();

    for contact in contacts.iter().filter(|c| !c.is_archived) {
        let state = contact.reminder_state();
        let Some(date) = effective_date(&state, today) else {
            continue;
        };
        let offset = (date - today).num_days();
        if !(0..AGENDA_DAYS).contains(&offset) {
            continue;
        }
        let Some(bucket) = days.get_mut(offset as usize) else {
            continue;
        };
        bucket.entries.push(AgendaEntry {
            contact_id: contact.id,
            name: contact.name.clone(),
            effective_date: date,
            status: reminder_status(&state, today),
            is_pinned: contact.is_pinned,
        });
    }

    for day in &mut days {
        day.entries.sort_by_cached_key(|e| e.name.to_lowercase());
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::contact::contact_fixture;
    use chrono::{TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn names(day: &AgendaDay) -> Vec<&str> {
        day.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_window_has_eight_labelled_days() {
        let agenda = project_agenda(&[], day(2024, 6, 10));
        assert_eq!(agenda.len(), 8);
        assert_eq!(agenda[0].label, "Today");
        assert_eq!(agenda[1].label, "Tomorrow");
        assert_eq!(agenda[2].label, "Wednesday, Jun 12");
        assert_eq!(agenda[7].date, day(2024, 6, 17));
    }

    #[test]
    fn test_window_truncated_at_end_of_calendar() {
        let agenda = project_agenda(&[], NaiveDate::MAX - Duration::days(2));
        assert_eq!(agenda.len(), 3);
        assert_eq!(agenda[2].date, NaiveDate::MAX);
    }

    #[test]
    fn test_window_edge_is_inclusive_of_day_seven() {
        let today = day(2024, 6, 10);
        // due 17 Jun (today + 7) and 18 Jun (today + 8)
        let inside = contact_fixture("Inside", Some(Utc.with_ymd_and_hms(2024, 6, 3, 18, 0, 0).unwrap()), 14);
        let outside = contact_fixture("Outside", Some(Utc.with_ymd_and_hms(2024, 6, 4, 1, 0, 0).unwrap()), 14);
        let agenda = project_agenda(&[inside, outside], today);
        assert_eq!(names(&agenda[7]), vec!["Inside"]);
        let total: usize = agenda.iter().map(|d| d.entries.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_buckets_sorted_case_insensitively() {
        let today = day(2024, 6, 10);
        let last = Some(Utc.with_ymd_and_hms(2024, 6, 9, 12, 0, 0).unwrap());
        let contacts = vec![
            contact_fixture("bob", last, 3),
            contact_fixture("Alice", last, 3),
            contact_fixture("carol", last, 3),
            contact_fixture("Zed", last, 1),
        ];
        let agenda = project_agenda(&contacts, today);
        assert_eq!(names(&agenda[0]), vec!["Zed"]);
        assert_eq!(names(&agenda[2]), vec!["Alice", "bob", "carol"]);
    }

    #[test]
    fn test_active_snooze_moves_contact() {
        let today = day(2024, 6, 10);
        let mut c = contact_fixture("Dana", Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()), 7);
        c.snooze_until = Some(Utc.with_ymd_and_hms(2024, 6, 13, 9, 0, 0).unwrap());
        let agenda = project_agenda(&[c], today);
        assert_eq!(names(&agenda[3]), vec!["Dana"]);
        assert_eq!(agenda[3].entries[0].status, ReminderStatus::Snoozed);
    }

    #[test]
    fn test_archived_and_unscheduled_omitted() {
        let today = day(2024, 6, 10);
        let last = Some(Utc.with_ymd_and_hms(2024, 6, 9, 12, 0, 0).unwrap());
        let mut archived = contact_fixture("Archived", last, 1);
        archived.is_archived = true;
        let never = contact_fixture("Never", None, 7);
        let agenda = project_agenda(&[archived, never], today);
        assert!(agenda.iter().all(|d| d.entries.is_empty()));
    }
}
