use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ReminderError;

/// Longest accepted check-in cadence (about a century).
pub const MAX_FREQUENCY_DAYS: i32 = 36_500;

/// The three reminder fields of a contact, detached from the row so the date
/// math can run on anything that has them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReminderState {
    pub last_checkin: Option<DateTime<Utc>>,
    pub frequency_days: i32,
    pub snooze_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Active,
    Overdue,
    Snoozed,
}

/// Calendar days between the UTC date of `timestamp` and `today`.
/// Same-day timestamps yield 0 whatever the time of day; future dates go negative.
pub fn days_since(timestamp: DateTime<Utc>, today: NaiveDate) -> i64 {
    (today - timestamp.date_naive()).num_days()
}

/// Soonest due date on or after today, skipping over any whole cycles that were missed.
///
/// Returns `None` when there is nothing to schedule: no last check-in, a
/// non-positive frequency, or a due date past the end of the calendar.
pub fn next_due_date(
    last_checkin: Option<DateTime<Utc>>,
    frequency_days: i32,
    today: NaiveDate,
) -> Option<NaiveDate> {
    if frequency_days <= 0 {
        return None;
    }
    let last = last_checkin?;
    let freq = i64::from(frequency_days);
    let elapsed = days_since(last, today);

    let offset = if elapsed <= freq {
        freq
    } else {
        let cycles_missed = (elapsed - 1) / freq;
        (cycles_missed + 1) * freq
    };
    last.date_naive().checked_add_signed(Duration::days(offset))
}

/// `last_checkin`'s date plus one cadence step; `None` past the calendar's end.
fn first_due_date(last: DateTime<Utc>, frequency_days: i32) -> Option<NaiveDate> {
    last.date_naive()
        .checked_add_signed(Duration::days(i64::from(frequency_days)))
}

/// True while `snooze_until` is today or later.
pub fn has_active_snooze(snooze_until: Option<DateTime<Utc>>, today: NaiveDate) -> bool {
    snooze_until.is_some_and(|s| s.date_naive() >= today)
}

pub fn is_overdue(state: &ReminderState, today: NaiveDate) -> bool {
    if has_active_snooze(state.snooze_until, today) || state.frequency_days <= 0 {
        return false;
    }
    match state.last_checkin {
        Some(last) => first_due_date(last, state.frequency_days).is_some_and(|due| due <= today),
        None => false,
    }
}

pub fn reminder_status(state: &ReminderState, today: NaiveDate) -> ReminderStatus {
    if has_active_snooze(state.snooze_until, today) {
        ReminderStatus::Snoozed
    } else if is_overdue(state, today) {
        ReminderStatus::Overdue
    } else {
        ReminderStatus::Active
    }
}

/// The date a contact next needs attention: an active snooze wins, otherwise
/// the next due date.
pub fn effective_date(state: &ReminderState, today: NaiveDate) -> Option<NaiveDate> {
    match state.snooze_until {
        Some(s) if s.date_naive() >= today => Some(s.date_naive()),
        _ => next_due_date(state.last_checkin, state.frequency_days, today),
    }
}

/// Strict `YYYY-MM-DD` parser. Malformed input is an error, never coerced.
pub fn parse_day(s: &str) -> Result<NaiveDate, ReminderError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ReminderError::InvalidDate(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn state(last: Option<DateTime<Utc>>, freq: i32, snooze: Option<DateTime<Utc>>) -> ReminderState {
        ReminderState {
            last_checkin: last,
            frequency_days: freq,
            snooze_until: snooze,
        }
    }

    #[test]
    fn test_days_since_ignores_time_of_day() {
        let today = day(2024, 1, 20);
        assert_eq!(days_since(at(2024, 1, 20, 0), today), 0);
        assert_eq!(days_since(at(2024, 1, 20, 23), today), 0);
        assert_eq!(days_since(at(2024, 1, 19, 23), today), 1);
        assert_eq!(days_since(at(2024, 1, 1, 12), today), 19);
    }

    #[test]
    fn test_days_since_future_is_negative() {
        assert_eq!(days_since(at(2024, 1, 22, 8), day(2024, 1, 20)), -2);
    }

    #[test]
    fn test_next_due_after_missed_cycles() {
        // 19 days since, floor(18 / 7) = 2 cycles missed -> 1 Jan + 21 days
        let due = next_due_date(Some(at(2024, 1, 1, 10)), 7, day(2024, 1, 20));
        assert_eq!(due, Some(day(2024, 1, 22)));
    }

    #[test]
    fn test_next_due_within_first_cycle() {
        let due = next_due_date(Some(at(2024, 1, 1, 10)), 7, day(2024, 1, 5));
        assert_eq!(due, Some(day(2024, 1, 8)));
    }

    #[test]
    fn test_next_due_on_exact_boundary_is_today() {
        let due = next_due_date(Some(at(2024, 1, 1, 10)), 7, day(2024, 1, 8));
        assert_eq!(due, Some(day(2024, 1, 8)));
        let due = next_due_date(Some(at(2024, 1, 1, 10)), 7, day(2024, 1, 15));
        assert_eq!(due, Some(day(2024, 1, 15)));
    }

    #[test]
    fn test_next_due_none_without_data() {
        assert_eq!(next_due_date(None, 7, day(2024, 1, 5)), None);
        assert_eq!(next_due_date(Some(at(2024, 1, 1, 0)), 0, day(2024, 1, 5)), None);
        assert_eq!(next_due_date(Some(at(2024, 1, 1, 0)), -3, day(2024, 1, 5)), None);
    }

    #[test]
    fn test_next_due_never_in_the_past() {
        let last = at(2023, 11, 3, 17);
        for freq in 1..=40 {
            for offset in 0..200 {
                let today = last.date_naive() + Duration::days(offset);
                let due = next_due_date(Some(last), freq, today).unwrap();
                assert!(due >= today, "freq {freq} offset {offset}: {due} < {today}");
                // one cadence step earlier is never still upcoming
                assert!(due - Duration::days(i64::from(freq)) <= today);
            }
        }
    }

    #[test]
    fn test_next_due_is_idempotent() {
        let last = Some(at(2024, 2, 29, 6));
        let today = day(2024, 6, 1);
        assert_eq!(next_due_date(last, 30, today), next_due_date(last, 30, today));
    }

    #[test]
    fn test_not_overdue_right_after_checkin() {
        let today = day(2024, 5, 1);
        for freq in [1, 2, 7, 30, 365] {
            let s = state(Some(at(2024, 5, 1, 8)), freq, None);
            assert!(!is_overdue(&s, today));
            assert_eq!(reminder_status(&s, today), ReminderStatus::Active);
        }
    }

    #[test]
    fn test_overdue_inclusive_of_due_day() {
        let s = state(Some(at(2024, 1, 1, 22)), 7, None);
        assert!(!is_overdue(&s, day(2024, 1, 7)));
        assert!(is_overdue(&s, day(2024, 1, 8)));
        assert!(is_overdue(&s, day(2024, 3, 1)));
    }

    #[test]
    fn test_snooze_suppresses_overdue_through_its_day() {
        let s = state(Some(at(2024, 1, 1, 0)), 7, Some(at(2024, 1, 12, 9)));
        assert!(!is_overdue(&s, day(2024, 1, 12)));
        assert_eq!(reminder_status(&s, day(2024, 1, 12)), ReminderStatus::Snoozed);
        assert!(is_overdue(&s, day(2024, 1, 13)));
        assert_eq!(reminder_status(&s, day(2024, 1, 13)), ReminderStatus::Overdue);
    }

    #[test]
    fn test_missing_data_is_never_overdue() {
        assert!(!is_overdue(&state(None, 7, None), day(2024, 1, 1)));
        assert!(!is_overdue(&state(Some(at(2020, 1, 1, 0)), 0, None), day(2024, 1, 1)));
    }

    #[test]
    fn test_effective_date_prefers_active_snooze() {
        let today = day(2024, 6, 10);
        let s = state(Some(at(2024, 6, 1, 0)), 7, Some(at(2024, 6, 14, 9)));
        assert_eq!(effective_date(&s, today), Some(day(2024, 6, 14)));

        let expired = state(Some(at(2024, 6, 1, 0)), 7, Some(at(2024, 6, 9, 9)));
        assert_eq!(effective_date(&expired, today), Some(day(2024, 6, 15)));
    }

    #[test]
    fn test_huge_frequency_does_not_overflow() {
        let s = state(Some(at(2024, 1, 1, 0)), i32::MAX, None);
        let today = day(2024, 6, 1);
        assert_eq!(next_due_date(s.last_checkin, s.frequency_days, today), None);
        assert!(!is_overdue(&s, today));
        assert_eq!(reminder_status(&s, today), ReminderStatus::Active);
        assert_eq!(effective_date(&s, today), None);
    }

    #[test]
    fn test_max_frequency_is_schedulable() {
        let last = at(2024, 1, 1, 0);
        let due = next_due_date(Some(last), MAX_FREQUENCY_DAYS, day(2024, 1, 2)).unwrap();
        assert_eq!(due, day(2024, 1, 1) + Duration::days(i64::from(MAX_FREQUENCY_DAYS)));
    }

    #[test]
    fn test_checkin_at_end_of_calendar() {
        let last = DateTime::<Utc>::MAX_UTC;
        let today = day(2024, 6, 1);
        let s = state(Some(last), MAX_FREQUENCY_DAYS, None);
        assert_eq!(next_due_date(Some(last), 1, today), None);
        assert!(!is_overdue(&s, today));
        assert!(!is_overdue(&s, NaiveDate::MAX));
        assert!(days_since(last, today) < 0);
    }

    #[test]
    fn test_parse_day_rejects_garbage() {
        assert_eq!(parse_day("2024-06-10"), Ok(day(2024, 6, 10)));
        assert_eq!(
            parse_day("2024-13-01"),
            Err(ReminderError::InvalidDate("2024-13-01".to_string()))
        );
        assert!(parse_day("next tuesday").is_err());
    }
}
