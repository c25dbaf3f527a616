use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::dates::ReminderState;
use super::ReminderError;

/// Hour of day (UTC) a "tomorrow" snooze wakes up at.
pub const TOMORROW_HOUR_UTC: u32 = 9;

/// Upper bounds on a relative snooze (about ten years).
pub const MAX_SNOOZE_DAYS: u32 = 3_650;
pub const MAX_SNOOZE_HOURS: u32 = MAX_SNOOZE_DAYS * 24;

/// How far to push a reminder out.
///
/// Wire form: `{"unit":"days","amount":3}`, `{"unit":"hours","amount":4}`
/// or `{"unit":"tomorrow"}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum SnoozeTarget {
    Days { amount: u32 },
    Hours { amount: u32 },
    Tomorrow,
}

impl SnoozeTarget {
    /// Rejects zero-length and over-long relative snoozes.
    pub fn validate(self) -> Result<Self, ReminderError> {
        match self {
            SnoozeTarget::Days { amount: 0 } | SnoozeTarget::Hours { amount: 0 } => {
                Err(ReminderError::ZeroSnooze)
            }
            SnoozeTarget::Days { amount } if amount > MAX_SNOOZE_DAYS => Err(too_long()),
            SnoozeTarget::Hours { amount } if amount > MAX_SNOOZE_HOURS => Err(too_long()),
            other => Ok(other),
        }
    }

    /// `(days, hours)` for relative targets, `None` for `Tomorrow`.
    pub fn interval_parts(self) -> Result<Option<(i32, i32)>, ReminderError> {
        let parts = match self.validate()? {
            SnoozeTarget::Days { amount } => Some((to_i32(amount)?, 0)),
            SnoozeTarget::Hours { amount } => Some((0, to_i32(amount)?)),
            SnoozeTarget::Tomorrow => None,
        };
        Ok(parts)
    }
}

fn too_long() -> ReminderError {
    ReminderError::SnoozeTooLong {
        max_days: MAX_SNOOZE_DAYS,
        max_hours: MAX_SNOOZE_HOURS,
    }
}

fn to_i32(amount: u32) -> Result<i32, ReminderError> {
    i32::try_from(amount).map_err(|_| too_long())
}

/// 09:00 UTC on the calendar day after `now`.
pub fn tomorrow_morning(now: DateTime<Utc>) -> Result<DateTime<Utc>, ReminderError> {
    let tomorrow = now.date_naive().succ_opt().ok_or(ReminderError::OutOfRange)?;
    let nine = NaiveTime::from_hms_opt(TOMORROW_HOUR_UTC, 0, 0).unwrap_or(NaiveTime::MIN);
    Ok(tomorrow.and_time(nine).and_utc())
}

/// The instant a relative snooze counts from: whichever is later of `now` and
/// the current effective wake-up (existing snooze, else last check-in plus one cycle).
pub fn snooze_baseline(
    state: &ReminderState,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ReminderError> {
    let scheduled = match (state.snooze_until, state.last_checkin) {
        (Some(until), _) => Some(until),
        (None, Some(last)) => Some(
            last.checked_add_signed(Duration::days(i64::from(state.frequency_days)))
                .ok_or(ReminderError::OutOfRange)?,
        ),
        (None, None) => None,
    };
    Ok(match scheduled {
        Some(at) if at > now => at,
        _ => now,
    })
}

/// Computes the new `snooze_until` for one contact. Fails on an invalid
/// target or when the result would fall past the end of the calendar.
pub fn resolve_snooze(
    target: SnoozeTarget,
    state: &ReminderState,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ReminderError> {
    let step = match target.validate()? {
        SnoozeTarget::Tomorrow => return tomorrow_morning(now),
        SnoozeTarget::Days { amount } => Duration::days(i64::from(amount)),
        SnoozeTarget::Hours { amount } => Duration::hours(i64::from(amount)),
    };
    snooze_baseline(state, now)?
        .checked_add_signed(step)
        .ok_or(ReminderError::OutOfRange)
}
