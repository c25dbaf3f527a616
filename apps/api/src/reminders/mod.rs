// Reminder scheduling: due dates, snoozes, agenda projection and calendar export.
// Everything here is pure date arithmetic over UTC calendar days; "now" comes
// from the injected `Clock`, never from the process clock directly.

pub mod agenda;
pub mod calendar;
pub mod clock;
pub mod dates;
pub mod handlers;
pub mod snooze;
pub mod sql;

use thiserror::Error;

pub use clock::{Clock, SystemClock};
pub use dates::{days_since, is_overdue, next_due_date, reminder_status, ReminderState, ReminderStatus};
pub use snooze::{resolve_snooze, SnoozeTarget};

#[derive(Debug, Error, PartialEq)]
pub enum ReminderError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid horizon '{0}', expected 7, 30, 365 or all")]
    InvalidHorizon(String),

    #[error("snooze amount must be a positive integer")]
    ZeroSnooze,

    #[error("snooze may be at most {max_days} days or {max_hours} hours")]
    SnoozeTooLong { max_days: u32, max_hours: u32 },

    #[error("date is out of range")]
    OutOfRange,
}
