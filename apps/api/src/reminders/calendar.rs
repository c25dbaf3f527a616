use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::dates::effective_date;
use super::ReminderError;
use crate::models::contact::ContactRow;

const PRODID: &str = "-//reconnect//check-in reminders//EN";

/// Longest physical line, in octets, excluding the CRLF.
const MAX_LINE_OCTETS: usize = 75;

/// How far ahead due dates are projected in an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    Days(i64),
    All,
}

impl FromStr for Horizon {
    type Err = ReminderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "7" => Ok(Horizon::Days(7)),
            "30" => Ok(Horizon::Days(30)),
            "365" => Ok(Horizon::Days(365)),
            "all" => Ok(Horizon::All),
            other => Err(ReminderError::InvalidHorizon(other.to_string())),
        }
    }
}

/// Due dates to export for one contact: the effective date, then every
/// cadence step after it up to `today + n`. `All` stops at the first date.
pub fn projected_due_dates(contact: &ContactRow, today: NaiveDate, horizon: Horizon) -> Vec<NaiveDate> {
    let Some(first) = effective_date(&contact.reminder_state(), today) else {
        return Vec::new();
    };
    let end = match horizon {
        Horizon::All => return vec![first],
        Horizon::Days(n) => today
            .checked_add_signed(Duration::days(n))
            .unwrap_or(NaiveDate::MAX),
    };
    let step = Duration::days(i64::from(contact.checkin_frequency_days.max(1)));

    let mut dates = Vec::new();
    let mut date = first;
    while date <= end {
        dates.push(date);
        match date.checked_add_signed(step) {
            Some(next) => date = next,
            None => break,
        }
    }
    dates
}

/// Renders an RFC 5545 calendar with a yearly all-day event per birthday and
/// an all-day event per projected check-in. Archived contacts are skipped.
pub fn render_calendar(contacts: &[ContactRow], now: DateTime<Utc>, horizon: Horizon) -> String {
    let today = now.date_naive();
    let stamp = now.format("%Y%m%dT%H%M%SZ").to_string();

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
        "CALSCALE:GREGORIAN".to_string(),
    ];

    for contact in contacts.iter().filter(|c| !c.is_archived) {
        if let Some(birthday) = contact.birthday {
            push_all_day_event(
                &mut lines,
                &format!("birthday-{}@reconnect", contact.id),
                &stamp,
                birthday,
                &format!("{}'s birthday", contact.name),
                Some("RRULE:FREQ=YEARLY"),
            );
        }
        for due in projected_due_dates(contact, today, horizon) {
            push_all_day_event(
                &mut lines,
                &format!("checkin-{}-{}@reconnect", contact.id, due.format("%Y%m%d")),
                &stamp,
                due,
                &format!("Check in with {}", contact.name),
                None,
            );
        }
    }

    lines.push("END:VCALENDAR".to_string());
    let mut out = lines
        .iter()
        .map(|line| fold_line(line))
        .collect::<Vec<_>>()
        .join("\r\n");
    out.push_str("\r\n");
    out
}

fn push_all_day_event(
    lines: &mut Vec<String>,
    uid: &str,
    stamp: &str,
    date: NaiveDate,
    summary: &str,
    rrule: Option<&str>,
) {
    let Some(end) = date.succ_opt() else {
        return;
    };
    lines.push("BEGIN:VEVENT".to_string());
    lines.push(format!("UID:{uid}"));
    lines.push(format!("DTSTAMP:{stamp}"));
    lines.push(format!("DTSTART;VALUE=DATE:{}", date.format("%Y%m%d")));
    lines.push(format!("DTEND;VALUE=DATE:{}", end.format("%Y%m%d")));
    if let Some(rule) = rrule {
        lines.push(rule.to_string());
    }
    lines.push(format!("SUMMARY:{}", escape_text(summary)));
    lines.push("TRANSP:TRANSPARENT".to_string());
    lines.push("END:VEVENT".to_string());
}

/// Folds a content line (RFC 5545 §3.1): continuation lines start with one
/// space, and a split never lands inside a UTF-8 sequence.
fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + 3 * (line.len() / MAX_LINE_OCTETS));
    let mut width = 0;
    for c in line.chars() {
        if width + c.len_utf8() > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(c);
        width += c.len_utf8();
    }
    out
}

/// TEXT value escaping (RFC 5545 §3.3.11).
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}
