// Database-native renditions of the date math in `dates` and `snooze`.
// These run inside UPDATE/SELECT statements against the `contacts` table and
// must stay in lockstep with the Rust functions. Sessions run with
// `TIME ZONE 'UTC'` (see `db::create_pool`), and dates are taken in UTC
// explicitly so the calendar-day convention matches `Clock::today`.

/// `snooze_baseline`: later of `$now` and the existing snooze, else last
/// check-in plus one cycle. `GREATEST` skips NULLs, so no history means `$now`.
pub fn snooze_baseline_expr(now_param: usize) -> String {
    format!(
        "GREATEST(${now_param}, COALESCE(snooze_until, \
         last_checkin + make_interval(days => checkin_frequency_days)))"
    )
}

/// `resolve_snooze` for `Days`/`Hours` targets.
pub fn relative_snooze_expr(now_param: usize, days_param: usize, hours_param: usize) -> String {
    format!(
        "{} + make_interval(days => ${days_param}, hours => ${hours_param})",
        snooze_baseline_expr(now_param)
    )
}

/// `is_overdue` against a `$today` DATE parameter.
pub fn overdue_predicate(today_param: usize) -> String {
    format!(
        "(last_checkin IS NOT NULL \
         AND (last_checkin AT TIME ZONE 'UTC')::date + checkin_frequency_days <= ${today_param} \
         AND (snooze_until IS NULL OR (snooze_until AT TIME ZONE 'UTC')::date < ${today_param}))"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_snooze_expr_binds_parameters() {
        let sql = relative_snooze_expr(1, 4, 5);
        assert_eq!(
            sql,
            "GREATEST($1, COALESCE(snooze_until, last_checkin + make_interval(days => checkin_frequency_days))) \
             + make_interval(days => $4, hours => $5)"
        );
    }

    #[test]
    fn test_overdue_predicate_uses_utc_dates() {
        let sql = overdue_predicate(2);
        assert!(sql.contains("(last_checkin AT TIME ZONE 'UTC')::date + checkin_frequency_days <= $2"));
        assert!(sql.contains("(snooze_until AT TIME ZONE 'UTC')::date < $2"));
    }

    /// Evaluates the SQL expressions against a one-row `contacts` stand-in and
    /// compares them with the Rust functions on the same inputs.
    ///
    /// Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.
    #[tokio::test]
    #[ignore = "needs a Postgres instance at DATABASE_URL"]
    async fn test_sql_matches_rust_date_math() {
        use chrono::{DateTime, Duration, TimeZone, Utc};
        use sqlx::{Connection, PgConnection};

        use crate::reminders::dates::{is_overdue, ReminderState};
        use crate::reminders::snooze::{resolve_snooze, SnoozeTarget};

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let mut conn = PgConnection::connect(&url).await.unwrap();
        sqlx::query("SET TIME ZONE 'UTC'").execute(&mut conn).await.unwrap();

        let at = |y, m, d, h| Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap();
        let row = "(SELECT $2::timestamptz AS snooze_until, $3::timestamptz AS last_checkin, \
                   $4::int AS checkin_frequency_days) AS contacts";
        let snooze_sql = format!("SELECT {} FROM {row}", relative_snooze_expr(1, 5, 6));
        let overdue_sql = format!("SELECT {} FROM {row}", overdue_predicate(1));

        let states = [
            // overdue, no snooze
            (Some(at(2024, 1, 1, 12)), 7, None),
            // due later than now
            (Some(at(2024, 1, 1, 12)), 30, None),
            // expired snooze still wins over last + f
            (Some(at(2023, 12, 1, 0)), 7, Some(at(2024, 1, 10, 9))),
            // active snooze
            (Some(at(2024, 1, 1, 0)), 7, Some(at(2024, 1, 25, 9))),
            // no history
            (None, 14, None),
            // leap day and month end
            (Some(at(2024, 2, 29, 23)), 1, None),
            (Some(at(2024, 1, 31, 6)), 30, Some(at(2024, 2, 29, 23))),
        ];
        let targets = [
            SnoozeTarget::Days { amount: 1 },
            SnoozeTarget::Days { amount: 45 },
            SnoozeTarget::Hours { amount: 3 },
            SnoozeTarget::Hours { amount: 49 },
        ];

        for now in [at(2024, 1, 20, 15), at(2024, 2, 29, 8), at(2024, 3, 1, 0)] {
            for (last, freq, snooze) in states {
                let state = ReminderState {
                    last_checkin: last,
                    frequency_days: freq,
                    snooze_until: snooze,
                };

                for target in targets {
                    let (days, hours) = target.interval_parts().unwrap().unwrap();
                    let from_sql: DateTime<Utc> = sqlx::query_scalar(&snooze_sql)
                        .bind(now)
                        .bind(snooze)
                        .bind(last)
                        .bind(freq)
                        .bind(days)
                        .bind(hours)
                        .fetch_one(&mut conn)
                        .await
                        .unwrap();
                    let from_rust = resolve_snooze(target, &state, now).unwrap();
                    assert_eq!(from_sql, from_rust, "{target:?} on {state:?} at {now}");
                }

                for offset in [-1, 0, 1, 7, 30] {
                    let today = now.date_naive() + Duration::days(offset);
                    let from_sql: bool = sqlx::query_scalar(&overdue_sql)
                        .bind(today)
                        .bind(snooze)
                        .bind(last)
                        .bind(freq)
                        .fetch_one(&mut conn)
                        .await
                        .unwrap();
                    assert_eq!(from_sql, is_overdue(&state, today), "{state:?} on {today}");
                }
            }
        }
    }
}
