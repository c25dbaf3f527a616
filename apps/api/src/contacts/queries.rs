use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::contact::ContactRow;
use crate::models::tag::ContactTagRow;
use crate::reminders::sql::{overdue_predicate, relative_snooze_expr};
use crate::reminders::SnoozeTarget;
use crate::reminders::snooze::tomorrow_morning;

/// Filters for the contact list. `archived` selects which side of the flag to show.
#[derive(Debug, Default, Clone)]
pub struct ContactFilter {
    pub archived: bool,
    pub tag: Option<String>,
    pub search: Option<String>,
}

/// Boolean columns that can be flipped in place.
#[derive(Debug, Clone, Copy)]
pub enum ContactFlag {
    Pinned,
    Archived,
}

impl ContactFlag {
    fn column(self) -> &'static str {
        match self {
            ContactFlag::Pinned => "is_pinned",
            ContactFlag::Archived => "is_archived",
        }
    }
}

/// Pinned contacts first, then by name ignoring case.
pub async fn list_contacts(pool: &PgPool, user_id: Uuid, filter: &ContactFilter) -> Result<Vec<ContactRow>> {
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let tag = filter.tag.as_deref().map(str::trim).filter(|s| !s.is_empty());

    Ok(sqlx::query_as::<_, ContactRow>(
        r#"
        SELECT * FROM contacts
        WHERE user_id = $1
          AND is_archived = $2
          AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%')
          AND ($4::text IS NULL OR EXISTS (
                SELECT 1 FROM contact_tags ct
                JOIN tags t ON t.id = ct.tag_id
                WHERE ct.contact_id = contacts.id AND lower(t.name) = lower($4)
          ))
        ORDER BY is_pinned DESC, lower(name) ASC
        "#,
    )
    .bind(user_id)
    .bind(filter.archived)
    .bind(search)
    .bind(tag)
    .fetch_all(pool)
    .await?)
}

/// Every non-archived contact, for agenda and calendar projection.
pub async fn active_contacts(pool: &PgPool, user_id: Uuid) -> Result<Vec<ContactRow>> {
    Ok(sqlx::query_as::<_, ContactRow>(
        "SELECT * FROM contacts WHERE user_id = $1 AND NOT is_archived",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

/// Overdue, non-archived contacts, most overdue first.
pub async fn due_contacts(pool: &PgPool, user_id: Uuid, today: NaiveDate) -> Result<Vec<ContactRow>> {
    let sql = format!(
        "SELECT * FROM contacts WHERE user_id = $1 AND NOT is_archived AND {} \
         ORDER BY last_checkin + make_interval(days => checkin_frequency_days) ASC, lower(name) ASC",
        overdue_predicate(2)
    );
    Ok(sqlx::query_as::<_, ContactRow>(&sql)
        .bind(user_id)
        .bind(today)
        .fetch_all(pool)
        .await?)
}

pub async fn get_contact(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<ContactRow>> {
    Ok(
        sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn insert_contact(pool: &PgPool, contact: &ContactRow) -> Result<ContactRow> {
    Ok(sqlx::query_as::<_, ContactRow>(
        r#"
        INSERT INTO contacts
            (id, user_id, name, checkin_frequency_days, last_checkin, snooze_until,
             is_archived, is_pinned, birthday, email, phone, how_we_met, interests,
             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING *
        "#,
    )
    .bind(contact.id)
    .bind(contact.user_id)
    .bind(&contact.name)
    .bind(contact.checkin_frequency_days)
    .bind(contact.last_checkin)
    .bind(contact.snooze_until)
    .bind(contact.is_archived)
    .bind(contact.is_pinned)
    .bind(contact.birthday)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.how_we_met)
    .bind(&contact.interests)
    .bind(contact.created_at)
    .bind(contact.updated_at)
    .fetch_one(pool)
    .await?)
}

/// Writes back every editable column of an already-patched row.
pub async fn save_contact(pool: &PgPool, contact: &ContactRow) -> Result<Option<ContactRow>> {
    Ok(sqlx::query_as::<_, ContactRow>(
        r#"
        UPDATE contacts SET
            name = $3,
            checkin_frequency_days = $4,
            last_checkin = $5,
            snooze_until = $6,
            is_archived = $7,
            is_pinned = $8,
            birthday = $9,
            email = $10,
            phone = $11,
            how_we_met = $12,
            interests = $13,
            updated_at = $14
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(contact.id)
    .bind(contact.user_id)
    .bind(&contact.name)
    .bind(contact.checkin_frequency_days)
    .bind(contact.last_checkin)
    .bind(contact.snooze_until)
    .bind(contact.is_archived)
    .bind(contact.is_pinned)
    .bind(contact.birthday)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.how_we_met)
    .bind(&contact.interests)
    .bind(contact.updated_at)
    .fetch_optional(pool)
    .await?)
}

/// Check-in: restart the cycle at `now` and drop any snooze.
pub async fn checkin_contacts(
    pool: &PgPool,
    user_id: Uuid,
    ids: &[Uuid],
    now: DateTime<Utc>,
) -> Result<Vec<ContactRow>> {
    Ok(sqlx::query_as::<_, ContactRow>(
        r#"
        UPDATE contacts
        SET last_checkin = $3, snooze_until = NULL, updated_at = $3
        WHERE user_id = $1 AND id = ANY($2)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(ids)
    .bind(now)
    .fetch_all(pool)
    .await?)
}

pub async fn set_snooze(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    snooze_until: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Option<ContactRow>> {
    Ok(sqlx::query_as::<_, ContactRow>(
        r#"
        UPDATE contacts SET snooze_until = $3, updated_at = $4
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(snooze_until)
    .bind(now)
    .fetch_optional(pool)
    .await?)
}

/// Snoozes many contacts in one statement, each from its own baseline.
pub async fn snooze_contacts(
    pool: &PgPool,
    user_id: Uuid,
    ids: &[Uuid],
    target: SnoozeTarget,
    now: DateTime<Utc>,
) -> Result<Vec<ContactRow>> {
    let rows = match target.interval_parts()? {
        None => {
            sqlx::query_as::<_, ContactRow>(
                r#"
                UPDATE contacts SET snooze_until = $3, updated_at = $4
                WHERE user_id = $1 AND id = ANY($2)
                RETURNING *
                "#,
            )
            .bind(user_id)
            .bind(ids)
            .bind(tomorrow_morning(now)?)
            .bind(now)
            .fetch_all(pool)
            .await?
        }
        Some((days, hours)) => {
            let sql = format!(
                "UPDATE contacts SET snooze_until = {}, updated_at = $3 \
                 WHERE user_id = $1 AND id = ANY($2) RETURNING *",
                relative_snooze_expr(3, 4, 5)
            );
            sqlx::query_as::<_, ContactRow>(&sql)
                .bind(user_id)
                .bind(ids)
                .bind(now)
                .bind(days)
                .bind(hours)
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}

pub async fn set_flag(
    pool: &PgPool,
    user_id: Uuid,
    ids: &[Uuid],
    flag: ContactFlag,
    value: bool,
    now: DateTime<Utc>,
) -> Result<Vec<ContactRow>> {
    let sql = format!(
        "UPDATE contacts SET {} = $3, updated_at = $4 \
         WHERE user_id = $1 AND id = ANY($2) RETURNING *",
        flag.column()
    );
    Ok(sqlx::query_as::<_, ContactRow>(&sql)
        .bind(user_id)
        .bind(ids)
        .bind(value)
        .bind(now)
        .fetch_all(pool)
        .await?)
}

pub async fn delete_contacts(pool: &PgPool, user_id: Uuid, ids: &[Uuid]) -> Result<u64> {
    let result = sqlx::query("DELETE FROM contacts WHERE user_id = $1 AND id = ANY($2)")
        .bind(user_id)
        .bind(ids)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Tags for a set of contacts, ordered by tag name.
pub async fn tags_for_contacts(pool: &PgPool, user_id: Uuid, ids: &[Uuid]) -> Result<Vec<ContactTagRow>> {
    Ok(sqlx::query_as::<_, ContactTagRow>(
        r#"
        SELECT ct.contact_id, t.id, t.name
        FROM contact_tags ct
        JOIN tags t ON t.id = ct.tag_id
        WHERE t.user_id = $1 AND ct.contact_id = ANY($2)
        ORDER BY lower(t.name)
        "#,
    )
    .bind(user_id)
    .bind(ids)
    .fetch_all(pool)
    .await?)
}
