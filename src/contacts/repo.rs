use sqlx::{FromRow, PgPool};
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use super::dto::ContactPayload;

#[derive(Debug, Clone, FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birthday: Date,
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, user_id, first_name, last_name, email, phone_number, birthday, created_at";

impl Contact {
    pub async fn create(db: &PgPool, user_id: Uuid, c: &ContactPayload) -> anyhow::Result<Contact> {
        let row = sqlx::query_as::<_, Contact>(&format!(
            r#"
            INSERT INTO contacts (user_id, first_name, last_name, email, phone_number, birthday)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(&c.first_name)
        .bind(&c.last_name)
        .bind(&c.email)
        .bind(&c.phone_number)
        .bind(c.birthday)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn list_by_owner(
        db: &PgPool,
        user_id: Uuid,
        skip: i64,
        limit: i64,
    ) -> anyhow::Result<Vec<Contact>> {
        let rows = sqlx::query_as::<_, Contact>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM contacts
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(user_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Owner-scoped fetch. Someone else's contact is indistinguishable from a
    /// missing one.
    pub async fn get_scoped(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> anyhow::Result<Option<Contact>> {
        let row = sqlx::query_as::<_, Contact>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM contacts
            WHERE id = $1 AND user_id = $2
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn update_scoped(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        c: &ContactPayload,
    ) -> anyhow::Result<Option<Contact>> {
        let row = sqlx::query_as::<_, Contact>(&format!(
            r#"
            UPDATE contacts
            SET first_name = $3, last_name = $4, email = $5, phone_number = $6, birthday = $7
            WHERE id = $1 AND user_id = $2
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .bind(&c.first_name)
        .bind(&c.last_name)
        .bind(&c.email)
        .bind(&c.phone_number)
        .bind(c.birthday)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn delete_scoped(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> anyhow::Result<Option<Contact>> {
        let row = sqlx::query_as::<_, Contact>(&format!(
            r#"
            DELETE FROM contacts
            WHERE id = $1 AND user_id = $2
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Case-sensitive substring match over name and email fields,
    /// restricted to the caller's contacts.
    pub async fn search(db: &PgPool, user_id: Uuid, query: &str) -> anyhow::Result<Vec<Contact>> {
        let rows = sqlx::query_as::<_, Contact>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM contacts
            WHERE user_id = $1
              AND (first_name LIKE '%' || $2 || '%'
                OR last_name LIKE '%' || $2 || '%'
                OR email LIKE '%' || $2 || '%')
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user_id)
        .bind(query)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Contacts whose birthday falls inside the window starting at `today`.
    /// Matches on month/day only, so windows crossing Dec 31 behave.
    pub async fn upcoming_birthdays(
        db: &PgPool,
        user_id: Uuid,
        today: Date,
    ) -> anyhow::Result<Vec<Contact>> {
        let keys = birthday_window_keys(today);
        let rows = sqlx::query_as::<_, Contact>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM contacts
            WHERE user_id = $1
              AND to_char(birthday, 'MMDD') = ANY($2)
            ORDER BY to_char(birthday, 'MMDD')
            "#,
        ))
        .bind(user_id)
        .bind(&keys)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

/// `MMDD` keys for today through today+7 inclusive.
pub(crate) fn birthday_window_keys(start: Date) -> Vec<String> {
    (0..=7)
        .map(|off| {
            let d = start.saturating_add(Duration::days(off));
            format!("{:02}{:02}", u8::from(d.month()), d.day())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn window_keys_cover_eight_days() {
        let keys = birthday_window_keys(date!(2026 - 03 - 10));
        assert_eq!(keys.len(), 8);
        assert_eq!(keys.first().unwrap(), "0310");
        assert_eq!(keys.last().unwrap(), "0317");
    }

    #[test]
    fn window_keys_wrap_the_year_boundary() {
        let keys = birthday_window_keys(date!(2026 - 12 - 28));
        assert_eq!(
            keys,
            vec!["1228", "1229", "1230", "1231", "0101", "0102", "0103", "0104"]
        );
    }

    #[test]
    fn window_keys_cross_a_leap_february() {
        let keys = birthday_window_keys(date!(2024 - 02 - 26));
        assert!(keys.contains(&"0229".to_string()));
        assert_eq!(keys.last().unwrap(), "0304");
    }

    #[test]
    fn window_keys_cross_a_plain_february() {
        let keys = birthday_window_keys(date!(2026 - 02 - 26));
        assert!(!keys.contains(&"0229".to_string()));
        assert_eq!(keys.last().unwrap(), "0305");
    }
}
