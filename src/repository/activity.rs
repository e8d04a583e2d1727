//! Activity log repository

use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        activity::{Activity, ActivityRow, NewActivity},
        pagination::PageRequest,
    },
};

const INSERT_ACTIVITY: &str = r#"
    INSERT INTO activities (id, type, action, item, user_id, created_at)
    VALUES ($1, $2, $3, $4, (SELECT id FROM users WHERE id = $5), $6)
"#;

#[derive(Clone)]
pub struct ActivityRepository {
    pool: Pool<Postgres>,
}

impl ActivityRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append an entry; runs on the caller's transaction.
    ///
    /// Session subjects come from the auth provider and may have no `users`
    /// row, in which case the entry is stored without a user.
    pub async fn insert(&self, conn: &mut PgConnection, entry: &NewActivity) -> AppResult<()> {
        sqlx::query(INSERT_ACTIVITY)
        .bind(Uuid::new_v4())
        .bind(entry.kind)
        .bind(&entry.action)
        .bind(&entry.item)
        .bind(entry.user_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Newest entries first, joined with their user
    pub async fn list(&self, page: PageRequest) -> AppResult<(Vec<Activity>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT a.id, a.type AS kind, a.action, a.item, a.created_at,
                   u.id AS user_id, u.name AS user_name, u.image AS user_image
            FROM activities a
            LEFT JOIN users u ON u.id = a.user_id
            ORDER BY a.created_at DESC, a.id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Activity::from).collect(), total))
    }
}
