//! Aggregate queries backing the stats and analytics endpoints

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        activity::ActivityType,
        book::{Book, BookStatus},
        stats::{BorrowCount, DailyCount, StatusCount},
    },
};

#[derive(Clone)]
pub struct StatsRepository {
    pool: Pool<Postgres>,
}

impl StatsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn count_books(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_users(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Borrowed books due at or before `now`
    pub async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE status = $1 AND due_date <= $2")
                .bind(BookStatus::Borrowed)
                .bind(now)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn status_distribution(&self) -> AppResult<Vec<StatusCount>> {
        let rows = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM books GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn recent_books(&self, limit: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books ORDER BY created_at DESC, id LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Titles with the most `borrow` entries in the activity log
    pub async fn most_borrowed(&self, limit: i64) -> AppResult<Vec<BorrowCount>> {
        let rows = sqlx::query_as::<_, BorrowCount>(
            r#"
            SELECT item AS title, COUNT(*) AS count
            FROM activities
            WHERE type = $1
            GROUP BY item
            ORDER BY count DESC, item
            LIMIT $2
            "#,
        )
        .bind(ActivityType::Borrow)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Activity entries per UTC day, oldest first
    pub async fn activity_per_day(&self) -> AppResult<Vec<DailyCount>> {
        let rows = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT date_trunc('day', created_at AT TIME ZONE 'UTC') AT TIME ZONE 'UTC' AS date,
                   COUNT(*) AS count
            FROM activities
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
