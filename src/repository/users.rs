//! Users repository for database operations

use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use super::like_pattern;
use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::PageRequest,
        user::{User, EMAIL_REGISTERED, EMAIL_TAKEN},
    },
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn exists(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Paginated list ordered by name; `search` matches name or email
    pub async fn list(&self, search: Option<&str>, page: PageRequest) -> AppResult<(Vec<User>, i64)> {
        let pattern = like_pattern(search);
        let filter = "($1::text IS NULL OR LOWER(name) LIKE $1 OR LOWER(email) LIKE $1)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {}", filter))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT * FROM users WHERE {} ORDER BY name, id LIMIT $2 OFFSET $3",
            filter
        ))
        .bind(&pattern)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total))
    }

    pub async fn search(&self, term: &str, limit: i64) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(name) LIKE $1 OR LOWER(email) LIKE $1 ORDER BY name LIMIT $2",
        )
        .bind(like_pattern(Some(term)))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Whether `email` belongs to a user other than `exclude_id`
    pub async fn email_taken(&self, email: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        name: &str,
        email: &str,
        role: &str,
    ) -> AppResult<User> {
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, role, email_verified, created_at, updated_at)
            VALUES ($1, $2, $3, $4, FALSE, $5, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| map_email_conflict(e, EMAIL_REGISTERED))?;

        Ok(user)
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
        role: Option<&str>,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, email = $3, role = COALESCE($4, role), updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_email_conflict(e, EMAIL_TAKEN))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Number of books the user currently holds
    pub async fn count_loans(&self, id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE borrowed_by = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Delete a user unless some book still names them as borrower
    pub async fn delete_without_loans(&self, id: Uuid) -> AppResult<Option<User>> {
        let deleted = sqlx::query_as::<_, User>(
            r#"
            DELETE FROM users
            WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM books WHERE borrowed_by = $1)
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deleted)
    }
}

/// The unique index on email is the last line of defence against racing writes
fn map_email_conflict(e: sqlx::Error, message: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::BusinessRule(message.to_string())
        }
        _ => AppError::Database(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::{borrow::Cow, error::Error as StdError, fmt};

    #[derive(Debug)]
    struct UniqueViolation;

    impl fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("duplicate key value violates unique constraint \"users_email_lower_idx\"")
        }
    }

    impl StdError for UniqueViolation {}

    impl DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23505"))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn test_unique_violation_reports_callers_message() {
        let insert = map_email_conflict(sqlx::Error::Database(Box::new(UniqueViolation)), EMAIL_REGISTERED);
        assert_eq!(insert.to_string(), format!("Business rule violation: {}", EMAIL_REGISTERED));

        let update = map_email_conflict(sqlx::Error::Database(Box::new(UniqueViolation)), EMAIL_TAKEN);
        assert_eq!(update.to_string(), format!("Business rule violation: {}", EMAIL_TAKEN));
    }

    #[test]
    fn test_other_errors_stay_database_errors() {
        assert!(matches!(
            map_email_conflict(sqlx::Error::RowNotFound, EMAIL_TAKEN),
            AppError::Database(sqlx::Error::RowNotFound)
        ));
    }
}
