//! Books repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use super::like_pattern;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetails, BookStatus, BorrowState, BorrowedBook, BorrowedBookRow, NewBook},
        pagination::PageRequest,
    },
};

const BORROWED_SELECT: &str = r#"
    SELECT b.id, b.title, b.author, b.isbn, b.category, b.borrowed_at, b.due_date,
           u.id AS user_id, u.name AS user_name, u.email AS user_email
    FROM books b
    LEFT JOIN users u ON u.id = b.borrowed_by
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    pub async fn exists(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Paginated list, newest first, with optional text search and status filter
    pub async fn list(
        &self,
        search: Option<&str>,
        status: Option<BookStatus>,
        page: PageRequest,
    ) -> AppResult<(Vec<Book>, i64)> {
        let pattern = like_pattern(search);

        let filter = r#"
            ($1::text IS NULL
                OR LOWER(title) LIKE $1
                OR LOWER(author) LIKE $1
                OR LOWER(COALESCE(isbn, '')) LIKE $1
                OR LOWER(category) LIKE $1
                OR LOWER(COALESCE(description, '')) LIKE $1)
            AND ($2::text IS NULL OR status = $2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM books WHERE {}", filter))
            .bind(&pattern)
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT * FROM books WHERE {} ORDER BY created_at DESC, id LIMIT $3 OFFSET $4",
            filter
        ))
        .bind(&pattern)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// Global search over title, author, category and description
    pub async fn search(&self, term: &str, limit: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE LOWER(title) LIKE $1
               OR LOWER(author) LIKE $1
               OR LOWER(category) LIKE $1
               OR LOWER(COALESCE(description, '')) LIKE $1
            ORDER BY title
            LIMIT $2
            "#,
        )
        .bind(like_pattern(Some(term)))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Books currently out on loan, most recent loans first
    pub async fn list_borrowed(&self, page: PageRequest) -> AppResult<(Vec<BorrowedBook>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE status = $1")
            .bind(BookStatus::Borrowed)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, BorrowedBookRow>(&format!(
            "{} WHERE b.status = $1 ORDER BY b.borrowed_at DESC NULLS LAST, b.id LIMIT $2 OFFSET $3",
            BORROWED_SELECT
        ))
        .bind(BookStatus::Borrowed)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(BorrowedBook::from).collect(), total))
    }

    /// Borrowed books whose due date is before `now`, latest due date first
    pub async fn list_overdue(
        &self,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> AppResult<(Vec<BorrowedBook>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE status = $1 AND due_date < $2")
                .bind(BookStatus::Borrowed)
                .bind(now)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as::<_, BorrowedBookRow>(&format!(
            "{} WHERE b.status = $1 AND b.due_date < $2 ORDER BY b.due_date DESC, b.id LIMIT $3 OFFSET $4",
            BORROWED_SELECT
        ))
        .bind(BookStatus::Borrowed)
        .bind(now)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(BorrowedBook::from).collect(), total))
    }

    /// Books a user currently holds
    pub async fn loans_for_user(&self, user_id: Uuid) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE borrowed_by = $1 AND status = $2 ORDER BY due_date",
        )
        .bind(user_id)
        .bind(BookStatus::Borrowed)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    pub async fn insert(&self, conn: &mut PgConnection, book: &NewBook) -> AppResult<Book> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                id, title, author, isbn, category, description, published_year,
                publisher, pages, rating, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(&book.description)
        .bind(book.published_year)
        .bind(&book.publisher)
        .bind(book.pages)
        .bind(book.rating)
        .bind(book.status)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        Ok(created)
    }

    /// Write new details and borrow state, provided status and borrower are
    /// still those in `expected`. Returns `None` when another request changed
    /// either one first.
    pub async fn update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        expected: &BorrowState,
        details: &BookDetails,
        next: &BorrowState,
    ) -> AppResult<Option<Book>> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = $3, author = $4, isbn = $5, category = $6, description = $7,
                published_year = $8, publisher = $9, pages = $10, rating = $11,
                status = $12, borrowed_by = $13, borrowed_at = $14, due_date = $15,
                updated_at = $16
            WHERE id = $1 AND status = $2 AND borrowed_by IS NOT DISTINCT FROM $17
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected.status)
        .bind(&details.title)
        .bind(&details.author)
        .bind(&details.isbn)
        .bind(&details.category)
        .bind(&details.description)
        .bind(details.published_year)
        .bind(&details.publisher)
        .bind(details.pages)
        .bind(details.rating)
        .bind(next.status)
        .bind(next.borrowed_by)
        .bind(next.borrowed_at)
        .bind(next.due_date)
        .bind(Utc::now())
        .bind(expected.borrowed_by)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(updated)
    }

    /// Delete a book unless it is on loan. `None` means nothing was deleted.
    pub async fn delete_unless_borrowed(&self, id: Uuid) -> AppResult<Option<Book>> {
        let deleted = sqlx::query_as::<_, Book>(
            "DELETE FROM books WHERE id = $1 AND status <> $2 RETURNING *",
        )
        .bind(id)
        .bind(BookStatus::Borrowed)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deleted)
    }
}
