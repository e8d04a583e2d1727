//! Book catalog and circulation service

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::NewActivity,
        book::{plan_transition, Book, BookQuery, BookStatus, BorrowedBook, CreateBook, LoanedBook, UpdateBook},
        pagination::PageRequest,
    },
    repository::Repository,
};

use super::delete_refused;

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List books with optional search and status filter
    pub async fn list_books(&self, query: &BookQuery, page: PageRequest) -> AppResult<(Vec<Book>, i64)> {
        let status = query.status_filter()?;
        self.repository
            .books
            .list(query.search.as_deref(), status, page)
            .await
    }

    pub async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Add a book to the catalog and log it as an `add` activity by `actor`
    pub async fn create_book(&self, request: CreateBook, actor: Uuid) -> AppResult<Book> {
        let new_book = request.validate()?;

        let mut tx = self.repository.begin().await?;
        let book = self.repository.books.insert(&mut tx, &new_book).await?;
        self.repository
            .activity
            .insert(&mut tx, &NewActivity::added(&book.title, actor))
            .await?;
        tx.commit().await?;

        tracing::info!(book_id = %book.id, title = %book.title, "Book added");
        Ok(book)
    }

    /// Apply a partial update, including borrow/return transitions.
    ///
    /// The status change and the activity entries it produces are committed
    /// together. If the status changed underneath us the update is refused.
    pub async fn update_book(&self, id: Uuid, request: UpdateBook) -> AppResult<Book> {
        let current = self.repository.books.get_by_id(id).await?;

        let details = request.merge_details(&current)?;
        let expected = current.borrow_state();
        let plan = plan_transition(&expected, &request, Utc::now())?;

        if let Some(borrower) = plan.next.borrowed_by {
            if Some(borrower) != current.borrowed_by && !self.repository.users.exists(borrower).await? {
                return Err(AppError::NotFound("Borrower not found".to_string()));
            }
        }

        let mut tx = self.repository.begin().await?;
        let updated = self
            .repository
            .books
            .update(&mut tx, id, &expected, &details, &plan.next)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Book loan changed by another request, reload and retry".to_string())
            })?;

        for event in &plan.events {
            self.repository
                .activity
                .insert(&mut tx, &event.into_activity(&updated.title))
                .await?;
        }
        tx.commit().await?;

        match (current.status, updated.status) {
            (BookStatus::Borrowed, BookStatus::Borrowed) => {}
            (_, BookStatus::Borrowed) => {
                tracing::info!(book_id = %id, borrower = ?updated.borrowed_by, due = ?updated.due_date, "Book borrowed")
            }
            (BookStatus::Borrowed, status) => {
                tracing::info!(book_id = %id, %status, "Book returned")
            }
            _ => {}
        }

        Ok(updated)
    }

    /// Delete a book that is not currently borrowed
    pub async fn delete_book(&self, id: Uuid) -> AppResult<Book> {
        let book = self.repository.books.get_by_id(id).await?;
        book.ensure_deletable()?;

        let deleted = match self.repository.books.delete_unless_borrowed(id).await? {
            Some(book) => book,
            None => {
                let still_exists = self.repository.books.exists(id).await?;
                return Err(delete_refused(still_exists, "Book not found", "Cannot delete a borrowed book"));
            }
        };

        tracing::info!(book_id = %id, title = %deleted.title, "Book deleted");
        Ok(deleted)
    }

    pub async fn list_borrowed(&self, page: PageRequest) -> AppResult<(Vec<BorrowedBook>, i64)> {
        self.repository.books.list_borrowed(page).await
    }

    pub async fn list_overdue(&self, page: PageRequest) -> AppResult<(Vec<BorrowedBook>, i64)> {
        self.repository.books.list_overdue(Utc::now(), page).await
    }

    /// A user's current loans, each flagged when past due
    pub async fn user_loans(&self, user_id: Uuid) -> AppResult<Vec<LoanedBook>> {
        self.repository.users.get_by_id(user_id).await?;

        let now = Utc::now();
        let books = self.repository.books.loans_for_user(user_id).await?;
        Ok(books
            .into_iter()
            .map(|book| LoanedBook {
                is_overdue: book.is_overdue(now),
                book,
            })
            .collect())
    }
}
