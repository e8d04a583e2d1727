//! Book model, request payloads and the borrow/return state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::activity::NewActivity;
use super::user::UserRef;
use crate::error::{AppError, AppResult};

/// Circulation status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BookStatus {
    Available,
    Borrowed,
    Reserved,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Borrowed => "Borrowed",
            BookStatus::Reserved => "Reserved",
        }
    }
}

impl Default for BookStatus {
    fn default() -> Self {
        BookStatus::Available
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(BookStatus::Available),
            "borrowed" => Ok(BookStatus::Borrowed),
            "reserved" => Ok(BookStatus::Reserved),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

// Stored as TEXT
impl sqlx::Type<Postgres> for BookStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for BookStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: &str = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Book row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: String,
    pub description: Option<String>,
    pub published_year: Option<i32>,
    pub publisher: Option<String>,
    pub pages: Option<i32>,
    pub rating: Option<f64>,
    pub status: BookStatus,
    pub borrowed_by: Option<Uuid>,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == BookStatus::Borrowed && self.due_date.map(|d| d < now).unwrap_or(false)
    }

    /// Refuse to delete a book that is out on loan
    pub fn ensure_deletable(&self) -> AppResult<()> {
        if self.status == BookStatus::Borrowed {
            return Err(AppError::BusinessRule("Cannot delete a borrowed book".to_string()));
        }
        Ok(())
    }

    pub fn borrow_state(&self) -> BorrowState {
        BorrowState {
            status: self.status,
            borrowed_by: self.borrowed_by,
            borrowed_at: self.borrowed_at,
            due_date: self.due_date,
        }
    }
}

/// A user's loan as shown on the user detail page
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanedBook {
    #[serde(flatten)]
    pub book: Book,
    pub is_overdue: bool,
}

/// Row of the borrowed/overdue listings
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBook {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: String,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub user: Option<UserRef>,
}

/// Flat row for the borrowed/overdue joins
#[derive(Debug, Clone, FromRow)]
pub struct BorrowedBookRow {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: String,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

impl From<BorrowedBookRow> for BorrowedBook {
    fn from(row: BorrowedBookRow) -> Self {
        let user = match (row.user_id, row.user_name, row.user_email) {
            (Some(id), Some(name), Some(email)) => Some(UserRef { id, name, email }),
            _ => None,
        };
        Self {
            id: row.id,
            title: row.title,
            author: row.author,
            isbn: row.isbn,
            category: row.category,
            borrowed_at: row.borrowed_at,
            due_date: row.due_date,
            user,
        }
    }
}

/// Book list query
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive match on title, author, ISBN, category or description
    pub search: Option<String>,
    /// Filter by status (Available, Borrowed, Reserved)
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl BookQuery {
    /// Parse the optional status filter; blank means no filter
    pub fn status_filter(&self) -> AppResult<Option<BookStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some).map_err(AppError::BadRequest),
        }
    }
}

/// Create book request
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub published_year: Option<i32>,
    pub publisher: Option<String>,
    pub pages: Option<i32>,
    pub rating: Option<f64>,
    pub status: Option<BookStatus>,
}

/// Validated, normalized book fields ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: String,
    pub description: Option<String>,
    pub published_year: Option<i32>,
    pub publisher: Option<String>,
    pub pages: Option<i32>,
    pub rating: Option<f64>,
    pub status: BookStatus,
}

const REQUIRED_FIELDS: &str = "Title, author, and category are required";

impl CreateBook {
    pub fn validate(self) -> AppResult<NewBook> {
        let (title, author, category) = match (
            non_blank(self.title),
            non_blank(self.author),
            non_blank(self.category),
        ) {
            (Some(t), Some(a), Some(c)) => (t, a, c),
            _ => return Err(AppError::Validation(REQUIRED_FIELDS.to_string())),
        };

        let status = match self.status.unwrap_or_default() {
            BookStatus::Borrowed => {
                return Err(AppError::Validation(
                    "A new book cannot start as Borrowed; borrow it once it exists".to_string(),
                ))
            }
            s => s,
        };

        Ok(NewBook {
            title,
            author,
            isbn: non_blank(self.isbn),
            category,
            description: non_blank(self.description),
            published_year: self.published_year,
            publisher: non_blank(self.publisher),
            pages: self.pages,
            rating: self.rating.map(clamp_rating),
            status,
        })
    }
}

/// Update book request. Absent fields keep their current value; an explicit
/// `null` clears an optional field.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    /// Book ID (when not given in the path)
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub isbn: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub published_year: Option<Option<i32>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub publisher: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub pages: Option<Option<i32>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<f64>)]
    pub rating: Option<Option<f64>>,
    pub status: Option<BookStatus>,
    pub borrowed_by: Option<Uuid>,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Descriptive fields after merging an update onto the stored book
#[derive(Debug, Clone, PartialEq)]
pub struct BookDetails {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: String,
    pub description: Option<String>,
    pub published_year: Option<i32>,
    pub publisher: Option<String>,
    pub pages: Option<i32>,
    pub rating: Option<f64>,
}

impl UpdateBook {
    /// Merge descriptive fields onto `current`, rejecting blank required fields
    pub fn merge_details(&self, current: &Book) -> AppResult<BookDetails> {
        let required = |value: &Option<String>, fallback: &str| -> AppResult<String> {
            match value {
                None => Ok(fallback.to_string()),
                Some(v) => non_blank(Some(v.clone()))
                    .ok_or_else(|| AppError::Validation(REQUIRED_FIELDS.to_string())),
            }
        };

        Ok(BookDetails {
            title: required(&self.title, &current.title)?,
            author: required(&self.author, &current.author)?,
            category: required(&self.category, &current.category)?,
            isbn: merge_text(&self.isbn, &current.isbn),
            description: merge_text(&self.description, &current.description),
            published_year: self.published_year.unwrap_or(current.published_year),
            publisher: merge_text(&self.publisher, &current.publisher),
            pages: self.pages.unwrap_or(current.pages),
            rating: self.rating.unwrap_or(current.rating).map(clamp_rating),
        })
    }

    fn touches_borrow_fields(&self) -> bool {
        self.borrowed_by.is_some() || self.borrowed_at.is_some() || self.due_date.is_some()
    }
}

/// The four columns that move together on borrow and return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowState {
    pub status: BookStatus,
    pub borrowed_by: Option<Uuid>,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

impl BorrowState {
    fn cleared(status: BookStatus) -> Self {
        Self {
            status,
            borrowed_by: None,
            borrowed_at: None,
            due_date: None,
        }
    }
}

/// Activity to record as a consequence of a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanEvent {
    Borrowed { user_id: Uuid },
    Returned { user_id: Option<Uuid> },
}

impl LoanEvent {
    pub fn into_activity(self, title: &str) -> NewActivity {
        match self {
            LoanEvent::Borrowed { user_id } => NewActivity::borrowed(title, user_id),
            LoanEvent::Returned { user_id } => NewActivity::returned(title, user_id),
        }
    }
}

/// Outcome of applying an update's status fields to a book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub next: BorrowState,
    pub events: Vec<LoanEvent>,
}

/// Decide the next borrow state and which loan events it produces.
///
/// Entering Borrowed needs a borrower and a due date (from the update or
/// already on the book). Leaving Borrowed clears every borrow column.
pub fn plan_transition(
    current: &BorrowState,
    update: &UpdateBook,
    now: DateTime<Utc>,
) -> AppResult<TransitionPlan> {
    let target = update.status.unwrap_or(current.status);
    let was_borrowed = current.status == BookStatus::Borrowed;

    if target != BookStatus::Borrowed {
        if update.touches_borrow_fields() {
            return Err(AppError::Validation(
                "Borrower and dates can only be set on a Borrowed book".to_string(),
            ));
        }
        let events = if was_borrowed {
            vec![LoanEvent::Returned {
                user_id: current.borrowed_by,
            }]
        } else {
            Vec::new()
        };
        return Ok(TransitionPlan {
            next: BorrowState::cleared(target),
            events,
        });
    }

    let borrowed_by = update
        .borrowed_by
        .or(current.borrowed_by)
        .ok_or_else(|| AppError::Validation("A borrower is required to borrow a book".to_string()))?;
    let due_date = update
        .due_date
        .or(current.due_date)
        .ok_or_else(|| AppError::Validation("A due date is required to borrow a book".to_string()))?;
    let borrowed_at = match update.borrowed_at {
        Some(at) => at,
        None if was_borrowed && current.borrowed_by == Some(borrowed_by) => {
            current.borrowed_at.unwrap_or(now)
        }
        None => now,
    };

    if due_date < borrowed_at {
        return Err(AppError::Validation(
            "Due date must not be before the borrow date".to_string(),
        ));
    }

    let mut events = Vec::new();
    if was_borrowed && current.borrowed_by != Some(borrowed_by) {
        // Handed straight to someone else
        events.push(LoanEvent::Returned {
            user_id: current.borrowed_by,
        });
        events.push(LoanEvent::Borrowed { user_id: borrowed_by });
    } else if !was_borrowed {
        events.push(LoanEvent::Borrowed { user_id: borrowed_by });
    }

    Ok(TransitionPlan {
        next: BorrowState {
            status: BookStatus::Borrowed,
            borrowed_by: Some(borrowed_by),
            borrowed_at: Some(borrowed_at),
            due_date: Some(due_date),
        },
        events,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn merge_text(update: &Option<Option<String>>, current: &Option<String>) -> Option<String> {
    match update {
        None => current.clone(),
        Some(v) => non_blank(v.clone()),
    }
}

fn clamp_rating(rating: f64) -> f64 {
    if rating.is_nan() {
        return 0.0;
    }
    rating.clamp(0.0, 5.0)
}
