//! Dashboard statistics and analytics payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::book::{Book, BookStatus};

/// Dashboard counters
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_books: i64,
    pub total_users: i64,
    pub borrowed_books: i64,
    pub overdue_books: i64,
    pub available_books: i64,
    pub reserved_books: i64,
    /// Most recently added books
    pub recent_books: Vec<Book>,
}

/// Chart selector for `/analytics`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsType {
    MostBorrowedBooks,
    BookStatusDistribution,
    ActivityOverTime,
}

impl std::str::FromStr for AnalyticsType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "most-borrowed-books" => Ok(AnalyticsType::MostBorrowedBooks),
            "book-status-distribution" => Ok(AnalyticsType::BookStatusDistribution),
            "activity-over-time" => Ok(AnalyticsType::ActivityOverTime),
            _ => Err("Invalid analytics type".to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AnalyticsQuery {
    /// most-borrowed-books, book-status-distribution or activity-over-time
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BorrowCount {
    pub title: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StatusCount {
    pub status: BookStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct DailyCount {
    /// Start of the UTC day
    pub date: DateTime<Utc>,
    pub count: i64,
}

/// One of the three chart series
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AnalyticsData {
    MostBorrowed(Vec<BorrowCount>),
    StatusDistribution(Vec<StatusCount>),
    ActivityOverTime(Vec<DailyCount>),
}
