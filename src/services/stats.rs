//! Statistics service

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookStatus,
        stats::{AnalyticsData, AnalyticsType, DashboardStats, StatusCount},
    },
    repository::Repository,
};

const RECENT_BOOKS: i64 = 5;
const MOST_BORROWED: i64 = 10;

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Dashboard counters
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let stats = &self.repository.stats;

        let total_books = stats.count_books().await?;
        let total_users = stats.count_users().await?;
        let overdue_books = stats.count_overdue(Utc::now()).await?;
        let distribution = stats.status_distribution().await?;
        let recent_books = stats.recent_books(RECENT_BOOKS).await?;

        Ok(DashboardStats {
            total_books,
            total_users,
            borrowed_books: count_for(&distribution, BookStatus::Borrowed),
            overdue_books,
            available_books: count_for(&distribution, BookStatus::Available),
            reserved_books: count_for(&distribution, BookStatus::Reserved),
            recent_books,
        })
    }

    /// One chart series selected by `kind`
    pub async fn analytics(&self, kind: Option<&str>) -> AppResult<AnalyticsData> {
        let kind: AnalyticsType = kind
            .unwrap_or_default()
            .parse()
            .map_err(AppError::BadRequest)?;

        let stats = &self.repository.stats;
        Ok(match kind {
            AnalyticsType::MostBorrowedBooks => {
                AnalyticsData::MostBorrowed(stats.most_borrowed(MOST_BORROWED).await?)
            }
            AnalyticsType::BookStatusDistribution => {
                AnalyticsData::StatusDistribution(stats.status_distribution().await?)
            }
            AnalyticsType::ActivityOverTime => {
                AnalyticsData::ActivityOverTime(stats.activity_per_day().await?)
            }
        })
    }
}

fn count_for(distribution: &[StatusCount], status: BookStatus) -> i64 {
    distribution
        .iter()
        .filter(|entry| entry.status == status)
        .map(|entry| entry.count)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_for_missing_status_is_zero() {
        let distribution = vec![
            StatusCount {
                status: BookStatus::Available,
                count: 7,
            },
            StatusCount {
                status: BookStatus::Borrowed,
                count: 3,
            },
        ];
        assert_eq!(count_for(&distribution, BookStatus::Available), 7);
        assert_eq!(count_for(&distribution, BookStatus::Borrowed), 3);
        assert_eq!(count_for(&distribution, BookStatus::Reserved), 0);
    }
}
