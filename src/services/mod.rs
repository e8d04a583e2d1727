//! Business logic services

pub mod activity;
pub mod books;
pub mod search;
pub mod stats;
pub mod users;

use crate::{error::AppError, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub users: users::UsersService,
    pub activity: activity::ActivityService,
    pub search: search::SearchService,
    pub stats: stats::StatsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        Self {
            books: books::BooksService::new(repository.clone()),
            users: users::UsersService::new(repository.clone()),
            activity: activity::ActivityService::new(repository.clone()),
            search: search::SearchService::new(repository.clone()),
            stats: stats::StatsService::new(repository.clone()),
            repository,
        }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.repository.ping().await
    }
}

/// Error for a conditional delete that removed nothing: either the row is
/// gone or it still fails the guard
pub(crate) fn delete_refused(still_exists: bool, not_found: &str, refused: &str) -> AppError {
    if still_exists {
        AppError::BusinessRule(refused.to_string())
    } else {
        AppError::NotFound(not_found.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_refused_distinguishes_vanished_rows() {
        match delete_refused(false, "Book not found", "Cannot delete a borrowed book") {
            AppError::NotFound(msg) => assert_eq!(msg, "Book not found"),
            other => panic!("unexpected error: {:?}", other),
        }
        match delete_refused(true, "User not found", "Cannot delete user with borrowed books") {
            AppError::BusinessRule(msg) => assert_eq!(msg, "Cannot delete user with borrowed books"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
