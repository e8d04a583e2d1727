//! Global search across books and users

use crate::{
    error::{AppError, AppResult},
    models::{book::Book, user::User},
    repository::Repository,
};

#[derive(Clone)]
pub struct SearchService {
    repository: Repository,
}

impl SearchService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Up to `limit` books and `limit` users matching `query`
    pub async fn search(&self, query: Option<&str>, limit: i64) -> AppResult<(Vec<Book>, Vec<User>)> {
        let term = require_term(query)?;

        let books = self.repository.books.search(term, limit).await?;
        let users = self.repository.users.search(term, limit).await?;
        Ok((books, users))
    }
}

fn require_term(query: Option<&str>) -> AppResult<&str> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search query is required".to_string()))
}
