//! Activity log service

use crate::{
    error::AppResult,
    models::{activity::Activity, pagination::PageRequest},
    repository::Repository,
};

#[derive(Clone)]
pub struct ActivityService {
    repository: Repository,
}

impl ActivityService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_activities(&self, page: PageRequest) -> AppResult<(Vec<Activity>, i64)> {
        self.repository.activity.list(page).await
    }
}
