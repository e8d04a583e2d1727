//! User (borrower) management service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::NewActivity,
        pagination::PageRequest,
        user::{CreateUser, UpdateUser, User, DEFAULT_ROLE, EMAIL_REGISTERED, EMAIL_TAKEN},
    },
    repository::Repository,
};

use super::delete_refused;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_users(&self, search: Option<&str>, page: PageRequest) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.list(search, page).await
    }

    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Register a user and log a `register` activity
    pub async fn create_user(&self, request: CreateUser) -> AppResult<User> {
        let request = request.normalized();
        request.validate()?;

        if self.repository.users.email_taken(&request.email, None).await? {
            return Err(AppError::BusinessRule(EMAIL_REGISTERED.to_string()));
        }

        let role = request.role.as_deref().unwrap_or(DEFAULT_ROLE);

        let mut tx = self.repository.begin().await?;
        let user = self
            .repository
            .users
            .insert(&mut tx, &request.name, &request.email, role)
            .await?;
        self.repository
            .activity
            .insert(&mut tx, &NewActivity::registered(&user.name, user.id))
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub async fn update_user(&self, id: Uuid, request: UpdateUser) -> AppResult<User> {
        let request = request.normalized();
        request.validate()?;

        self.repository.users.get_by_id(id).await?;

        if self.repository.users.email_taken(&request.email, Some(id)).await? {
            return Err(AppError::BusinessRule(EMAIL_TAKEN.to_string()));
        }

        self.repository
            .users
            .update(id, &request.name, &request.email, request.role.as_deref())
            .await
    }

    /// Delete a user who holds no borrowed books
    pub async fn delete_user(&self, id: Uuid) -> AppResult<User> {
        self.repository.users.get_by_id(id).await?;

        let loans = self.repository.users.count_loans(id).await?;
        ensure_no_loans(loans)?;

        let deleted = match self.repository.users.delete_without_loans(id).await? {
            Some(user) => user,
            None => {
                let still_exists = self.repository.users.exists(id).await?;
                return Err(delete_refused(still_exists, "User not found", LOANS_OUTSTANDING));
            }
        };

        tracing::info!(user_id = %id, "User deleted");
        Ok(deleted)
    }
}

const LOANS_OUTSTANDING: &str = "Cannot delete user with borrowed books";

fn ensure_no_loans(count: i64) -> AppResult<()> {
    if count > 0 {
        return Err(AppError::BusinessRule(LOANS_OUTSTANDING.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_with_loans_cannot_be_deleted() {
        assert!(ensure_no_loans(0).is_ok());
        match ensure_no_loans(2) {
            Err(AppError::BusinessRule(msg)) => assert_eq!(msg, LOANS_OUTSTANDING),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
