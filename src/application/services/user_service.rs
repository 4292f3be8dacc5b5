//! User accounts: registration and the penalty query.

use std::sync::Arc;

use serde_json::json;

use crate::domain::entities::{Caller, NewUser, PenaltySummary, User};
use crate::domain::policy::{self, Access};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;
use crate::utils::password::hash_password;

/// Service for user accounts.
///
/// Input shape (lengths, email syntax) is checked by the request DTOs before
/// it reaches this service.
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    password_pepper: String,
}

impl UserService {
    /// Creates a new user service.
    ///
    /// `password_pepper` keys password hashes and must match the one given
    /// to [`super::AuthService`].
    pub fn new(repository: Arc<dyn UserRepository>, password_pepper: String) -> Self {
        Self {
            repository,
            password_pepper,
        }
    }

    /// Registers a regular user with zero penalty points.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the username or email is taken.
    /// Returns [`AppError::Internal`] on database or RNG errors.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        self.create_account(username, email, password, false).await
    }

    /// Creates an account with an explicit role. Used by the admin CLI.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`].
    pub async fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, AppError> {
        let password_hash = hash_password(&self.password_pepper, password)?;

        let user = self
            .repository
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                is_admin,
            })
            .await?;

        tracing::info!(user_id = user.id, is_admin, "User registered");
        Ok(user)
    }

    /// Reads a user's accumulated penalty points.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] unless the caller is the user or an
    /// admin. This is checked before the lookup.
    /// Returns [`AppError::NotFound`] if the user does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn get_penalties(
        &self,
        caller: &Caller,
        user_id: i64,
    ) -> Result<PenaltySummary, AppError> {
        policy::authorize(caller, Access::SelfOrAdmin { owner_id: user_id })?;

        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "user_id": user_id })))?;

        Ok(PenaltySummary {
            user_id: user.id,
            penalty_points: user.penalty_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockUserRepository;
    use crate::utils::password::verify_password;
    use chrono::Utc;

    const PEPPER: &str = "test-password-pepper";

    fn user(id: i64, penalty_points: i32) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: "salt$mac".to_string(),
            is_admin: false,
            penalty_points,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_create()
            .withf(|new_user| {
                new_user.username == "alice"
                    && !new_user.is_admin
                    && verify_password(PEPPER, "password123", &new_user.password_hash)
            })
            .times(1)
            .returning(|new_user| {
                Ok(User {
                    id: 1,
                    username: new_user.username,
                    email: new_user.email,
                    password_hash: new_user.password_hash,
                    is_admin: new_user.is_admin,
                    penalty_points: 0,
                    created_at: Utc::now(),
                })
            });

        let service = UserService::new(Arc::new(mock_repo), PEPPER.to_string());

        let created = service
            .register("alice", "alice@example.com", "password123")
            .await
            .unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.penalty_points, 0);
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_create()
            .returning(|_| Err(AppError::conflict("Already exists", json!({}))));

        let service = UserService::new(Arc::new(mock_repo), PEPPER.to_string());

        let result = service.register("alice", "a@example.com", "password123").await;
        assert!(matches!(result.unwrap_err(), AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_get_penalties_self() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_id()
            .withf(|id| *id == 4)
            .times(1)
            .returning(|id| Ok(Some(user(id, 6))));

        let service = UserService::new(Arc::new(mock_repo), PEPPER.to_string());

        let summary = service.get_penalties(&Caller::user(4), 4).await.unwrap();
        assert_eq!(
            summary,
            PenaltySummary {
                user_id: 4,
                penalty_points: 6
            }
        );
    }

    #[tokio::test]
    async fn test_get_penalties_other_user_is_forbidden_without_lookup() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_find_by_id().times(0);

        let service = UserService::new(Arc::new(mock_repo), PEPPER.to_string());

        let result = service.get_penalties(&Caller::user(4), 5).await;
        assert!(matches!(result.unwrap_err(), AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_get_penalties_admin_unknown_user() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_find_by_id().returning(|_| Ok(None));

        let service = UserService::new(Arc::new(mock_repo), PEPPER.to_string());

        let result = service.get_penalties(&Caller::admin(1), 999).await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound { .. }));
    }
}
