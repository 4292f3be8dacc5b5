//! User and token tables.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use super::MemoryStore;
use crate::domain::entities::{Caller, NewUser, User};
use crate::domain::repositories::{ApiToken, TokenRepository, UserRepository};
use crate::error::AppError;

fn user_not_found(id: i64) -> AppError {
    AppError::not_found("User not found", json!({ "user_id": id }))
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.inner.tables()?;

        if let Some(field) = tables.users.values().find_map(|u| {
            if u.username == new_user.username {
                Some("username")
            } else if u.email == new_user.email {
                Some("email")
            } else {
                None
            }
        }) {
            return Err(AppError::conflict(
                "Resource already exists",
                json!({ "field": field }),
            ));
        }

        let user = User {
            id: tables.next_id(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_admin: new_user.is_admin,
            penalty_points: 0,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.inner.tables()?.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .inner
            .tables()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.inner.tables()?.users.values().cloned().collect())
    }

    async fn set_admin(&self, id: i64, is_admin: bool) -> Result<User, AppError> {
        let mut tables = self.inner.tables()?;
        let user = tables.users.get_mut(&id).ok_or_else(|| user_not_found(id))?;
        user.is_admin = is_admin;
        Ok(user.clone())
    }

    async fn reset_penalties(&self, id: i64) -> Result<User, AppError> {
        let mut tables = self.inner.tables()?;
        let user = tables.users.get_mut(&id).ok_or_else(|| user_not_found(id))?;
        user.penalty_points = 0;
        Ok(user.clone())
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn find_caller(&self, token_hash: &str) -> Result<Option<Caller>, AppError> {
        let tables = self.inner.tables()?;
        Ok(tables
            .tokens
            .values()
            .find(|t| t.token_hash == token_hash && t.revoked_at.is_none())
            .and_then(|t| tables.users.get(&t.user_id))
            .map(User::as_caller))
    }

    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError> {
        let mut tables = self.inner.tables()?;
        if let Some(token) = tables
            .tokens
            .values_mut()
            .find(|t| t.token_hash == token_hash && t.revoked_at.is_none())
        {
            token.last_used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn create_token(
        &self,
        user_id: i64,
        name: &str,
        token_hash: &str,
    ) -> Result<ApiToken, AppError> {
        let mut tables = self.inner.tables()?;

        if !tables.users.contains_key(&user_id) {
            return Err(AppError::bad_request(
                "Referenced resource does not exist",
                json!({ "user_id": user_id }),
            ));
        }
        if tables.tokens.values().any(|t| t.token_hash == token_hash) {
            return Err(AppError::conflict(
                "Resource already exists",
                json!({ "field": "token_hash" }),
            ));
        }

        let token = ApiToken {
            id: tables.next_id(),
            user_id,
            name: name.to_string(),
            token_hash: token_hash.to_string(),
            created_at: Utc::now(),
            last_used_at: None,
            revoked_at: None,
        };
        tables.tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        Ok(self.inner.tables()?.tokens.values().rev().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ApiToken>, AppError> {
        Ok(self.inner.tables()?.tokens.get(&id).cloned())
    }

    async fn revoke_token(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.inner.tables()?;
        if let Some(token) = tables.tokens.get_mut(&id)
            && token.revoked_at.is_none()
        {
            token.revoked_at = Some(Utc::now());
        }
        Ok(())
    }
}
