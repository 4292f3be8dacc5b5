//! User entity and the authenticated caller identity.

use chrono::{DateTime, Utc};

/// A registered library patron (or administrator).
///
/// `penalty_points` only grows through late returns; the admin CLI is the
/// single place that can reset it.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub penalty_points: i32,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Identity of this user as seen by the access policy.
    pub fn as_caller(&self) -> Caller {
        Caller {
            user_id: self.id,
            is_admin: self.is_admin,
        }
    }
}

/// Input data for registering a user.
///
/// The password must already be hashed; see [`crate::utils::password`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// The authenticated principal behind a request.
///
/// Produced by the bearer-token middleware and passed into every service
/// operation so that authorization happens before any storage access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub is_admin: bool,
}

impl Caller {
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: i64) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }
}

/// Current penalty balance for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltySummary {
    pub user_id: i64,
    pub penalty_points: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_caller_keeps_role() {
        let user = User {
            id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "salt$hash".to_string(),
            is_admin: true,
            penalty_points: 0,
            created_at: Utc::now(),
        };

        assert_eq!(user.as_caller(), Caller::admin(7));
    }

    #[test]
    fn test_caller_constructors() {
        assert!(!Caller::user(1).is_admin);
        assert!(Caller::admin(1).is_admin);
    }
}
