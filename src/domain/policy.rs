//! Lending rules and the access predicate.
//!
//! Everything here is pure: no storage, no transport. Services evaluate
//! [`authorize`] before touching a repository.

use chrono::{Days, NaiveDate};
use serde_json::json;

use crate::domain::entities::Caller;
use crate::error::AppError;

/// Length of a loan, from borrow date to due date.
pub const LOAN_PERIOD_DAYS: u64 = 14;

/// Maximum number of simultaneously active borrows per user.
pub const MAX_ACTIVE_BORROWS: i64 = 3;

/// Due date for a loan opened on `borrowed_on`.
pub fn due_date_for(borrowed_on: NaiveDate) -> Option<NaiveDate> {
    borrowed_on.checked_add_days(Days::new(LOAN_PERIOD_DAYS))
}

/// What a caller needs to be allowed to perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any authenticated caller.
    Authenticated,
    /// Administrators only.
    Admin,
    /// The user owning the resource, or an administrator.
    SelfOrAdmin { owner_id: i64 },
}

/// Pure predicate: may `caller` perform an operation guarded by `access`?
pub fn is_allowed(caller: &Caller, access: Access) -> bool {
    match access {
        Access::Authenticated => true,
        Access::Admin => caller.is_admin,
        Access::SelfOrAdmin { owner_id } => caller.is_admin || caller.user_id == owner_id,
    }
}

/// Fails with [`AppError::Forbidden`] when [`is_allowed`] says no.
pub fn authorize(caller: &Caller, access: Access) -> Result<(), AppError> {
    if is_allowed(caller, access) {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "Forbidden",
            json!({ "required": required_role(access) }),
        ))
    }
}

fn required_role(access: Access) -> &'static str {
    match access {
        Access::Authenticated => "authenticated",
        Access::Admin => "admin",
        Access::SelfOrAdmin { .. } => "owner_or_admin",
    }
}
