//! Domain layer containing business entities, rules and storage contracts.
//!
//! The domain layer has no dependency on infrastructure or HTTP. Services in
//! [`crate::application::services`] orchestrate it.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`policy`] - Loan constants and the access predicate
//! - [`repositories`] - Data access trait definitions, including the
//!   row-lock-scoped [`repositories::LendingTransaction`]
//!
//! # Borrow Flow
//!
//! 1. The active-borrow count is checked outside any lock
//! 2. A [`repositories::LendingTransaction`] locks the book row
//! 3. Availability is checked, the borrow inserted and the copy count
//!    decremented with a relative update
//! 4. The transaction commits, or rolls back when dropped

pub mod entities;
pub mod policy;
pub mod repositories;
