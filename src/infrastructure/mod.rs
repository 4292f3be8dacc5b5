//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete storage backends selected at startup by `STORAGE_BACKEND`.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`memory`] - In-process store with row-level locking, used for local
//!   runs and tests

pub mod memory;
pub mod persistence;
