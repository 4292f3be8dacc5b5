//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON serialization/deserialization and validator
//! for input validation. Conversions to and from domain types live next to
//! the DTOs.

pub mod author;
pub mod book;
pub mod borrow;
pub mod category;
pub mod health;
pub mod user;
