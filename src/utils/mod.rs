//! Utility functions shared across layers.
//!
//! - [`token_generator`] - Random bearer tokens and salts
//! - [`password`] - Salted, keyed password hashing

pub mod password;
pub mod token_generator;
