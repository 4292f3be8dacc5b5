//! Core domain entities representing the library data model.
//!
//! Entities are plain data structures. The only behaviour they carry is the
//! invariant checking that has to hold at every mutation site (see
//! [`book::Stock`]).
//!
//! # Entity Types
//!
//! - [`User`] - A patron or administrator, with penalty points
//! - [`Book`] - A title with total and available copies
//! - [`Author`], [`Category`] - Reference entities for books
//! - [`Borrow`] - One loan of one copy
//!
//! # Design Pattern
//!
//! Separate structs describe creation (`NewUser`, `NewBook`, ...) and partial
//! updates (`BookPatch`, `AuthorPatch`).

pub mod author;
pub mod book;
pub mod borrow;
pub mod category;
pub mod user;

pub use author::{Author, AuthorPatch, NewAuthor};
pub use book::{Book, BookFilter, BookPatch, NewBook, Stock};
pub use borrow::{Borrow, NewBorrow, ReturnReceipt};
pub use category::{Category, NewCategory};
pub use user::{Caller, NewUser, PenaltySummary, User};
