//! In-process storage backend.
//!
//! [`MemoryStore`] implements every repository trait over plain maps guarded
//! by one `std::sync::Mutex`. Lending transactions additionally take one
//! `tokio::sync::Mutex` per row (the in-process analogue of
//! `SELECT ... FOR UPDATE`), buffer their writes, and apply them under the
//! table mutex on commit. Dropping a transaction discards its writes and
//! releases its row locks.
//!
//! The table mutex is never held across an `.await`.

mod catalog;
mod lending;
mod users;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::OwnedMutexGuard;

use crate::domain::entities::{Author, Book, Borrow, Category, User};
use crate::domain::repositories::{ApiToken, StorageHealth};
use crate::error::AppError;

pub use lending::MemoryTransaction;

/// Identity of a lockable row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RowKey {
    User(i64),
    Book(i64),
    Borrow(i64),
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    tokens: BTreeMap<i64, ApiToken>,
    authors: BTreeMap<i64, Author>,
    categories: BTreeMap<i64, Category>,
    books: BTreeMap<i64, Book>,
    borrows: BTreeMap<i64, Borrow>,
    last_id: i64,
}

impl Tables {
    /// Allocates an ID. IDs are unique across tables and never reused, even
    /// when the transaction that took one rolls back.
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    /// Returns the book with author and category names filled in.
    fn joined_book(&self, book: &Book) -> Book {
        Book {
            author_name: self.authors.get(&book.author_id).map(|a| a.name.clone()),
            category_name: self
                .categories
                .get(&book.category_id)
                .map(|c| c.name.clone()),
            ..book.clone()
        }
    }

    fn count_active(&self, user_id: i64) -> i64 {
        let count = self
            .borrows
            .values()
            .filter(|b| b.user_id == user_id && b.is_active())
            .count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }

    fn remove_books_where(&mut self, predicate: impl Fn(&Book) -> bool) {
        let doomed: Vec<i64> = self
            .books
            .values()
            .filter(|b| predicate(b))
            .map(|b| b.id)
            .collect();
        for book_id in doomed {
            self.remove_book(book_id);
        }
    }

    fn remove_book(&mut self, book_id: i64) -> bool {
        let removed = self.books.remove(&book_id).is_some();
        if removed {
            self.borrows.retain(|_, b| b.book_id != book_id);
        }
        removed
    }
}

struct Inner {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<RowKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl Inner {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::internal("Storage lock poisoned", json!({})))
    }

    /// Waits for the exclusive lock on `key`.
    async fn lock_row(self: &Arc<Self>, key: RowKey) -> Result<RowGuard, AppError> {
        let row_lock = {
            let mut locks = self
                .row_locks
                .lock()
                .map_err(|_| AppError::internal("Storage lock poisoned", json!({})))?;
            Arc::clone(locks.entry(key).or_default())
        };
        Ok(RowGuard {
            key,
            guard: Some(row_lock.lock_owned().await),
            inner: Arc::clone(self),
        })
    }
}

/// Exclusive hold on one row.
///
/// Releasing the last holder or waiter of a row removes its entry from
/// `row_locks`.
struct RowGuard {
    key: RowKey,
    guard: Option<OwnedMutexGuard<()>>,
    inner: Arc<Inner>,
}

impl Drop for RowGuard {
    fn drop(&mut self) {
        let Ok(mut locks) = self.inner.row_locks.lock() else {
            return;
        };
        // Waiters clone the entry under this mutex, so the count is stable here.
        self.guard.take();
        if locks
            .get(&self.key)
            .is_some_and(|row_lock| Arc::strong_count(row_lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

/// Thread-safe in-process store. Clones share the same data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(Tables::default()),
                row_locks: Mutex::new(HashMap::new()),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageHealth for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.inner.tables().map(|_| ())
    }
}
