//! Borrow table and lending transactions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use super::{Inner, MemoryStore, RowGuard, RowKey, Tables};
use crate::domain::entities::{Book, Borrow, NewBorrow};
use crate::domain::repositories::{LendingRepository, LendingTransaction};
use crate::error::AppError;

#[async_trait]
impl LendingRepository for MemoryStore {
    async fn count_active(&self, user_id: i64) -> Result<i64, AppError> {
        Ok(self.inner.tables()?.count_active(user_id))
    }

    async fn list_active(&self, user_id: i64) -> Result<Vec<Borrow>, AppError> {
        let tables = self.inner.tables()?;
        let mut borrows: Vec<Borrow> = tables
            .borrows
            .values()
            .filter(|b| b.user_id == user_id && b.is_active())
            .cloned()
            .collect();
        borrows.sort_by_key(|b| (b.borrow_date, b.id));
        Ok(borrows)
    }

    async fn begin(&self) -> Result<Box<dyn LendingTransaction>, AppError> {
        Ok(Box::new(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            held: HashMap::new(),
            inserted: Vec::new(),
            copy_deltas: HashMap::new(),
            returned: HashMap::new(),
            penalties: HashMap::new(),
        }))
    }
}

/// Buffered unit of work over a [`MemoryStore`].
///
/// Counter changes are kept as deltas and added to the stored values on
/// commit, so a concurrent transaction touching the same counter without the
/// row lock (a return adding a copy back) never loses an update.
pub struct MemoryTransaction {
    inner: Arc<Inner>,
    held: HashMap<RowKey, RowGuard>,
    inserted: Vec<Borrow>,
    copy_deltas: HashMap<i64, i32>,
    returned: HashMap<i64, NaiveDate>,
    penalties: HashMap<i64, i32>,
}

impl MemoryTransaction {
    async fn lock(&mut self, key: RowKey) -> Result<(), AppError> {
        if !self.held.contains_key(&key) {
            let guard = self.inner.lock_row(key).await?;
            self.held.insert(key, guard);
        }
        Ok(())
    }

    fn available_after(&self, tables: &Tables, book_id: i64, delta: i32) -> Result<i32, AppError> {
        let book = tables.books.get(&book_id).ok_or_else(|| {
            AppError::bad_request(
                "Referenced resource does not exist",
                json!({ "book_id": book_id }),
            )
        })?;
        let available = book.available_copies + delta;
        if available < 0 || available > book.total_copies {
            return Err(AppError::internal(
                "Stock invariant violated",
                json!({ "book_id": book_id, "delta": delta }),
            ));
        }
        Ok(available)
    }

    fn validate(&self, tables: &Tables) -> Result<(), AppError> {
        for borrow in &self.inserted {
            if !tables.users.contains_key(&borrow.user_id)
                || !tables.books.contains_key(&borrow.book_id)
            {
                return Err(AppError::bad_request(
                    "Referenced resource does not exist",
                    json!({ "user_id": borrow.user_id, "book_id": borrow.book_id }),
                ));
            }
        }

        for (&book_id, &delta) in &self.copy_deltas {
            self.available_after(tables, book_id, delta)?;
        }

        for &borrow_id in self.returned.keys() {
            if !tables.borrows.get(&borrow_id).is_some_and(Borrow::is_active) {
                return Err(AppError::internal(
                    "Borrow already returned",
                    json!({ "borrow_id": borrow_id }),
                ));
            }
        }

        for (&user_id, &points) in &self.penalties {
            let user = tables.users.get(&user_id).ok_or_else(|| {
                AppError::bad_request(
                    "Referenced resource does not exist",
                    json!({ "user_id": user_id }),
                )
            })?;
            if user.penalty_points.checked_add(points).is_none() {
                return Err(AppError::internal(
                    "Penalty out of range",
                    json!({ "user_id": user_id }),
                ));
            }
        }

        Ok(())
    }

    fn apply(self, tables: &mut Tables) {
        for borrow in self.inserted {
            tables.borrows.insert(borrow.id, borrow);
        }
        for (book_id, delta) in self.copy_deltas {
            if let Some(book) = tables.books.get_mut(&book_id) {
                book.available_copies += delta;
            }
        }
        for (borrow_id, return_date) in self.returned {
            if let Some(borrow) = tables.borrows.get_mut(&borrow_id) {
                borrow.return_date = Some(return_date);
            }
        }
        for (user_id, points) in self.penalties {
            if let Some(user) = tables.users.get_mut(&user_id) {
                user.penalty_points += points;
            }
        }
        // Row guards in `self.held` drop here, after every write is visible.
    }
}

#[async_trait]
impl LendingTransaction for MemoryTransaction {
    async fn lock_user(&mut self, user_id: i64) -> Result<bool, AppError> {
        self.lock(RowKey::User(user_id)).await?;
        Ok(self.inner.tables()?.users.contains_key(&user_id))
    }

    async fn count_active(&mut self, user_id: i64) -> Result<i64, AppError> {
        let tables = self.inner.tables()?;
        let committed = tables.count_active(user_id);
        let returned_here = self
            .returned
            .keys()
            .filter(|id| tables.borrows.get(id).is_some_and(|b| b.user_id == user_id))
            .count();
        let inserted_here = self.inserted.iter().filter(|b| b.user_id == user_id).count();

        let delta = i64::try_from(inserted_here).unwrap_or(i64::MAX)
            - i64::try_from(returned_here).unwrap_or(i64::MAX);
        Ok(committed + delta)
    }

    async fn lock_book(&mut self, book_id: i64) -> Result<Option<Book>, AppError> {
        self.lock(RowKey::Book(book_id)).await?;

        let tables = self.inner.tables()?;
        let pending = self.copy_deltas.get(&book_id).copied().unwrap_or(0);
        Ok(tables.books.get(&book_id).map(|b| {
            let mut book = tables.joined_book(b);
            book.available_copies += pending;
            book
        }))
    }

    async fn insert_borrow(&mut self, new_borrow: NewBorrow) -> Result<Borrow, AppError> {
        let mut tables = self.inner.tables()?;
        if !tables.users.contains_key(&new_borrow.user_id)
            || !tables.books.contains_key(&new_borrow.book_id)
        {
            return Err(AppError::bad_request(
                "Referenced resource does not exist",
                json!({ "user_id": new_borrow.user_id, "book_id": new_borrow.book_id }),
            ));
        }

        let borrow = Borrow {
            id: tables.next_id(),
            user_id: new_borrow.user_id,
            book_id: new_borrow.book_id,
            borrow_date: new_borrow.borrow_date,
            due_date: new_borrow.due_date,
            return_date: None,
        };
        drop(tables);

        self.inserted.push(borrow.clone());
        Ok(borrow)
    }

    async fn adjust_available_copies(
        &mut self,
        book_id: i64,
        delta: i32,
    ) -> Result<(), AppError> {
        let combined = self.copy_deltas.get(&book_id).copied().unwrap_or(0) + delta;
        self.available_after(&*self.inner.tables()?, book_id, combined)?;
        self.copy_deltas.insert(book_id, combined);
        Ok(())
    }

    async fn lock_active_borrow(
        &mut self,
        borrow_id: i64,
        user_id: i64,
    ) -> Result<Option<Borrow>, AppError> {
        self.lock(RowKey::Borrow(borrow_id)).await?;

        if self.returned.contains_key(&borrow_id) {
            return Ok(None);
        }
        let tables = self.inner.tables()?;
        Ok(tables
            .borrows
            .get(&borrow_id)
            .filter(|b| b.user_id == user_id && b.is_active())
            .cloned())
    }

    async fn mark_returned(
        &mut self,
        borrow_id: i64,
        return_date: NaiveDate,
    ) -> Result<(), AppError> {
        let active = self
            .inner
            .tables()?
            .borrows
            .get(&borrow_id)
            .is_some_and(Borrow::is_active);

        if !active || self.returned.contains_key(&borrow_id) {
            return Err(AppError::internal(
                "Borrow already returned",
                json!({ "borrow_id": borrow_id }),
            ));
        }
        self.returned.insert(borrow_id, return_date);
        Ok(())
    }

    async fn add_penalty_points(&mut self, user_id: i64, points: i32) -> Result<(), AppError> {
        let entry = self.penalties.entry(user_id).or_insert(0);
        *entry = entry.checked_add(points).ok_or_else(|| {
            AppError::internal("Penalty out of range", json!({ "user_id": user_id }))
        })?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let inner = Arc::clone(&self.inner);
        let mut tables = inner.tables()?;
        self.validate(&tables)?;
        self.apply(&mut tables);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{NewAuthor, NewBook, NewCategory, NewUser, Stock};
    use crate::domain::repositories::{
        AuthorRepository, BookRepository, CategoryRepository, UserRepository,
    };
    use chrono::Utc;

    async fn seed(store: &MemoryStore, copies: i32) -> (i64, i64) {
        let user = UserRepository::create(
            store,
            NewUser {
                username: "reader".to_string(),
                email: "reader@example.com".to_string(),
                password_hash: "salt$mac".to_string(),
                is_admin: false,
            },
        )
        .await
        .unwrap();
        let author = AuthorRepository::create(
            store,
            NewAuthor {
                name: "Iain M. Banks".to_string(),
                bio: String::new(),
            },
        )
        .await
        .unwrap();
        let category = CategoryRepository::create(
            store,
            NewCategory {
                name: "Sci-Fi".to_string(),
            },
        )
        .await
        .unwrap();
        let book = BookRepository::create(
            store,
            NewBook {
                title: "Excession".to_string(),
                description: String::new(),
                author_id: author.id,
                category_id: category.id,
                stock: Stock::new(copies, copies).unwrap(),
            },
        )
        .await
        .unwrap();
        (user.id, book.id)
    }

    fn new_borrow(user_id: i64, book_id: i64) -> NewBorrow {
        NewBorrow {
            user_id,
            book_id,
            borrow_date: Utc::now(),
            due_date: Utc::now().date_naive(),
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_no_trace() {
        let store = MemoryStore::new();
        let (user_id, book_id) = seed(&store, 2).await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.lock_book(book_id).await.unwrap();
            tx.insert_borrow(new_borrow(user_id, book_id)).await.unwrap();
            tx.adjust_available_copies(book_id, -1).await.unwrap();
        }

        assert_eq!(LendingRepository::count_active(&store, user_id).await.unwrap(), 0);
        let book = BookRepository::find_by_id(&store, book_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(book.available_copies, 2);
    }

    #[tokio::test]
    async fn test_writes_visible_inside_and_after_commit() {
        let store = MemoryStore::new();
        let (user_id, book_id) = seed(&store, 1).await;

        let mut tx = store.begin().await.unwrap();
        tx.lock_book(book_id).await.unwrap();
        tx.insert_borrow(new_borrow(user_id, book_id)).await.unwrap();
        tx.adjust_available_copies(book_id, -1).await.unwrap();

        assert_eq!(tx.count_active(user_id).await.unwrap(), 1);
        let seen = tx.lock_book(book_id).await.unwrap().unwrap();
        assert_eq!(seen.available_copies, 0);

        tx.commit().await.unwrap();

        assert_eq!(LendingRepository::count_active(&store, user_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_adjust_rejects_out_of_range() {
        let store = MemoryStore::new();
        let (_, book_id) = seed(&store, 1).await;

        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.adjust_available_copies(book_id, 1).await.unwrap_err(),
            AppError::Internal { .. }
        ));
        tx.adjust_available_copies(book_id, -1).await.unwrap();
        assert!(matches!(
            tx.adjust_available_copies(book_id, -1).await.unwrap_err(),
            AppError::Internal { .. }
        ));
    }

    #[tokio::test]
    async fn test_book_lock_blocks_second_transaction_until_commit() {
        let store = MemoryStore::new();
        let (_, book_id) = seed(&store, 1).await;

        let mut first = store.begin().await.unwrap();
        first.lock_book(book_id).await.unwrap();

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut second = store.begin().await.unwrap();
                let book = second.lock_book(book_id).await.unwrap().unwrap();
                book.available_copies
            })
        };

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        first.adjust_available_copies(book_id, -1).await.unwrap();
        first.commit().await.unwrap();

        assert_eq!(contender.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_row_locks_released_after_commit_and_drop() {
        let store = MemoryStore::new();
        let (user_id, book_id) = seed(&store, 2).await;

        let mut tx = store.begin().await.unwrap();
        tx.lock_user(user_id).await.unwrap();
        tx.lock_book(book_id).await.unwrap();
        let borrow = tx.insert_borrow(new_borrow(user_id, book_id)).await.unwrap();
        tx.adjust_available_copies(book_id, -1).await.unwrap();
        assert_eq!(store.inner.row_locks.lock().unwrap().len(), 2);
        tx.commit().await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.lock_active_borrow(borrow.id, user_id).await.unwrap().unwrap();
        }

        assert!(store.inner.row_locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_row_lock_kept_while_contended() {
        let store = MemoryStore::new();
        let (_, book_id) = seed(&store, 1).await;

        let mut first = store.begin().await.unwrap();
        first.lock_book(book_id).await.unwrap();

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut second = store.begin().await.unwrap();
                second.lock_book(book_id).await.unwrap().is_some()
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        drop(first);
        assert!(contender.await.unwrap());
        assert!(store.inner.row_locks.lock().unwrap().is_empty());
    }
}
