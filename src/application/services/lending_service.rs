//! Borrow transaction engine.
//!
//! Owns the three lending operations and their invariants:
//!
//! - a user holds at most [`MAX_ACTIVE_BORROWS`] active borrows,
//! - `0 <= available_copies <= total_copies` for every book,
//! - a borrow is returned at most once, accruing one penalty point per day late.
//!
//! The default borrow flow counts active borrows before opening the
//! transaction that locks the book, so two concurrent requests from the same
//! user can both pass the limit check. `strict_borrow_limit` closes that
//! window by locking the user row and re-counting inside the transaction.

use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use serde_json::json;

use crate::domain::entities::{Borrow, Caller, NewBorrow, ReturnReceipt};
use crate::domain::policy::{self, Access, MAX_ACTIVE_BORROWS};
use crate::domain::repositories::{LendingRepository, LendingTransaction};
use crate::error::AppError;

/// Service for borrowing and returning books.
pub struct LendingService {
    repository: Arc<dyn LendingRepository>,
    clock: Arc<dyn Clock + Send + Sync>,
    strict_borrow_limit: bool,
}

impl LendingService {
    /// Creates a new lending service.
    ///
    /// # Arguments
    ///
    /// - `repository` - lending storage
    /// - `clock` - source of "now" for borrow, due and return dates
    /// - `strict_borrow_limit` - re-check the limit inside the locked transaction
    pub fn new(
        repository: Arc<dyn LendingRepository>,
        clock: Arc<dyn Clock + Send + Sync>,
        strict_borrow_limit: bool,
    ) -> Self {
        Self {
            repository,
            clock,
            strict_borrow_limit,
        }
    }

    /// Borrows one copy of `book_id` for the caller.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BorrowLimitExceeded`] if the caller already holds
    /// [`MAX_ACTIVE_BORROWS`] active borrows.
    /// Returns [`AppError::NotFound`] if the book does not exist.
    /// Returns [`AppError::NoCopiesAvailable`] if every copy is on loan.
    /// Returns [`AppError::Internal`] on storage errors.
    ///
    /// No state changes on any error.
    pub async fn create_borrow(&self, caller: &Caller, book_id: i64) -> Result<Borrow, AppError> {
        policy::authorize(caller, Access::Authenticated)?;

        let active = self.repository.count_active(caller.user_id).await?;
        if active >= MAX_ACTIVE_BORROWS {
            return Err(self.reject_limit(caller.user_id, active));
        }

        let mut tx = self.repository.begin().await?;

        if self.strict_borrow_limit {
            if !tx.lock_user(caller.user_id).await? {
                return Err(AppError::not_found(
                    "User not found",
                    json!({ "user_id": caller.user_id }),
                ));
            }
            let active = tx.count_active(caller.user_id).await?;
            if active >= MAX_ACTIVE_BORROWS {
                return Err(self.reject_limit(caller.user_id, active));
            }
        }

        let book = tx
            .lock_book(book_id)
            .await?
            .ok_or_else(|| AppError::not_found("Book not found", json!({ "book_id": book_id })))?;

        if !book.has_available_copy() {
            metrics::counter!("lending_borrows_rejected_total", "reason" => "no_copies")
                .increment(1);
            tracing::info!(user_id = caller.user_id, book_id, "Borrow rejected: no copies available");
            return Err(AppError::no_copies_available(
                "No copies available",
                json!({ "book_id": book_id }),
            ));
        }

        let now = self.clock.utc();
        let due_date = policy::due_date_for(now.date_naive()).ok_or_else(|| {
            AppError::internal("Due date out of range", json!({ "borrow_date": now }))
        })?;

        let borrow = tx
            .insert_borrow(NewBorrow {
                user_id: caller.user_id,
                book_id,
                borrow_date: now,
                due_date,
            })
            .await?;
        tx.adjust_available_copies(book_id, -1).await?;
        tx.commit().await?;

        metrics::counter!("lending_borrows_created_total").increment(1);
        tracing::info!(
            borrow_id = borrow.id,
            user_id = caller.user_id,
            book_id,
            %due_date,
            "Borrow created"
        );

        Ok(borrow)
    }

    /// Lists the caller's active borrows.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn list_active_borrows(&self, caller: &Caller) -> Result<Vec<Borrow>, AppError> {
        policy::authorize(caller, Access::Authenticated)?;
        self.repository.list_active(caller.user_id).await
    }

    /// Returns an active borrow owned by the caller.
    ///
    /// Copies go back to the shelf and late days become penalty points, all
    /// in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the borrow does not exist, belongs to
    /// someone else, or was already returned. The three cases are
    /// indistinguishable to the caller.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn return_borrow(
        &self,
        caller: &Caller,
        borrow_id: i64,
    ) -> Result<ReturnReceipt, AppError> {
        policy::authorize(caller, Access::Authenticated)?;

        let mut tx = self.repository.begin().await?;

        let borrow = tx
            .lock_active_borrow(borrow_id, caller.user_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Borrow record not found", json!({ "borrow_id": borrow_id }))
            })?;

        let return_date = self.today();
        let days_late = borrow.days_late(return_date);

        tx.mark_returned(borrow.id, return_date).await?;

        // User row before book row, the same order a strict borrow takes.
        if days_late > 0 {
            let points = i32::try_from(days_late).map_err(|_| {
                AppError::internal("Penalty out of range", json!({ "days_late": days_late }))
            })?;
            tx.add_penalty_points(caller.user_id, points).await?;
        }

        tx.adjust_available_copies(borrow.book_id, 1).await?;

        tx.commit().await?;

        metrics::counter!("lending_returns_total").increment(1);
        if days_late > 0 {
            metrics::counter!("lending_penalty_points_total").increment(days_late.unsigned_abs());
            tracing::info!(
                borrow_id,
                user_id = caller.user_id,
                days_late,
                "Late return, penalty applied"
            );
        } else {
            tracing::info!(borrow_id, user_id = caller.user_id, "Borrow returned");
        }

        Ok(ReturnReceipt {
            borrow_id: borrow.id,
            book_id: borrow.book_id,
            return_date,
            days_late,
        })
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    fn reject_limit(&self, user_id: i64, active: i64) -> AppError {
        metrics::counter!("lending_borrows_rejected_total", "reason" => "limit").increment(1);
        tracing::info!(user_id, active, "Borrow rejected: limit reached");
        AppError::borrow_limit_exceeded(
            "Borrowing limit reached",
            json!({ "active_borrows": active, "limit": MAX_ACTIVE_BORROWS }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Book;
    use crate::domain::repositories::MockLendingRepository;
    use chrono::{DateTime, Local, TimeZone, Utc};
    use std::sync::Mutex;

    /// Records the order of calls made against the transaction.
    struct RecordingTransaction {
        calls: Arc<Mutex<Vec<&'static str>>>,
        borrow: Borrow,
    }

    impl RecordingTransaction {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait::async_trait]
    impl LendingTransaction for RecordingTransaction {
        async fn lock_user(&mut self, _user_id: i64) -> Result<bool, AppError> {
            self.record("lock_user");
            Ok(true)
        }

        async fn count_active(&mut self, _user_id: i64) -> Result<i64, AppError> {
            self.record("count_active");
            Ok(0)
        }

        async fn lock_book(&mut self, _book_id: i64) -> Result<Option<Book>, AppError> {
            self.record("lock_book");
            Ok(None)
        }

        async fn insert_borrow(&mut self, _new_borrow: NewBorrow) -> Result<Borrow, AppError> {
            self.record("insert_borrow");
            Ok(self.borrow.clone())
        }

        async fn adjust_available_copies(
            &mut self,
            _book_id: i64,
            _delta: i32,
        ) -> Result<(), AppError> {
            self.record("adjust_available_copies");
            Ok(())
        }

        async fn lock_active_borrow(
            &mut self,
            _borrow_id: i64,
            _user_id: i64,
        ) -> Result<Option<Borrow>, AppError> {
            self.record("lock_active_borrow");
            Ok(Some(self.borrow.clone()))
        }

        async fn mark_returned(
            &mut self,
            _borrow_id: i64,
            _return_date: NaiveDate,
        ) -> Result<(), AppError> {
            self.record("mark_returned");
            Ok(())
        }

        async fn add_penalty_points(&mut self, _user_id: i64, _points: i32) -> Result<(), AppError> {
            self.record("add_penalty_points");
            Ok(())
        }

        async fn commit(self: Box<Self>) -> Result<(), AppError> {
            self.record("commit");
            Ok(())
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn fixed_clock() -> Arc<dyn Clock + Send + Sync> {
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_limit_reached_opens_no_transaction() {
        let mut mock_repo = MockLendingRepository::new();

        mock_repo
            .expect_count_active()
            .withf(|user_id| *user_id == 1)
            .times(1)
            .returning(|_| Ok(3));
        mock_repo.expect_begin().times(0);

        let service = LendingService::new(Arc::new(mock_repo), fixed_clock(), false);

        let result = service.create_borrow(&Caller::user(1), 10).await;

        assert!(matches!(
            result.unwrap_err(),
            AppError::BorrowLimitExceeded { .. }
        ));
    }

    #[tokio::test]
    async fn test_limit_check_errors_propagate() {
        let mut mock_repo = MockLendingRepository::new();

        mock_repo
            .expect_count_active()
            .times(1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));
        mock_repo.expect_begin().times(0);

        let service = LendingService::new(Arc::new(mock_repo), fixed_clock(), false);

        let result = service.create_borrow(&Caller::user(1), 10).await;

        assert!(matches!(result.unwrap_err(), AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_list_active_borrows_is_scoped_to_caller() {
        let mut mock_repo = MockLendingRepository::new();

        mock_repo
            .expect_list_active()
            .withf(|user_id| *user_id == 42)
            .times(1)
            .returning(|_| Ok(vec![]));

        let service = LendingService::new(Arc::new(mock_repo), fixed_clock(), false);

        let borrows = service.list_active_borrows(&Caller::user(42)).await.unwrap();
        assert!(borrows.is_empty());
    }

    #[tokio::test]
    async fn test_late_return_touches_user_row_before_book_row() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let borrow = Borrow {
            id: 5,
            user_id: 1,
            book_id: 10,
            borrow_date: Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
            return_date: None,
        };

        let mut mock_repo = MockLendingRepository::new();
        let recorded = Arc::clone(&calls);
        mock_repo.expect_begin().times(1).returning(move || {
            let tx: Box<dyn LendingTransaction> = Box::new(RecordingTransaction {
                calls: Arc::clone(&recorded),
                borrow: borrow.clone(),
            });
            Ok(tx)
        });

        let service = LendingService::new(Arc::new(mock_repo), fixed_clock(), true);

        let receipt = service.return_borrow(&Caller::user(1), 5).await.unwrap();

        assert_eq!(receipt.days_late, 16);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "lock_active_borrow",
                "mark_returned",
                "add_penalty_points",
                "adjust_available_copies",
                "commit",
            ]
        );
    }

    #[tokio::test]
    async fn test_begin_failure_surfaces_on_return() {
        let mut mock_repo = MockLendingRepository::new();

        mock_repo
            .expect_begin()
            .times(1)
            .returning(|| Err(AppError::internal("Database error", json!({}))));

        let service = LendingService::new(Arc::new(mock_repo), fixed_clock(), false);

        let result = service.return_borrow(&Caller::user(1), 5).await;
        assert!(matches!(result.unwrap_err(), AppError::Internal { .. }));
    }
}
