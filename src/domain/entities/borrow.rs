//! Borrow entity: one loan of one copy of a book.

use chrono::{DateTime, NaiveDate, Utc};

/// A loan record.
///
/// `return_date == None` means the loan is active. The record transitions
/// to returned exactly once and is never deleted in normal flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Borrow {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub borrow_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl Borrow {
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    /// Whole days between the due date and `returned_on`, floored at zero.
    pub fn days_late(&self, returned_on: NaiveDate) -> i64 {
        (returned_on - self.due_date).num_days().max(0)
    }
}

/// Input data for opening a loan inside a lending transaction.
#[derive(Debug, Clone)]
pub struct NewBorrow {
    pub user_id: i64,
    pub book_id: i64,
    pub borrow_date: DateTime<Utc>,
    pub due_date: NaiveDate,
}

/// Outcome of a successful return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnReceipt {
    pub borrow_id: i64,
    pub book_id: i64,
    pub return_date: NaiveDate,
    pub days_late: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn borrow_due(due_date: NaiveDate) -> Borrow {
        Borrow {
            id: 1,
            user_id: 1,
            book_id: 1,
            borrow_date: Utc::now(),
            due_date,
            return_date: None,
        }
    }

    #[test]
    fn test_days_late_on_due_date_is_zero() {
        let due = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(borrow_due(due).days_late(due), 0);
    }

    #[test]
    fn test_days_late_early_return_is_zero() {
        let due = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let early = due.checked_sub_days(Days::new(3)).unwrap();
        assert_eq!(borrow_due(due).days_late(early), 0);
    }

    #[test]
    fn test_days_late_counts_days_past_due() {
        let due = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let late = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        // 2024 is a leap year: Feb 28, Feb 29, Mar 1, Mar 2, Mar 3
        assert_eq!(borrow_due(due).days_late(late), 5);
    }

    #[test]
    fn test_is_active() {
        let due = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let mut borrow = borrow_due(due);
        assert!(borrow.is_active());

        borrow.return_date = Some(due);
        assert!(!borrow.is_active());
    }
}
