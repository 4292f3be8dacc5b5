//! DTOs for borrow and return endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::domain::entities::{Borrow, ReturnReceipt};

/// Request to borrow a book. `book_id` may be a number or a numeric string.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct CreateBorrowRequest {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub book_id: i64,
}

/// Request to return a borrow. `borrow_id` may be a number or a numeric string.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub borrow_id: i64,
}

#[derive(Debug, Serialize)]
pub struct BorrowResponse {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub borrow_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl From<Borrow> for BorrowResponse {
    fn from(borrow: Borrow) -> Self {
        Self {
            id: borrow.id,
            user_id: borrow.user_id,
            book_id: borrow.book_id,
            borrow_date: borrow.borrow_date,
            due_date: borrow.due_date,
            return_date: borrow.return_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReturnResponse {
    pub message: String,
    pub borrow_id: i64,
    pub return_date: NaiveDate,
    pub days_late: i64,
}

impl From<ReturnReceipt> for ReturnResponse {
    fn from(receipt: ReturnReceipt) -> Self {
        Self {
            message: "Book returned successfully".to_string(),
            borrow_id: receipt.borrow_id,
            return_date: receipt.return_date,
            days_late: receipt.days_late,
        }
    }
}
