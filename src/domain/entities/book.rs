//! Book entity and its stock invariant.

use serde_json::json;

use crate::error::AppError;

/// A catalog title with a fixed number of physical copies.
///
/// `author_name` and `category_name` are filled by reads that join the
/// reference tables and are `None` on freshly written rows.
#[derive(Debug, Clone)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub author_id: i64,
    pub author_name: Option<String>,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
}

impl Book {
    /// Copies currently out on loan.
    pub fn copies_on_loan(&self) -> i32 {
        self.total_copies - self.available_copies
    }

    pub fn has_available_copy(&self) -> bool {
        self.available_copies > 0
    }
}

/// Validated stock levels: `0 <= available <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stock {
    total: i32,
    available: i32,
}

impl Stock {
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when either count is negative or
    /// `available > total`.
    pub fn new(total: i32, available: i32) -> Result<Self, AppError> {
        if total < 0 {
            return Err(AppError::bad_request(
                "total_copies must not be negative",
                json!({ "total_copies": total }),
            ));
        }
        if available < 0 || available > total {
            return Err(AppError::bad_request(
                "available_copies must be between 0 and total_copies",
                json!({ "total_copies": total, "available_copies": available }),
            ));
        }
        Ok(Self { total, available })
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    pub fn available(&self) -> i32 {
        self.available
    }

    /// Applies a relative change to the available count.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when the change would break the
    /// invariant. Borrow and return always pair up, so hitting this means
    /// the store is inconsistent rather than that the caller did something
    /// wrong.
    pub fn shift_available(self, delta: i32) -> Result<Self, AppError> {
        let available = self.available + delta;
        if available < 0 || available > self.total {
            return Err(AppError::internal(
                "Stock invariant violated",
                json!({
                    "total_copies": self.total,
                    "available_copies": self.available,
                    "delta": delta
                }),
            ));
        }
        Ok(Self {
            total: self.total,
            available,
        })
    }

    /// Changes the total and moves `available` by the same amount, so copies
    /// already on loan stay on loan.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the new total is smaller than the
    /// number of copies on loan.
    pub fn resize(self, new_total: i32) -> Result<Self, AppError> {
        let on_loan = self.total - self.available;
        if new_total < on_loan {
            return Err(AppError::bad_request(
                "total_copies cannot be lower than the number of copies on loan",
                json!({ "total_copies": new_total, "copies_on_loan": on_loan }),
            ));
        }
        Self::new(new_total, new_total - on_loan)
    }
}

/// Input data for creating a book.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub description: String,
    pub author_id: i64,
    pub category_id: i64,
    pub stock: Stock,
}

/// Partial update for an existing book. `None` fields are unchanged.
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    pub total_copies: Option<i32>,
}

/// Read-side filter for listing books.
///
/// `category` is an exact name match; `author` is a case-insensitive
/// substring match on the author's name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub category: Option<String>,
    pub author: Option<String>,
}

impl BookFilter {
    /// Builds a filter, treating empty strings as "no filter".
    pub fn new(category: Option<String>, author: Option<String>) -> Self {
        Self {
            category: category.filter(|c| !c.is_empty()),
            author: author.filter(|a| !a.is_empty()),
        }
    }

    /// In-process evaluation of the filter against a joined book.
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(category) = &self.category
            && book.category_name.as_deref() != Some(category.as_str())
        {
            return false;
        }

        if let Some(author) = &self.author {
            let needle = author.to_lowercase();
            let matches_author = book
                .author_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&needle));
            if !matches_author {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book(category: &str, author: &str) -> Book {
        Book {
            id: 1,
            title: "Dune".to_string(),
            description: String::new(),
            author_id: 1,
            author_name: Some(author.to_string()),
            category_id: 1,
            category_name: Some(category.to_string()),
            total_copies: 3,
            available_copies: 1,
        }
    }

    #[test]
    fn test_stock_rejects_available_above_total() {
        assert!(matches!(
            Stock::new(2, 3).unwrap_err(),
            AppError::Validation { .. }
        ));
        assert!(Stock::new(-1, 0).is_err());
        assert!(Stock::new(2, -1).is_err());
        assert!(Stock::new(0, 0).is_ok());
    }

    #[test]
    fn test_shift_available_stays_in_bounds() {
        let stock = Stock::new(2, 1).unwrap();

        assert_eq!(stock.shift_available(1).unwrap().available(), 2);
        assert_eq!(stock.shift_available(-1).unwrap().available(), 0);
        assert!(stock.shift_available(2).is_err());
        assert!(stock.shift_available(-2).is_err());
    }

    #[test]
    fn test_resize_keeps_loans() {
        let stock = Stock::new(5, 2).unwrap();

        let grown = stock.resize(7).unwrap();
        assert_eq!((grown.total(), grown.available()), (7, 4));

        let shrunk = stock.resize(3).unwrap();
        assert_eq!((shrunk.total(), shrunk.available()), (3, 0));

        assert!(matches!(
            stock.resize(2).unwrap_err(),
            AppError::Validation { .. }
        ));
    }

    #[test]
    fn test_copies_on_loan() {
        let book = sample_book("Fiction", "Frank Herbert");
        assert_eq!(book.copies_on_loan(), 2);
        assert!(book.has_available_copy());
    }

    #[test]
    fn test_filter_empty_values_are_ignored() {
        let filter = BookFilter::new(Some(String::new()), Some(String::new()));
        assert_eq!(filter, BookFilter::default());
    }

    #[test]
    fn test_filter_category_is_exact() {
        let book = sample_book("Fiction", "Frank Herbert");

        assert!(BookFilter::new(Some("Fiction".to_string()), None).matches(&book));
        assert!(!BookFilter::new(Some("fiction".to_string()), None).matches(&book));
        assert!(!BookFilter::new(Some("Fict".to_string()), None).matches(&book));
    }

    #[test]
    fn test_filter_author_is_case_insensitive_substring() {
        let book = sample_book("Fiction", "Frank Herbert");

        assert!(BookFilter::new(None, Some("herb".to_string())).matches(&book));
        assert!(BookFilter::new(None, Some("FRANK".to_string())).matches(&book));
        assert!(!BookFilter::new(None, Some("Asimov".to_string())).matches(&book));
    }
}
