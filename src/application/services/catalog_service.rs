//! Catalog management: books, categories and authors.
//!
//! Reads are open to any authenticated caller; every mutation requires the
//! admin role. The role check runs before any repository call.

use std::sync::Arc;

use serde_json::json;

use crate::domain::entities::{
    Author, AuthorPatch, Book, BookFilter, BookPatch, Caller, Category, NewAuthor, NewBook,
    NewCategory,
};
use crate::domain::policy::{self, Access};
use crate::domain::repositories::{AuthorRepository, BookRepository, CategoryRepository};
use crate::error::AppError;

/// Service for catalog CRUD.
pub struct CatalogService {
    books: Arc<dyn BookRepository>,
    categories: Arc<dyn CategoryRepository>,
    authors: Arc<dyn AuthorRepository>,
}

impl CatalogService {
    pub fn new(
        books: Arc<dyn BookRepository>,
        categories: Arc<dyn CategoryRepository>,
        authors: Arc<dyn AuthorRepository>,
    ) -> Self {
        Self {
            books,
            categories,
            authors,
        }
    }

    // Books

    /// Lists books matching `filter`, ordered by ID.
    pub async fn list_books(
        &self,
        caller: &Caller,
        filter: BookFilter,
    ) -> Result<Vec<Book>, AppError> {
        policy::authorize(caller, Access::Authenticated)?;
        self.books.list(filter).await
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the book does not exist.
    pub async fn get_book(&self, caller: &Caller, id: i64) -> Result<Book, AppError> {
        policy::authorize(caller, Access::Authenticated)?;
        self.books.find_by_id(id).await?.ok_or_else(|| book_not_found(id))
    }

    /// Creates a book after checking that its author and category exist.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] for non-admin callers.
    /// Returns [`AppError::Validation`] if a reference is missing.
    pub async fn create_book(&self, caller: &Caller, new_book: NewBook) -> Result<Book, AppError> {
        policy::authorize(caller, Access::Admin)?;
        self.ensure_references(Some(new_book.author_id), Some(new_book.category_id))
            .await?;

        let book = self.books.create(new_book).await?;
        tracing::info!(book_id = book.id, total_copies = book.total_copies, "Book created");
        Ok(book)
    }

    /// Applies a partial update.
    ///
    /// A new `total_copies` moves `available_copies` by the same delta, so
    /// copies on loan stay on loan.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] for non-admin callers.
    /// Returns [`AppError::Validation`] if a new reference is missing or the
    /// new total is below the number of copies on loan.
    /// Returns [`AppError::NotFound`] if the book does not exist.
    pub async fn update_book(
        &self,
        caller: &Caller,
        id: i64,
        patch: BookPatch,
    ) -> Result<Book, AppError> {
        policy::authorize(caller, Access::Admin)?;
        self.ensure_references(patch.author_id, patch.category_id)
            .await?;

        let book = self.books.update(id, patch).await?;
        tracing::info!(book_id = book.id, "Book updated");
        Ok(book)
    }

    /// Deletes a book and, by cascade, its borrow history.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] for non-admin callers.
    /// Returns [`AppError::NotFound`] if the book does not exist.
    pub async fn delete_book(&self, caller: &Caller, id: i64) -> Result<(), AppError> {
        policy::authorize(caller, Access::Admin)?;
        if !self.books.delete(id).await? {
            return Err(book_not_found(id));
        }
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    // Categories

    pub async fn list_categories(&self, caller: &Caller) -> Result<Vec<Category>, AppError> {
        policy::authorize(caller, Access::Authenticated)?;
        self.categories.list().await
    }

    pub async fn get_category(&self, caller: &Caller, id: i64) -> Result<Category, AppError> {
        policy::authorize(caller, Access::Authenticated)?;
        self.categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| category_not_found(id))
    }

    pub async fn create_category(
        &self,
        caller: &Caller,
        new_category: NewCategory,
    ) -> Result<Category, AppError> {
        policy::authorize(caller, Access::Admin)?;
        self.categories.create(new_category).await
    }

    pub async fn update_category(
        &self,
        caller: &Caller,
        id: i64,
        update: NewCategory,
    ) -> Result<Category, AppError> {
        policy::authorize(caller, Access::Admin)?;
        self.categories.update(id, update).await
    }

    /// Deletes a category together with its books.
    pub async fn delete_category(&self, caller: &Caller, id: i64) -> Result<(), AppError> {
        policy::authorize(caller, Access::Admin)?;
        if !self.categories.delete(id).await? {
            return Err(category_not_found(id));
        }
        tracing::info!(category_id = id, "Category deleted");
        Ok(())
    }

    // Authors

    pub async fn list_authors(&self, caller: &Caller) -> Result<Vec<Author>, AppError> {
        policy::authorize(caller, Access::Authenticated)?;
        self.authors.list().await
    }

    pub async fn get_author(&self, caller: &Caller, id: i64) -> Result<Author, AppError> {
        policy::authorize(caller, Access::Authenticated)?;
        self.authors
            .find_by_id(id)
            .await?
            .ok_or_else(|| author_not_found(id))
    }

    pub async fn create_author(
        &self,
        caller: &Caller,
        new_author: NewAuthor,
    ) -> Result<Author, AppError> {
        policy::authorize(caller, Access::Admin)?;
        self.authors.create(new_author).await
    }

    pub async fn update_author(
        &self,
        caller: &Caller,
        id: i64,
        patch: AuthorPatch,
    ) -> Result<Author, AppError> {
        policy::authorize(caller, Access::Admin)?;
        self.authors.update(id, patch).await
    }

    /// Deletes an author together with their books.
    pub async fn delete_author(&self, caller: &Caller, id: i64) -> Result<(), AppError> {
        policy::authorize(caller, Access::Admin)?;
        if !self.authors.delete(id).await? {
            return Err(author_not_found(id));
        }
        tracing::info!(author_id = id, "Author deleted");
        Ok(())
    }

    async fn ensure_references(
        &self,
        author_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<(), AppError> {
        if let Some(author_id) = author_id
            && self.authors.find_by_id(author_id).await?.is_none()
        {
            return Err(AppError::bad_request(
                "Author does not exist",
                json!({ "author_id": author_id }),
            ));
        }

        if let Some(category_id) = category_id
            && self.categories.find_by_id(category_id).await?.is_none()
        {
            return Err(AppError::bad_request(
                "Category does not exist",
                json!({ "category_id": category_id }),
            ));
        }

        Ok(())
    }
}

fn book_not_found(id: i64) -> AppError {
    AppError::not_found("Book not found", json!({ "book_id": id }))
}

fn category_not_found(id: i64) -> AppError {
    AppError::not_found("Category not found", json!({ "category_id": id }))
}

fn author_not_found(id: i64) -> AppError {
    AppError::not_found("Author not found", json!({ "author_id": id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Stock;
    use crate::domain::repositories::{
        MockAuthorRepository, MockBookRepository, MockCategoryRepository,
    };

    fn service(
        books: MockBookRepository,
        categories: MockCategoryRepository,
        authors: MockAuthorRepository,
    ) -> CatalogService {
        CatalogService::new(Arc::new(books), Arc::new(categories), Arc::new(authors))
    }

    fn new_book() -> NewBook {
        NewBook {
            title: "Dune".to_string(),
            description: String::new(),
            author_id: 1,
            category_id: 2,
            stock: Stock::new(3, 3).unwrap(),
        }
    }

    fn stored_book(id: i64) -> Book {
        Book {
            id,
            title: "Dune".to_string(),
            description: String::new(),
            author_id: 1,
            author_name: None,
            category_id: 2,
            category_name: None,
            total_copies: 3,
            available_copies: 3,
        }
    }

    #[tokio::test]
    async fn test_create_book_requires_admin() {
        let mut books = MockBookRepository::new();
        books.expect_create().times(0);

        let service = service(
            books,
            MockCategoryRepository::new(),
            MockAuthorRepository::new(),
        );

        let result = service.create_book(&Caller::user(1), new_book()).await;
        assert!(matches!(result.unwrap_err(), AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_create_book_checks_author() {
        let mut books = MockBookRepository::new();
        let mut authors = MockAuthorRepository::new();

        authors.expect_find_by_id().returning(|_| Ok(None));
        books.expect_create().times(0);

        let service = service(books, MockCategoryRepository::new(), authors);

        let result = service.create_book(&Caller::admin(1), new_book()).await;
        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_book_success() {
        let mut books = MockBookRepository::new();
        let mut categories = MockCategoryRepository::new();
        let mut authors = MockAuthorRepository::new();

        authors.expect_find_by_id().returning(|id| {
            Ok(Some(Author {
                id,
                name: "Frank Herbert".to_string(),
                bio: String::new(),
            }))
        });
        categories.expect_find_by_id().returning(|id| {
            Ok(Some(Category {
                id,
                name: "Sci-Fi".to_string(),
            }))
        });
        books
            .expect_create()
            .withf(|b| b.stock.total() == 3 && b.stock.available() == 3)
            .times(1)
            .returning(|_| Ok(stored_book(10)));

        let service = service(books, categories, authors);

        let book = service
            .create_book(&Caller::admin(1), new_book())
            .await
            .unwrap();
        assert_eq!(book.id, 10);
    }

    #[tokio::test]
    async fn test_update_book_without_references_skips_lookups() {
        let mut books = MockBookRepository::new();
        let mut authors = MockAuthorRepository::new();
        let mut categories = MockCategoryRepository::new();

        authors.expect_find_by_id().times(0);
        categories.expect_find_by_id().times(0);
        books
            .expect_update()
            .withf(|id, patch| *id == 10 && patch.total_copies == Some(5))
            .times(1)
            .returning(|id, _| Ok(stored_book(id)));

        let service = service(books, categories, authors);

        let patch = BookPatch {
            total_copies: Some(5),
            ..BookPatch::default()
        };
        assert!(service.update_book(&Caller::admin(1), 10, patch).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_book_not_found() {
        let mut books = MockBookRepository::new();
        books.expect_find_by_id().returning(|_| Ok(None));

        let service = service(
            books,
            MockCategoryRepository::new(),
            MockAuthorRepository::new(),
        );

        let result = service.get_book(&Caller::user(1), 99).await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_category_is_not_found() {
        let mut categories = MockCategoryRepository::new();
        categories.expect_delete().returning(|_| Ok(false));

        let service = service(
            MockBookRepository::new(),
            categories,
            MockAuthorRepository::new(),
        );

        let result = service.delete_category(&Caller::admin(1), 3).await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_categories_open_to_users() {
        let mut categories = MockCategoryRepository::new();
        categories.expect_list().times(1).returning(|| Ok(vec![]));

        let service = service(
            MockBookRepository::new(),
            categories,
            MockAuthorRepository::new(),
        );

        assert!(service.list_categories(&Caller::user(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_author_write_requires_admin() {
        let mut authors = MockAuthorRepository::new();
        authors.expect_delete().times(0);

        let service = service(
            MockBookRepository::new(),
            MockCategoryRepository::new(),
            authors,
        );

        let result = service.delete_author(&Caller::user(1), 1).await;
        assert!(matches!(result.unwrap_err(), AppError::Forbidden { .. }));
    }
}
