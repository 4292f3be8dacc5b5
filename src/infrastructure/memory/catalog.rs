//! Book, category and author tables.

use async_trait::async_trait;
use serde_json::json;

use super::{MemoryStore, RowKey, Tables};
use crate::domain::entities::{
    Author, AuthorPatch, Book, BookFilter, BookPatch, Category, NewAuthor, NewBook, NewCategory,
    Stock,
};
use crate::domain::repositories::{AuthorRepository, BookRepository, CategoryRepository};
use crate::error::AppError;

fn missing_reference(field: &str, id: i64) -> AppError {
    let mut details = serde_json::Map::new();
    details.insert(field.to_string(), json!(id));
    AppError::bad_request("Referenced resource does not exist", details.into())
}

fn check_references(tables: &Tables, author_id: i64, category_id: i64) -> Result<(), AppError> {
    if !tables.authors.contains_key(&author_id) {
        return Err(missing_reference("author_id", author_id));
    }
    if !tables.categories.contains_key(&category_id) {
        return Err(missing_reference("category_id", category_id));
    }
    Ok(())
}

#[async_trait]
impl BookRepository for MemoryStore {
    async fn list(&self, filter: BookFilter) -> Result<Vec<Book>, AppError> {
        let tables = self.inner.tables()?;
        Ok(tables
            .books
            .values()
            .map(|b| tables.joined_book(b))
            .filter(|b| filter.matches(b))
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, AppError> {
        let tables = self.inner.tables()?;
        Ok(tables.books.get(&id).map(|b| tables.joined_book(b)))
    }

    async fn create(&self, new_book: NewBook) -> Result<Book, AppError> {
        let mut tables = self.inner.tables()?;
        check_references(&tables, new_book.author_id, new_book.category_id)?;

        let book = Book {
            id: tables.next_id(),
            title: new_book.title,
            description: new_book.description,
            author_id: new_book.author_id,
            author_name: None,
            category_id: new_book.category_id,
            category_name: None,
            total_copies: new_book.stock.total(),
            available_copies: new_book.stock.available(),
        };
        tables.books.insert(book.id, book.clone());
        Ok(tables.joined_book(&book))
    }

    async fn update(&self, id: i64, patch: BookPatch) -> Result<Book, AppError> {
        // Same lock a borrow takes, so the resize sees a settled on-loan count.
        let _row = self.inner.lock_row(RowKey::Book(id)).await?;

        let mut tables = self.inner.tables()?;
        let current = tables
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Book not found", json!({ "book_id": id })))?;

        let mut stock = Stock::new(current.total_copies, current.available_copies)?;
        if let Some(new_total) = patch.total_copies {
            stock = stock.resize(new_total)?;
        }
        check_references(
            &tables,
            patch.author_id.unwrap_or(current.author_id),
            patch.category_id.unwrap_or(current.category_id),
        )?;

        let updated = Book {
            title: patch.title.unwrap_or(current.title),
            description: patch.description.unwrap_or(current.description),
            author_id: patch.author_id.unwrap_or(current.author_id),
            category_id: patch.category_id.unwrap_or(current.category_id),
            total_copies: stock.total(),
            available_copies: stock.available(),
            ..current
        };
        tables.books.insert(id, updated.clone());
        Ok(tables.joined_book(&updated))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.inner.tables()?.remove_book(id))
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.inner.tables()?.categories.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, AppError> {
        Ok(self.inner.tables()?.categories.get(&id).cloned())
    }

    async fn create(&self, new_category: NewCategory) -> Result<Category, AppError> {
        let mut tables = self.inner.tables()?;
        let category = Category {
            id: tables.next_id(),
            name: new_category.name,
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, id: i64, update: NewCategory) -> Result<Category, AppError> {
        let mut tables = self.inner.tables()?;
        let category = tables.categories.get_mut(&id).ok_or_else(|| {
            AppError::not_found("Category not found", json!({ "category_id": id }))
        })?;
        category.name = update.name;
        Ok(category.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.inner.tables()?;
        if tables.categories.remove(&id).is_none() {
            return Ok(false);
        }
        tables.remove_books_where(|b| b.category_id == id);
        Ok(true)
    }
}

#[async_trait]
impl AuthorRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Author>, AppError> {
        Ok(self.inner.tables()?.authors.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Author>, AppError> {
        Ok(self.inner.tables()?.authors.get(&id).cloned())
    }

    async fn create(&self, new_author: NewAuthor) -> Result<Author, AppError> {
        let mut tables = self.inner.tables()?;
        let author = Author {
            id: tables.next_id(),
            name: new_author.name,
            bio: new_author.bio,
        };
        tables.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn update(&self, id: i64, patch: AuthorPatch) -> Result<Author, AppError> {
        let mut tables = self.inner.tables()?;
        let author = tables
            .authors
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Author not found", json!({ "author_id": id })))?;
        if let Some(name) = patch.name {
            author.name = name;
        }
        if let Some(bio) = patch.bio {
            author.bio = bio;
        }
        Ok(author.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.inner.tables()?;
        if tables.authors.remove(&id).is_none() {
            return Ok(false);
        }
        tables.remove_books_where(|b| b.author_id == id);
        Ok(true)
    }
}
