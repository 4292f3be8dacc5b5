//! PostgreSQL implementation of book repository.

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Book, BookFilter, BookPatch, NewBook, Stock};
use crate::domain::repositories::BookRepository;
use crate::error::AppError;

/// Joined projection shared by every read. Expects the book as `b`.
const BOOK_SELECT: &str = r#"
    SELECT b.id, b.title, b.description,
           b.author_id, a.name AS author_name,
           b.category_id, c.name AS category_name,
           b.total_copies, b.available_copies
    FROM {source} b
    JOIN authors a ON a.id = b.author_id
    JOIN categories c ON c.id = b.category_id
"#;

#[derive(sqlx::FromRow)]
pub(crate) struct BookRow {
    id: i64,
    title: String,
    description: String,
    author_id: i64,
    author_name: Option<String>,
    category_id: i64,
    category_name: Option<String>,
    total_copies: i32,
    available_copies: i32,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            author_id: row.author_id,
            author_name: row.author_name,
            category_id: row.category_id,
            category_name: row.category_name,
            total_copies: row.total_copies,
            available_copies: row.available_copies,
        }
    }
}

pub(crate) fn select_books_from(source: &str) -> String {
    BOOK_SELECT.replace("{source}", source)
}

/// Escapes `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// PostgreSQL repository for books.
pub struct PgBookRepository {
    pool: Arc<PgPool>,
}

impl PgBookRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn list(&self, filter: BookFilter) -> Result<Vec<Book>, AppError> {
        let author_pattern = filter
            .author
            .as_deref()
            .map(|author| format!("%{}%", escape_like(author)));

        let sql = format!(
            r#"
            {}
            WHERE ($1::text IS NULL OR c.name = $1)
              AND ($2::text IS NULL OR a.name ILIKE $2 ESCAPE '\')
            ORDER BY b.id
            "#,
            select_books_from("books")
        );

        let rows = sqlx::query_as::<_, BookRow>(&sql)
            .bind(filter.category)
            .bind(author_pattern)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, AppError> {
        let sql = format!("{} WHERE b.id = $1", select_books_from("books"));

        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, new_book: NewBook) -> Result<Book, AppError> {
        let sql = format!(
            r#"
            WITH inserted AS (
                INSERT INTO books (title, description, author_id, category_id, total_copies, available_copies)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            {}
            "#,
            select_books_from("inserted")
        );

        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(&new_book.title)
            .bind(&new_book.description)
            .bind(new_book.author_id)
            .bind(new_book.category_id)
            .bind(new_book.stock.total())
            .bind(new_book.stock.available())
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    async fn update(&self, id: i64, patch: BookPatch) -> Result<Book, AppError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(i32, i32)> = sqlx::query_as(
            "SELECT total_copies, available_copies FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((total, available)) = current else {
            tx.rollback().await?;
            return Err(AppError::not_found("Book not found", json!({ "book_id": id })));
        };

        let delta = match patch.total_copies {
            Some(new_total) => {
                Stock::new(total, available)?.resize(new_total)?;
                new_total - total
            }
            None => 0,
        };

        sqlx::query(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                author_id = COALESCE($4, author_id),
                category_id = COALESCE($5, category_id),
                total_copies = total_copies + $6,
                available_copies = available_copies + $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.author_id)
        .bind(patch.category_id)
        .bind(delta)
        .execute(&mut *tx)
        .await?;

        let sql = format!("{} WHERE b.id = $1", select_books_from("books"));
        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
