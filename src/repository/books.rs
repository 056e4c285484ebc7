//! Book domain methods on Repository

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, LoanStatus, NewBook},
};

const SELECT_BOOKS: &str = "SELECT id, title, author, year, borrower, due_date FROM books";

/// Turn a free-text query into a LIKE pattern matching it literally
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Repository {
    /// Insert a new book and return its generated id
    pub async fn books_create(&self, book: &NewBook) -> AppResult<i64> {
        let result = sqlx::query("INSERT INTO books (title, author, year, borrower, due_date) VALUES (?, ?, ?, NULL, NULL)")
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.year)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Full-row update keyed by id
    pub async fn books_update(&self, book: &Book) -> AppResult<()> {
        let (borrower, due_date) = book.status.columns();
        let result = sqlx::query(
            "UPDATE books SET title = ?, author = ?, year = ?, borrower = ?, due_date = ? WHERE id = ?",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.year)
        .bind(borrower)
        .bind(due_date)
        .bind(book.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with ID {} not found", book.id)));
        }
        Ok(())
    }

    /// Full-row update that only applies while the stored loan still equals `expected`.
    /// Returns false when the row is missing or its loan changed in between.
    pub async fn books_update_if_status(&self, book: &Book, expected: &LoanStatus) -> AppResult<bool> {
        let (borrower, due_date) = book.status.columns();
        let (expected_borrower, expected_due_date) = expected.columns();
        let result = sqlx::query(
            r#"
            UPDATE books SET title = ?, author = ?, year = ?, borrower = ?, due_date = ?
            WHERE id = ? AND borrower IS ? AND due_date IS ?
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.year)
        .bind(borrower)
        .bind(due_date)
        .bind(book.id)
        .bind(expected_borrower)
        .bind(expected_due_date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Get book by ID
    pub async fn books_get_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!("{} WHERE id = ?", SELECT_BOOKS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// List all books in insertion order
    pub async fn books_list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!("{} ORDER BY id", SELECT_BOOKS))
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Case-insensitive substring search on the title
    pub async fn books_search_by_title(&self, query: &str) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            r"{} WHERE title LIKE ? ESCAPE '\' ORDER BY id",
            SELECT_BOOKS
        ))
        .bind(like_pattern(query))
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Case-insensitive substring search on the author
    pub async fn books_search_by_author(&self, query: &str) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            r"{} WHERE author LIKE ? ESCAPE '\' ORDER BY id",
            SELECT_BOOKS
        ))
        .bind(like_pattern(query))
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Books currently checked out by anyone
    pub async fn books_list_borrowed(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!("{} WHERE borrower IS NOT NULL ORDER BY id", SELECT_BOOKS))
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Books currently checked out by `username` (exact match)
    pub async fn books_list_borrowed_by_user(&self, username: &str) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!("{} WHERE borrower = ? ORDER BY id", SELECT_BOOKS))
            .bind(username)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Count books in the catalog
    pub async fn books_count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
