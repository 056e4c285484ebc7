//! Catalog and lending service

use chrono::{Local, NaiveDate};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, NewBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add a book to the catalog; it starts out available
    pub async fn add_book(&self, title: &str, author: &str, year: i32) -> AppResult<Book> {
        let title = title.trim();
        let author = author.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title cannot be empty".to_string()));
        }
        if author.is_empty() {
            return Err(AppError::Validation("Author cannot be empty".to_string()));
        }

        let new_book = NewBook {
            title: title.to_string(),
            author: author.to_string(),
            year,
        };
        let id = self.repository.books_create(&new_book).await?;

        let book = self
            .repository
            .books_get_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Book {} vanished after insert", id)))?;

        tracing::info!("Book added: {}", book);
        Ok(book)
    }

    /// Get a single book
    pub async fn view_book(&self, id: i64) -> AppResult<Book> {
        self.repository
            .books_get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with ID {} not found", id)))
    }

    /// Check a book out to `borrower` until `due_date`
    pub async fn checkout_book(&self, id: i64, borrower: &str, due_date: NaiveDate) -> AppResult<Book> {
        if !self.repository.users_exists(borrower).await? {
            return Err(AppError::NotFound(format!("User {} not found", borrower)));
        }

        let mut book = self.view_book(id).await?;
        let previous = book.status.clone();
        book.checkout(borrower, due_date)?;

        if !self.repository.books_update_if_status(&book, &previous).await? {
            // Someone else moved the book between our read and write
            let current = self.view_book(id).await?;
            return Err(match current.borrower() {
                Some(holder) => AppError::AlreadyBorrowed {
                    book_id: id,
                    borrower: holder.to_string(),
                },
                None => AppError::Internal(format!("Checkout of book {} lost a concurrent update", id)),
            });
        }

        tracing::info!(book_id = id, borrower, %due_date, "Book checked out");
        Ok(book)
    }

    /// Return a borrowed book; yields the updated book and who returned it
    pub async fn return_book(&self, id: i64) -> AppResult<(Book, String)> {
        let mut book = self.view_book(id).await?;
        let previous = book.status.clone();
        let borrower = book.return_book()?;

        if !self.repository.books_update_if_status(&book, &previous).await? {
            return Err(AppError::NotBorrowed(id));
        }

        tracing::info!(book_id = id, borrower = %borrower, "Book returned");
        Ok((book, borrower))
    }

    pub async fn search_by_title(&self, query: &str) -> AppResult<Vec<Book>> {
        self.repository.books_search_by_title(query).await
    }

    pub async fn search_by_author(&self, query: &str) -> AppResult<Vec<Book>> {
        self.repository.books_search_by_author(query).await
    }

    pub async fn list_all_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books_list().await
    }

    pub async fn list_borrowed_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books_list_borrowed().await
    }

    /// Borrowed books whose due date has passed
    pub async fn list_overdue_books(&self) -> AppResult<Vec<Book>> {
        let today = today();
        let books = self.repository.books_list().await?;
        Ok(books.into_iter().filter(|b| b.is_overdue(today)).collect())
    }

    pub async fn list_borrowed_books_by_user(&self, username: &str) -> AppResult<Vec<Book>> {
        self.repository.books_list_borrowed_by_user(username).await
    }

    pub async fn list_overdue_books_by_user(&self, username: &str) -> AppResult<Vec<Book>> {
        let today = today();
        let books = self.repository.books_list_borrowed_by_user(username).await?;
        Ok(books.into_iter().filter(|b| b.is_overdue(today)).collect())
    }

    /// Count books in the catalog
    pub async fn count_books(&self) -> AppResult<i64> {
        self.repository.books_count().await
    }
}
