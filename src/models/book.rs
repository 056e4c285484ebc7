//! Book model and its lending state

use std::fmt;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Lending state of a book.
///
/// The borrower and the due date only exist together, so a book can never be
/// half checked out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Available,
    Borrowed {
        borrower: String,
        due_date: NaiveDate,
    },
}

impl LoanStatus {
    /// Column values as stored in the `borrower` / `due_date` pair
    pub fn columns(&self) -> (Option<&str>, Option<NaiveDate>) {
        match self {
            LoanStatus::Available => (None, None),
            LoanStatus::Borrowed { borrower, due_date } => (Some(borrower.as_str()), Some(*due_date)),
        }
    }
}

/// Catalog book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: i32,
    pub status: LoanStatus,
}

/// Data needed to insert a new book; the id is assigned by the store
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: i32,
}

impl Book {
    pub fn borrower(&self) -> Option<&str> {
        self.status.columns().0
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.status.columns().1
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self.status, LoanStatus::Borrowed { .. })
    }

    /// A book due today is not overdue yet
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match &self.status {
            LoanStatus::Borrowed { due_date, .. } => *due_date < today,
            LoanStatus::Available => false,
        }
    }

    /// Move the book from `Available` to `Borrowed`
    pub fn checkout(&mut self, borrower: &str, due_date: NaiveDate) -> AppResult<()> {
        if let LoanStatus::Borrowed { borrower: current, .. } = &self.status {
            return Err(AppError::AlreadyBorrowed {
                book_id: self.id,
                borrower: current.clone(),
            });
        }
        self.status = LoanStatus::Borrowed {
            borrower: borrower.to_string(),
            due_date,
        };
        Ok(())
    }

    /// Move the book back to `Available`, returning who had it
    pub fn return_book(&mut self) -> AppResult<String> {
        match std::mem::take(&mut self.status) {
            LoanStatus::Borrowed { borrower, .. } => Ok(borrower),
            LoanStatus::Available => Err(AppError::NotBorrowed(self.id)),
        }
    }

    /// Status label relative to `today`
    pub fn status_label(&self, today: NaiveDate) -> &'static str {
        if !self.is_borrowed() {
            "available"
        } else if self.is_overdue(today) {
            "overdue"
        } else {
            "borrowed"
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] \"{}\" by {} ({}) - ", self.id, self.title, self.author, self.year)?;
        match &self.status {
            LoanStatus::Available => write!(f, "Available"),
            LoanStatus::Borrowed { borrower, due_date } => {
                let today = Local::now().date_naive();
                let label = if self.is_overdue(today) { "Overdue" } else { "Borrowed" };
                write!(f, "{} (due: {}) - Borrower: {}", label, due_date, borrower)
            }
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for Book {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let borrower: Option<String> = row.try_get("borrower")?;
        let due_date: Option<NaiveDate> = row.try_get("due_date")?;

        let status = match (borrower, due_date) {
            (None, None) => LoanStatus::Available,
            (Some(borrower), Some(due_date)) => LoanStatus::Borrowed { borrower, due_date },
            _ => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "borrower".to_string(),
                    source: "borrower and due_date must be set together".into(),
                })
            }
        };

        Ok(Book {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            author: row.try_get("author")?,
            year: row.try_get("year")?,
            status,
        })
    }
}

/// Book as rendered by the API, with the derived flags resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: i32,
    /// One of `available`, `borrowed`, `overdue`
    pub status: String,
    pub borrower: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub is_borrowed: bool,
    pub is_overdue: bool,
}

impl BookResponse {
    pub fn new(book: Book, today: NaiveDate) -> Self {
        let status = book.status_label(today).to_string();
        let is_borrowed = book.is_borrowed();
        let is_overdue = book.is_overdue(today);
        let (borrower, due_date) = match book.status {
            LoanStatus::Available => (None, None),
            LoanStatus::Borrowed { borrower, due_date } => (Some(borrower), Some(due_date)),
        };

        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            year: book.year,
            status,
            borrower,
            due_date,
            is_borrowed,
            is_overdue,
        }
    }

    /// Render a listing against a single `today`
    pub fn list(books: Vec<Book>) -> Vec<Self> {
        let today = Local::now().date_naive();
        books.into_iter().map(|b| Self::new(b, today)).collect()
    }
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self::new(book, Local::now().date_naive())
    }
}
