//! Catalog and lending endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::BookResponse,
};

use super::AuthenticatedUser;

/// Add book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author cannot be empty"))]
    pub author: String,
    pub year: i32,
}

/// Search query; exactly one of `title` or `author` is used, title first
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SearchQuery {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Checkout request; the body may be omitted entirely
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// Due date (YYYY-MM-DD); defaults to the configured loan length
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Result of a checkout or return
#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    pub message: String,
    pub book: BookResponse,
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books in the catalog", body = Vec<BookResponse>)
    )
)]
pub async fn list_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<BookResponse>>> {
    let books = state.services.catalog.list_all_books().await?;
    Ok(Json(BookResponse::list(books)))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book added", body = BookResponse),
        (status = 400, description = "Blank title or author"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<CreateBookRequest>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let book = state
        .services
        .catalog
        .add_book(&request.title, &request.author, request.year)
        .await?;

    Ok((StatusCode::CREATED, Json(book.into())))
}

/// Search books by title or author
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching books (possibly none)", body = Vec<BookResponse>),
        (status = 400, description = "Neither title nor author given")
    )
)]
pub async fn search_books(
    State(state): State<crate::AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<BookResponse>>> {
    let catalog = &state.services.catalog;

    let books = match (query.title.as_deref(), query.author.as_deref()) {
        (Some(title), _) if !title.trim().is_empty() => catalog.search_by_title(title.trim()).await?,
        (_, Some(author)) if !author.trim().is_empty() => catalog.search_by_author(author.trim()).await?,
        _ => {
            return Err(AppError::Validation(
                "A title or author search term is required".to_string(),
            ))
        }
    };

    Ok(Json(BookResponse::list(books)))
}

/// Get book details
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.catalog.view_book(id).await?;
    Ok(Json(book.into()))
}

/// Check a book out to the logged-in user
#[utoipa::path(
    post,
    path = "/books/{id}/checkout",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    request_body(content = CheckoutRequest, description = "Optional; an empty body uses the default loan length"),
    responses(
        (status = 200, description = "Book checked out", body = LoanResponse),
        (status = 400, description = "Malformed request body"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book already borrowed")
    )
)]
pub async fn checkout_book(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    body: Bytes,
) -> AppResult<Json<LoanResponse>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CheckoutRequest::default()
    } else {
        serde_json::from_slice::<CheckoutRequest>(&body)
            .map_err(|e| AppError::Validation(format!("Invalid checkout request: {}", e)))?
    };

    let due_date = match request.due_date {
        Some(due_date) => due_date,
        None => state
            .config
            .lending
            .default_due_date(Local::now().date_naive())
            .ok_or_else(|| AppError::Internal("Configured loan length overflows the calendar".to_string()))?,
    };

    let book = state
        .services
        .catalog
        .checkout_book(id, &user.username, due_date)
        .await?;

    Ok(Json(LoanResponse {
        message: format!("Book checked out to {}. Due date: {}", user.username, due_date),
        book: book.into(),
    }))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/books/{id}/return",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = LoanResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book is not borrowed")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<LoanResponse>> {
    let (book, borrower) = state.services.catalog.return_book(id).await?;

    Ok(Json(LoanResponse {
        message: format!("Book returned by {}.", borrower),
        book: book.into(),
    }))
}

/// List all borrowed books
#[utoipa::path(
    get,
    path = "/books/borrowed",
    tag = "books",
    responses(
        (status = 200, description = "Borrowed books", body = Vec<BookResponse>)
    )
)]
pub async fn list_borrowed_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<BookResponse>>> {
    let books = state.services.catalog.list_borrowed_books().await?;
    Ok(Json(BookResponse::list(books)))
}

/// List all overdue books
#[utoipa::path(
    get,
    path = "/books/overdue",
    tag = "books",
    responses(
        (status = 200, description = "Overdue books", body = Vec<BookResponse>)
    )
)]
pub async fn list_overdue_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<BookResponse>>> {
    let books = state.services.catalog.list_overdue_books().await?;
    Ok(Json(BookResponse::list(books)))
}
