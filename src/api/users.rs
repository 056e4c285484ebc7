//! Per-user lending views

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{book::BookResponse, user::UserInfo},
};

use super::AuthenticatedUser;

/// Books borrowed by the logged-in user
#[utoipa::path(
    get,
    path = "/me/books",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "My borrowed books", body = Vec<BookResponse>),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn my_books(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<BookResponse>>> {
    let books = state
        .services
        .catalog
        .list_borrowed_books_by_user(&user.username)
        .await?;
    Ok(Json(BookResponse::list(books)))
}

/// Overdue books of the logged-in user
#[utoipa::path(
    get,
    path = "/me/books/overdue",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "My overdue books", body = Vec<BookResponse>),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn my_overdue_books(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<BookResponse>>> {
    let books = state
        .services
        .catalog
        .list_overdue_books_by_user(&user.username)
        .await?;
    Ok(Json(BookResponse::list(books)))
}

/// List registered users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registered users", body = Vec<UserInfo>),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<UserInfo>>> {
    let users = state.services.identity.list_users().await?;
    Ok(Json(users.into_iter().map(UserInfo::from).collect()))
}

/// Books borrowed by a given user
#[utoipa::path(
    get,
    path = "/users/{username}/books",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("username" = String, Path, description = "Username")
    ),
    responses(
        (status = 200, description = "User's borrowed books", body = Vec<BookResponse>),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_books(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(username): Path<String>,
) -> AppResult<Json<Vec<BookResponse>>> {
    // Verify user exists
    state.services.identity.get_user(&username).await?;

    let books = state
        .services
        .catalog
        .list_borrowed_books_by_user(&username)
        .await?;
    Ok(Json(BookResponse::list(books)))
}

/// Overdue books of a given user
#[utoipa::path(
    get,
    path = "/users/{username}/books/overdue",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("username" = String, Path, description = "Username")
    ),
    responses(
        (status = 200, description = "User's overdue books", body = Vec<BookResponse>),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_overdue_books(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(username): Path<String>,
) -> AppResult<Json<Vec<BookResponse>>> {
    state.services.identity.get_user(&username).await?;

    let books = state
        .services
        .catalog
        .list_overdue_books_by_user(&username)
        .await?;
    Ok(Json(BookResponse::list(books)))
}
