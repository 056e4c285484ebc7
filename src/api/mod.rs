//! API handlers for the catalog REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{error::AppError, services::Session, AppState};

/// Session token from an `Authorization: Bearer <token>` header
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("You must be logged in to perform this action".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))?;

    Uuid::parse_str(token.trim()).map_err(|_| AppError::Unauthorized("Invalid session token".to_string()))
}

/// Extractor for a request made from a logged-in session
pub struct AuthenticatedUser {
    pub username: String,
    pub session: Session,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;

        let session = state
            .services
            .sessions
            .get(&token)
            .await
            .ok_or_else(|| AppError::Unauthorized("Session expired or logged out".to_string()))?;

        let username = session
            .current_user()
            .map(str::to_string)
            .ok_or_else(|| AppError::Unauthorized("You must be logged in to perform this action".to_string()))?;

        Ok(AuthenticatedUser { username, session })
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Catalog
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/search", get(books::search_books))
        .route("/books/borrowed", get(books::list_borrowed_books))
        .route("/books/overdue", get(books::list_overdue_books))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id/checkout", post(books::checkout_book))
        .route("/books/:id/return", post(books::return_book))
        // Per-user views
        .route("/me/books", get(users::my_books))
        .route("/me/books/overdue", get(users::my_overdue_books))
        .route("/users", get(users::list_users))
        .route("/users/:username/books", get(users::user_books))
        .route("/users/:username/books/overdue", get(users::user_overdue_books))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
