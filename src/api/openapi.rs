//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "Library catalog and lending REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        // Books
        books::list_books,
        books::create_book,
        books::search_books,
        books::get_book,
        books::checkout_book,
        books::return_book,
        books::list_borrowed_books,
        books::list_overdue_books,
        // Users
        users::my_books,
        users::my_overdue_books,
        users::list_users,
        users::user_books,
        users::user_overdue_books,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::Credentials,
            crate::models::user::UserInfo,
            auth::LoginResponse,
            auth::LogoutResponse,
            // Books
            crate::models::book::BookResponse,
            books::CreateBookRequest,
            books::SearchQuery,
            books::CheckoutRequest,
            books::LoanResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and sessions"),
        (name = "books", description = "Catalog and lending"),
        (name = "users", description = "Per-user lending views")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
