//! API integration tests driving the router in-process

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Local};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use catalog_server::{
    api,
    config::{AppConfig, DatabaseConfig},
    repository::Repository,
    services::Services,
    AppState,
};

async fn setup() -> (TempDir, Router) {
    setup_with(AppConfig::default()).await
}

async fn setup_with(mut config: AppConfig) -> (TempDir, Router) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    config.database = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("catalog.db").display()),
        max_connections: 1,
    };

    let repository = Repository::connect(&config.database)
        .await
        .expect("Failed to open database");
    repository.create_schema().await.expect("Failed to create schema");

    let services = Services::new(repository, &config);
    services.identity.bootstrap().await.expect("Failed to bootstrap");

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    (dir, api::create_router(state))
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", uri));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.expect("Failed to send request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().expect("No token in response").to_string()
}

async fn add_book(app: &Router, token: &str, title: &str, author: &str, year: i32) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/books",
        Some(token),
        Some(json!({ "title": title, "author": author, "year": year })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "add book failed: {}", body);
    body["id"].as_i64().expect("No id in response")
}

#[tokio::test]
async fn test_health_check() {
    let (_dir, app) = setup().await;

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, "GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_login_and_me() {
    let (_dir, app) = setup().await;
    let token = login(&app, "admin", "admin123").await;

    let (status, body) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["is_admin"], true);
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let (_dir, app) = setup().await;

    let (status, wrong_password) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_user) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "ghost", "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(wrong_password["message"], unknown_user["message"]);
    assert_eq!(wrong_password["error"], "InvalidCredentials");
}

#[tokio::test]
async fn test_logout() {
    let (_dir, app) = setup().await;
    let token = login(&app, "user1", "password").await;

    let (status, body) = send(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["logged_out"], true);

    let (status, _) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["logged_out"], false);
}

#[tokio::test]
async fn test_register() {
    let (_dir, app) = setup().await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "username": "carol", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "carol");
    assert_eq!(body["is_admin"], false);

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "username": "carol", "password": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Duplicate");

    // The original password still works
    login(&app, "carol", "pw").await;

    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "username": "", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_adding_books_requires_login() {
    let (_dir, app) = setup().await;

    let (status, _) = send(
        &app,
        "POST",
        "/books",
        None,
        Some(json!({ "title": "T", "author": "A", "year": 2020 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/books",
        Some("not-a-token"),
        Some(json!({ "title": "T", "author": "A", "year": 2020 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_and_get_book() {
    let (_dir, app) = setup().await;
    let token = login(&app, "admin", "admin123").await;
    let id = add_book(&app, &token, "T", "A", 2020).await;

    let (status, body) = send(&app, "GET", &format!("/books/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "T");
    assert_eq!(body["author"], "A");
    assert_eq!(body["year"], 2020);
    assert_eq!(body["status"], "available");
    assert_eq!(body["is_borrowed"], false);
    assert_eq!(body["borrower"], Value::Null);

    let (status, body) = send(&app, "GET", "/books/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchData");

    let (status, _) = send(
        &app,
        "POST",
        "/books",
        Some(&token),
        Some(json!({ "title": "   ", "author": "A", "year": 2020 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_and_return_flow() {
    let (_dir, app) = setup().await;
    let user_token = login(&app, "user1", "password").await;
    let admin_token = login(&app, "admin", "admin123").await;
    let id = add_book(&app, &admin_token, "The Hobbit", "J.R.R. Tolkien", 1937).await;
    let due = (Local::now().date_naive() + Duration::days(7)).to_string();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/books/{}/checkout", id),
        Some(&user_token),
        Some(json!({ "due_date": due })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["book"]["borrower"], "user1");
    assert_eq!(body["book"]["due_date"], due);
    assert_eq!(body["book"]["status"], "borrowed");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/books/{}/checkout", id),
        Some(&admin_token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "AlreadyBorrowed");
    assert!(body["message"].as_str().unwrap().contains("user1"));

    let (status, body) = send(&app, "GET", "/me/books", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/books/borrowed", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "POST", &format!("/books/{}/return", id), Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["status"], "available");
    assert!(body["message"].as_str().unwrap().contains("user1"));

    let (status, body) = send(&app, "POST", &format!("/books/{}/return", id), Some(&user_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "NotBorrowed");
}

#[tokio::test]
async fn test_checkout_defaults_due_date() {
    let (_dir, app) = setup().await;
    let token = login(&app, "user1", "password").await;
    let id = add_book(&app, &token, "Dune", "Frank Herbert", 1965).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/books/{}/checkout", id),
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let expected = (Local::now().date_naive() + Duration::days(14)).to_string();
    assert_eq!(body["book"]["due_date"], expected);
}

#[tokio::test]
async fn test_checkout_without_body() {
    let (_dir, app) = setup().await;
    let token = login(&app, "user1", "password").await;
    let id = add_book(&app, &token, "Emma", "Jane Austen", 1815).await;

    let (status, body) = send(&app, "POST", &format!("/books/{}/checkout", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let expected = (Local::now().date_naive() + Duration::days(14)).to_string();
    assert_eq!(body["book"]["due_date"], expected);
}

#[tokio::test]
async fn test_checkout_rejects_malformed_body() {
    let (_dir, app) = setup().await;
    let token = login(&app, "user1", "password").await;
    let id = add_book(&app, &token, "Emma", "Jane Austen", 1815).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/books/{}/checkout", id),
        Some(&token),
        Some(json!({ "due_date": "next tuesday" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (_, body) = send(&app, "GET", &format!("/books/{}", id), None, None).await;
    assert_eq!(body["is_borrowed"], false);
}

#[tokio::test]
async fn test_checkout_uses_configured_loan_length() {
    let mut config = AppConfig::default();
    config.lending.default_loan_days = 21;
    let (_dir, app) = setup_with(config).await;
    let token = login(&app, "user1", "password").await;
    let id = add_book(&app, &token, "Emma", "Jane Austen", 1815).await;

    let (status, body) = send(&app, "POST", &format!("/books/{}/checkout", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let expected = (Local::now().date_naive() + Duration::days(21)).to_string();
    assert_eq!(body["book"]["due_date"], expected);
}

#[tokio::test]
async fn test_overflowing_loan_length_is_an_error_not_a_panic() {
    let mut config = AppConfig::default();
    config.lending.default_loan_days = u32::MAX;
    let (_dir, app) = setup_with(config).await;
    let token = login(&app, "user1", "password").await;
    let id = add_book(&app, &token, "Emma", "Jane Austen", 1815).await;

    let (status, body) = send(&app, "POST", &format!("/books/{}/checkout", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failure");

    // An explicit due date still works
    let due = Local::now().date_naive().to_string();
    let (status, _) = send(
        &app,
        "POST",
        &format!("/books/{}/checkout", id),
        Some(&token),
        Some(json!({ "due_date": due })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let mut config = AppConfig::default();
    config.auth.session_ttl_hours = 0;
    let (_dir, app) = setup_with(config).await;
    let token = login(&app, "user1", "password").await;

    let (status, body) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthorized");

    let (_, body) = send(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(body["logged_out"], false);
}

#[tokio::test]
async fn test_user_lending_views_require_login() {
    let (_dir, app) = setup().await;

    for uri in ["/users", "/users/user1/books", "/users/user1/books/overdue", "/me/books"] {
        let (status, _) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn test_overdue_views() {
    let (_dir, app) = setup().await;
    let token = login(&app, "user1", "password").await;
    let late = add_book(&app, &token, "Late", "A", 2000).await;
    let fine = add_book(&app, &token, "Fine", "A", 2000).await;
    let yesterday = (Local::now().date_naive() - Duration::days(1)).to_string();
    let today = Local::now().date_naive().to_string();

    for (id, due) in [(late, &yesterday), (fine, &today)] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/books/{}/checkout", id),
            Some(&token),
            Some(json!({ "due_date": due })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, "GET", "/me/books/overdue", Some(&token), None).await;
    let overdue = body.as_array().unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0]["id"], late);
    assert_eq!(overdue[0]["is_overdue"], true);
    assert_eq!(overdue[0]["status"], "overdue");

    let (_, body) = send(&app, "GET", "/books/overdue", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/users/user1/books", Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/users/user1/books/overdue", Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/users/ghost/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_books() {
    let (_dir, app) = setup().await;
    let token = login(&app, "admin", "admin123").await;
    add_book(&app, &token, "The Hobbit", "J.R.R. Tolkien", 1937).await;
    add_book(&app, &token, "The Lord of the Rings", "J.R.R. Tolkien", 1954).await;
    add_book(&app, &token, "1984", "George Orwell", 1949).await;

    let (status, body) = send(&app, "GET", "/books/search?title=the", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["The Hobbit", "The Lord of the Rings"]);

    let (_, body) = send(&app, "GET", "/books/search?author=orwell", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/books/search?title=Dune", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send(&app, "GET", "/books/search", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_books_and_users() {
    let (_dir, app) = setup().await;
    let token = login(&app, "admin", "admin123").await;
    add_book(&app, &token, "One", "A", 2001).await;
    add_book(&app, &token, "Two", "A", 2002).await;

    let (status, body) = send(&app, "GET", "/books", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&app, "GET", "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["admin", "user1"]);
    assert!(body[0].get("password").is_none());
}
