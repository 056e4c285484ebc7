//! Registration, login and logout endpoints

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{Credentials, UserInfo},
    services::Session,
};

use super::{bearer_token, AuthenticatedUser};

/// Login response with the session token
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub user: UserInfo,
}

/// Logout outcome
#[derive(Serialize, ToSchema)]
pub struct LogoutResponse {
    /// Whether a session was active and has been closed
    pub logged_out: bool,
    pub message: String,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 201, description = "Account created", body = UserInfo),
        (status = 400, description = "Blank username or password"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<Credentials>,
) -> AppResult<(StatusCode, Json<UserInfo>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = state
        .services
        .identity
        .register(&request.username, &request.password, false)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Log in and open a session
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<Credentials>,
) -> AppResult<Json<LoginResponse>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut session = Session::default();
    state
        .services
        .identity
        .login(&mut session, &request.username, &request.password)
        .await?;

    let user = UserInfo {
        username: session.current_user().unwrap_or_default().to_string(),
        is_admin: session.is_admin(),
    };
    let token = state.services.sessions.open(session).await;

    Ok(Json(LoginResponse {
        token: token.to_string(),
        token_type: "Bearer".to_string(),
        user,
    }))
}

/// Close the caller's session, if any
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logout outcome", body = LogoutResponse)
    )
)]
pub async fn logout(State(state): State<crate::AppState>, headers: HeaderMap) -> Json<LogoutResponse> {
    let closed = match bearer_token(&headers) {
        Ok(token) => state.services.sessions.close(&token).await,
        Err(_) => None,
    };

    let logged_out = match closed {
        Some(mut session) => state.services.identity.logout(&mut session),
        None => false,
    };

    let message = if logged_out {
        "Successfully logged out".to_string()
    } else {
        "No user is currently logged in".to_string()
    };

    Json(LogoutResponse { logged_out, message })
}

/// Current session identity
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged-in user", body = UserInfo),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me(user: AuthenticatedUser) -> Json<UserInfo> {
    Json(UserInfo {
        is_admin: user.session.is_admin(),
        username: user.username,
    })
}
