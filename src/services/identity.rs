//! Account registration, login and sessions

use crate::{
    error::{AppError, AppResult},
    models::user::User,
    repository::Repository,
};

/// Accounts guaranteed to exist after `bootstrap`
const SEED_ACCOUNTS: [(&str, &str, bool); 2] = [("admin", "admin123", true), ("user1", "password", false)];

/// Identity attached to a logged-in session
#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionUser {
    username: String,
    is_admin: bool,
}

/// At most one logged-in identity; starts empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<SessionUser>,
}

impl Session {
    pub fn current_user(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// False when nobody is logged in
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

#[derive(Clone)]
pub struct IdentityService {
    repository: Repository,
}

impl IdentityService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create the seed accounts that do not exist yet
    pub async fn bootstrap(&self) -> AppResult<()> {
        for (username, password, is_admin) in SEED_ACCOUNTS {
            if self.repository.users_exists(username).await? {
                continue;
            }
            match self.repository.users_create(&User::new(username, password, is_admin)).await {
                Ok(()) => tracing::info!("Created seed account {}", username),
                // Lost a race with another bootstrap; the account exists either way
                Err(AppError::DuplicateKey(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Register a new account
    pub async fn register(&self, username: &str, password: &str, is_admin: bool) -> AppResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("Username cannot be empty".to_string()));
        }
        if password.trim().is_empty() {
            return Err(AppError::Validation("Password cannot be empty".to_string()));
        }

        let user = User::new(username, password, is_admin);
        self.repository.users_create(&user).await?;

        tracing::info!("User registered: {}", user.username);
        Ok(user)
    }

    /// Check credentials and attach the identity to `session`.
    /// The session is left untouched on failure.
    pub async fn login(&self, session: &mut Session, username: &str, password: &str) -> AppResult<()> {
        // Same normalization as `register`
        let username = username.trim();
        let user = match self.repository.users_get(username).await? {
            Some(user) if user.password == password => user,
            _ => {
                tracing::warn!(username, "Failed login attempt");
                return Err(AppError::InvalidCredentials);
            }
        };

        tracing::info!("Login successful: {}", user.username);
        session.user = Some(SessionUser {
            username: user.username,
            is_admin: user.is_admin,
        });
        Ok(())
    }

    /// Clear the session; reports whether someone was logged in
    pub fn logout(&self, session: &mut Session) -> bool {
        match session.user.take() {
            Some(user) => {
                tracing::info!("Logged out: {}", user.username);
                true
            }
            None => false,
        }
    }

    pub async fn get_user(&self, username: &str) -> AppResult<User> {
        self.repository
            .users_get(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repository.users_list().await
    }
}
