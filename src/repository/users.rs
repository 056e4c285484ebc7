//! User domain methods on Repository

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::user::User,
};

impl Repository {
    /// Insert a user; an existing username yields `DuplicateKey`
    pub async fn users_create(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query("INSERT INTO users (username, password, is_admin) VALUES (?, ?, ?)")
            .bind(&user.username)
            .bind(&user.password)
            .bind(user.is_admin)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::DuplicateKey(
                format!("Username {} already exists", user.username),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Get user by exact username
    pub async fn users_get(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT username, password, is_admin FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check if a username is taken
    pub async fn users_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// List all users
    pub async fn users_list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT username, password, is_admin FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }
}
