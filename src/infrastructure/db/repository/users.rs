use crate::domain::error::{AppError, Result};
use crate::domain::user::User;

use super::entities::UserEntity;
use super::HubRepository;

const USER_COLUMNS: &str = "id, email, password_hash, is_admin, created_at";

impl HubRepository {
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user: {e}")))?;

        Ok(user.map(Into::into))
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user: {e}")))?;

        match user {
            Some(user) => Ok(user.into()),
            None => Err(AppError::NotFound(format!("User not found: {}", user_id))),
        }
    }

    pub async fn insert_user(&self, email: &str, password_hash: &str, is_admin: bool) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (email, password_hash, is_admin) VALUES (?, ?, ?)")
            .bind(email)
            .bind(password_hash)
            .bind(if is_admin { 1 } else { 0 })
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    AppError::Conflict("User already exists".to_string())
                }
                _ => AppError::DatabaseError(format!("Failed to insert user: {e}")),
            })?;

        self.get_user(result.last_insert_rowid()).await
    }

    pub async fn set_user_admin(&self, user_id: i64, is_admin: bool) -> Result<()> {
        sqlx::query("UPDATE users SET is_admin = ? WHERE id = ?")
            .bind(if is_admin { 1 } else { 0 })
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to update user role: {e}")))?;
        Ok(())
    }
}
