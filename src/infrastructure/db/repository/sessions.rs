use crate::domain::error::{AppError, Result};
use crate::domain::user::User;

use super::entities::UserEntity;
use super::HubRepository;

impl HubRepository {
    pub async fn insert_session(
        &self,
        session_id: &str,
        token_hash: &str,
        user_id: i64,
        created_at: &str,
        expires_at: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (id, token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(token_hash)
        .bind(user_id)
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert session: {e}")))?;
        Ok(())
    }

    /// Resolves the user behind an unexpired session.
    pub async fn find_session_user(&self, token_hash: &str, now: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, UserEntity>(
            "SELECT users.id, users.email, users.password_hash, users.is_admin, users.created_at
             FROM sessions JOIN users ON users.id = sessions.user_id
             WHERE sessions.token_hash = ? AND sessions.expires_at > ?",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch session: {e}")))?;

        Ok(user.map(Into::into))
    }

    pub async fn delete_session(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete session: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_expired_sessions(&self, now: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to purge sessions: {e}")))?;
        Ok(result.rows_affected())
    }
}
