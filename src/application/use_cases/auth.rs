use crate::domain::error::{AppError, Result};
use crate::domain::user::{Credentials, SessionUser};
use crate::infrastructure::db::{timestamp, HubRepository};
use crate::infrastructure::security::token::{generate_token, hash_token};
use crate::infrastructure::security::PasswordHasher;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// A freshly opened session. `token` goes into the session cookie.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: SessionUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthUseCase {
    repository: Arc<HubRepository>,
    hasher: PasswordHasher,
    session_ttl: Duration,
    admin_emails: Vec<String>,
}

impl AuthUseCase {
    pub fn new(
        repository: Arc<HubRepository>,
        hasher: PasswordHasher,
        session_ttl: Duration,
        admin_emails: Vec<String>,
    ) -> Self {
        Self {
            repository,
            hasher,
            session_ttl,
            admin_emails,
        }
    }

    pub async fn register(&self, credentials: Credentials) -> Result<SignedIn> {
        let credentials = checked(credentials)?;

        if self
            .repository
            .find_user_by_email(credentials.email())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password_hash = self.hasher.hash(credentials.password());
        let is_admin = self.is_admin_email(credentials.email());
        let user = self
            .repository
            .insert_user(credentials.email(), &password_hash, is_admin)
            .await?;

        info!(user_id = user.id, is_admin, "Registered user");
        self.open_session(SessionUser::from(&user)).await
    }

    pub async fn login(&self, credentials: Credentials) -> Result<SignedIn> {
        let credentials = checked(credentials)?;

        let user = self
            .repository
            .find_user_by_email(credentials.email())
            .await?
            .filter(|user| self.hasher.verify(credentials.password(), &user.password_hash));

        let Some(mut user) = user else {
            warn!("Rejected login attempt");
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        };

        if !user.is_admin && self.is_admin_email(&user.email) {
            self.repository.set_user_admin(user.id, true).await?;
            user.is_admin = true;
            info!(user_id = user.id, "Promoted configured admin");
        }

        self.open_session(SessionUser::from(&user)).await
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        self.repository.delete_session(&hash_token(token)).await?;
        Ok(())
    }

    /// Resolves a session cookie to its user. Unknown or expired tokens
    /// resolve to `None`.
    pub async fn current_user(&self, token: &str) -> Result<Option<SessionUser>> {
        let now = timestamp(Utc::now());
        let user = self
            .repository
            .find_session_user(&hash_token(token), &now)
            .await?;
        Ok(user.as_ref().map(SessionUser::from))
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        self.repository
            .delete_expired_sessions(&timestamp(Utc::now()))
            .await
    }

    async fn open_session(&self, user: SessionUser) -> Result<SignedIn> {
        let token = generate_token();
        let created_at = Utc::now();
        let expires_at = created_at + self.session_ttl;

        self.repository
            .insert_session(
                &Uuid::new_v4().to_string(),
                &hash_token(&token),
                user.id,
                &timestamp(created_at),
                &timestamp(expires_at),
            )
            .await?;

        Ok(SignedIn {
            user,
            token,
            expires_at,
        })
    }

    fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email))
    }
}

fn checked(mut credentials: Credentials) -> Result<Credentials> {
    if credentials.is_incomplete() {
        return Err(AppError::ValidationError(
            "Email and password are required".to_string(),
        ));
    }
    credentials.email = Some(credentials.email().trim().to_string());
    credentials.validate()?;
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::repository::in_memory;

    async fn use_case(admins: &[&str]) -> AuthUseCase {
        AuthUseCase::new(
            Arc::new(in_memory().await),
            PasswordHasher::new(1_000),
            Duration::hours(1),
            admins.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials::new(email, password)
    }

    #[tokio::test]
    async fn test_register_opens_session() {
        let auth = use_case(&[]).await;
        let signed_in = auth.register(creds(" dev@example.com ", "pw")).await.unwrap();
        assert_eq!(signed_in.user.email, "dev@example.com");
        assert!(!signed_in.user.is_admin);

        let current = auth.current_user(&signed_in.token).await.unwrap().unwrap();
        assert_eq!(current, signed_in.user);
    }

    #[tokio::test]
    async fn test_register_rejects_missing_and_duplicate() {
        let auth = use_case(&[]).await;
        assert!(matches!(
            auth.register(creds("", "pw")).await,
            Err(AppError::ValidationError(msg)) if msg == "Email and password are required"
        ));
        assert!(matches!(
            auth.register(creds("not-an-email", "pw")).await,
            Err(AppError::ValidationError(_))
        ));
        auth.register(creds("dev@example.com", "pw")).await.unwrap();
        assert!(matches!(
            auth.register(creds("dev@example.com", "other")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let auth = use_case(&[]).await;
        auth.register(creds("dev@example.com", "pw")).await.unwrap();

        assert!(auth.login(creds("dev@example.com", "pw")).await.is_ok());
        assert!(matches!(
            auth.login(creds("dev@example.com", "wrong")).await,
            Err(AppError::Unauthorized(msg)) if msg == "Invalid credentials"
        ));
        assert!(matches!(
            auth.login(creds("ghost@example.com", "pw")).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_emails_are_promoted() {
        let auth = use_case(&[" Boss@Example.com "]).await;
        let signed_in = auth.register(creds("boss@example.com", "pw")).await.unwrap();
        assert!(signed_in.user.is_admin);

        let plain = use_case(&[]).await;
        plain.register(creds("late@example.com", "pw")).await.unwrap();
        let promoted = AuthUseCase::new(
            plain.repository.clone(),
            PasswordHasher::new(1_000),
            Duration::hours(1),
            vec!["late@example.com".to_string()],
        );
        let signed_in = promoted.login(creds("late@example.com", "pw")).await.unwrap();
        assert!(signed_in.user.is_admin);
    }

    #[tokio::test]
    async fn test_logout_and_expiry() {
        let auth = use_case(&[]).await;
        let signed_in = auth.register(creds("dev@example.com", "pw")).await.unwrap();
        auth.logout(&signed_in.token).await.unwrap();
        assert!(auth.current_user(&signed_in.token).await.unwrap().is_none());
        assert!(auth.current_user("garbage").await.unwrap().is_none());

        let expired = AuthUseCase::new(
            auth.repository.clone(),
            PasswordHasher::new(1_000),
            Duration::hours(-1),
            Vec::new(),
        );
        let stale = expired.login(creds("dev@example.com", "pw")).await.unwrap();
        assert!(expired.current_user(&stale.token).await.unwrap().is_none());
        assert_eq!(expired.purge_expired_sessions().await.unwrap(), 1);
    }
}
