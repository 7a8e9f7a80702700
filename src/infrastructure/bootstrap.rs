use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::{AuthUseCase, ImportUseCase, MaintenanceUseCase, SnippetUseCase};
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::HubRepository;
use crate::infrastructure::security::PasswordHasher;
use crate::infrastructure::storage::client_index;
use crate::interfaces::http::session::CookieSettings;
use crate::interfaces::http::HttpState;

/// Opens the database named by the configuration.
pub async fn open_repository(config: &AppConfig) -> Result<Arc<HubRepository>> {
    let repository = HubRepository::connect(&config.database_url)
        .await
        .map_err(|err| {
            error!(error = %err, database_url = %config.database_url, "Failed to open database");
            err
        })?;
    info!(database_url = %config.database_url, "Database ready");
    Ok(Arc::new(repository))
}

/// Wires the repository, use cases and cookie settings for the HTTP server.
pub async fn setup_http(config: &AppConfig) -> Result<HttpState> {
    let repository = open_repository(config).await?;

    let auth = Arc::new(AuthUseCase::new(
        repository.clone(),
        PasswordHasher::new(config.password_iterations),
        config.session_ttl(),
        config.admin_emails.clone(),
    ));
    match auth.purge_expired_sessions().await {
        Ok(0) => {}
        Ok(purged) => info!(purged, "Removed expired sessions"),
        Err(err) => warn!(error = %err, "Failed to purge expired sessions"),
    }

    if let Some(static_dir) = config.static_dir.as_deref() {
        if client_index(static_dir).await.is_none() {
            warn!(
                static_dir = %static_dir.display(),
                "Client bundle not built; non-API requests will answer 503"
            );
        }
    }

    Ok(HttpState {
        auth,
        snippets: Arc::new(SnippetUseCase::new(repository)),
        cookie: CookieSettings {
            name: config.cookie_name.clone(),
            secure: config.cookie_secure,
        },
        static_dir: config.static_dir.clone(),
    })
}

/// Use cases driven by the `snippet-admin` tool.
pub struct AdminServices {
    pub repository: Arc<HubRepository>,
    pub import: ImportUseCase,
    pub maintenance: MaintenanceUseCase,
}

pub async fn setup_admin(config: &AppConfig) -> Result<AdminServices> {
    let repository = open_repository(config).await?;
    Ok(AdminServices {
        import: ImportUseCase::new(
            repository.clone(),
            PasswordHasher::new(config.password_iterations),
            config.seed_owner_email.clone(),
            config.seed_owner_password.clone(),
        ),
        maintenance: MaintenanceUseCase::new(repository.clone()),
        repository,
    })
}
