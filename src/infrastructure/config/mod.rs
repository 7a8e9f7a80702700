use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "SnippetHub.toml";
pub const ENV_PREFIX: &str = "SNIPPET_HUB_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub session_ttl_hours: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub admin_emails: Vec<String>,
    pub static_dir: Option<PathBuf>,
    pub cors_permissive: bool,
    pub password_iterations: u32,
    pub seed_owner_email: String,
    pub seed_owner_password: String,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_url: "sqlite://data/snippets.db".to_string(),
            session_ttl_hours: 24 * 7,
            cookie_name: "snippet_hub_session".to_string(),
            cookie_secure: false,
            admin_emails: Vec::new(),
            static_dir: Some(PathBuf::from("client/dist")),
            cors_permissive: false,
            password_iterations: 100_000,
            seed_owner_email: "library@servicenow.dev".to_string(),
            seed_owner_password: "changeme".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `SnippetHub.toml`, then `SNIPPET_HUB_*` variables.
    /// A `.env` file is read first so its values land in the environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::figment(CONFIG_FILE).extract().map_err(|e| {
            AppError::ValidationError(format!("Failed to load configuration: {}", e))
        })
    }

    pub fn figment(config_file: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.session_ttl(), chrono::Duration::days(7));
        assert_eq!(config.seed_owner_email, "library@servicenow.dev");
    }

    #[test]
    fn test_figment_layers_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                port = 8080
                admin_emails = ["Admin@Example.com"]
                "#,
            )?;
            jail.set_env("SNIPPET_HUB_HOST", "0.0.0.0");
            jail.set_env("SNIPPET_HUB_SESSION_TTL_HOURS", "2");

            let config: AppConfig = AppConfig::figment(CONFIG_FILE).extract()?;
            assert_eq!(config.port, 8080);
            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.session_ttl_hours, 2);
            assert_eq!(config.admin_emails, vec!["Admin@Example.com".to_string()]);
            Ok(())
        });
    }
}
