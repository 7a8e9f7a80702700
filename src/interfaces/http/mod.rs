mod auth;
mod client;
pub mod error;
pub mod session;
mod snippets;

use crate::application::{AuthUseCase, SnippetUseCase};
use crate::domain::error::AppError;
use crate::infrastructure::config::AppConfig;
use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
use session::CookieSettings;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub struct HttpState {
    pub auth: Arc<AuthUseCase>,
    pub snippets: Arc<SnippetUseCase>,
    pub cookie: CookieSettings,
    pub static_dir: Option<PathBuf>,
}

/// Routes and extractor settings shared by the server and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid JSON body: {err}")).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid query string: {err}")).into()
    }))
    .service(
        web::scope("/api")
            .configure(auth::configure)
            .configure(snippets::configure),
    )
    .default_service(web::route().to(client::serve));
}

pub fn start_server(state: HttpState, config: &AppConfig) -> std::io::Result<Server> {
    let state = web::Data::new(state);
    let cors_permissive = config.cors_permissive;

    let server = HttpServer::new(move || {
        let cors = if cors_permissive {
            Cors::permissive()
        } else {
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::new("%r %s %Dms"))
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    info!(host = %config.host, port = config.port, "HTTP server listening");
    Ok(server)
}
