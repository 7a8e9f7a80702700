use super::error::ErrorBody;
use super::HttpState;
use crate::infrastructure::storage::{client_index, is_file};
use actix_web::http::Method;
use actix_web::{web, HttpRequest, HttpResponse};
use std::path::{Component, Path, PathBuf};
use tracing::error;

const MISSING_BUILD: &str =
    "Frontend build not found. Build the client bundle into the configured static directory.";

/// Fallback for everything outside `/api`: files from the client bundle,
/// then `index.html` for client-side routes.
pub async fn serve(req: HttpRequest, data: web::Data<HttpState>) -> HttpResponse {
    if req.method() != Method::GET || req.path().starts_with("/api") {
        return HttpResponse::NotFound().json(ErrorBody::new("Not found"));
    }

    let Some(static_dir) = data.static_dir.as_deref() else {
        return HttpResponse::NotFound().json(ErrorBody::new("Not found"));
    };

    if let Some(file) = bundle_file(static_dir, req.path()).await {
        return send_file(&file).await;
    }

    match client_index(static_dir).await {
        Some(index) => send_file(&index).await,
        None => HttpResponse::ServiceUnavailable()
            .content_type("text/plain; charset=utf-8")
            .body(MISSING_BUILD),
    }
}

/// Resolves a request path inside the bundle. Paths that try to climb out
/// of the directory resolve to nothing.
async fn bundle_file(static_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative.as_os_str().is_empty()
        || relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
    {
        return None;
    }
    let candidate = static_dir.join(relative);
    is_file(&candidate).await.then_some(candidate)
}

async fn send_file(path: &Path) -> HttpResponse {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            HttpResponse::Ok().content_type(mime.as_ref()).body(bytes)
        }
        Err(e) => {
            error!(error = %e, path = %path.display(), "Failed to read client file");
            HttpResponse::InternalServerError().json(ErrorBody::new("Internal server error"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bundle_file_stays_inside_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/app.js"), "app();").unwrap();

        assert_eq!(
            bundle_file(dir.path(), "/assets/app.js").await,
            Some(dir.path().join("assets/app.js"))
        );
        assert!(bundle_file(dir.path(), "/").await.is_none());
        assert!(bundle_file(dir.path(), "/assets").await.is_none());
        assert!(bundle_file(dir.path(), "/../secret").await.is_none());
        assert!(bundle_file(dir.path(), "/missing.css").await.is_none());
    }
}
