use super::session::Viewer;
use super::HttpState;
use crate::application::ListQuery;
use crate::domain::error::AppError;
use crate::domain::pagination::PageRequest;
use crate::domain::snippet::SnippetInput;
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

/// Raw listing parameters. Numbers arrive as text so malformed values fall
/// back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub snippet_type: Option<String>,
    pub owned: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        let number = |value: Option<&str>| value.and_then(|v| v.trim().parse::<i64>().ok());
        ListQuery {
            query: params.q.filter(|q| !q.trim().is_empty()),
            snippet_type: params.snippet_type.filter(|t| !t.trim().is_empty()),
            owned: matches!(params.owned.as_deref().map(str::trim), Some("true" | "1")),
            page: PageRequest::new(number(params.page.as_deref()), number(params.limit.as_deref())),
        }
    }
}

fn snippet_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::NotFound("Snippet not found".to_string()))
}

#[get("/snippet-types")]
async fn snippet_types(data: web::Data<HttpState>) -> HttpResponse {
    HttpResponse::Ok().json(data.snippets.types())
}

#[get("/snippets")]
async fn list_snippets(
    data: web::Data<HttpState>,
    viewer: Viewer,
    params: web::Query<ListParams>,
) -> Result<HttpResponse, AppError> {
    let page = data
        .snippets
        .list(params.into_inner().into(), viewer.user.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/snippets/{id}")]
async fn get_snippet(
    data: web::Data<HttpState>,
    viewer: Viewer,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let snippet = data
        .snippets
        .get(snippet_id(&path)?, viewer.user.as_ref())
        .await?;
    Ok(HttpResponse::Ok().json(snippet))
}

#[post("/snippets")]
async fn create_snippet(
    data: web::Data<HttpState>,
    viewer: Viewer,
    req: web::Json<SnippetInput>,
) -> Result<HttpResponse, AppError> {
    let user = viewer.require()?;
    let snippet = data.snippets.create(user, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(snippet))
}

#[put("/snippets/{id}")]
async fn update_snippet(
    data: web::Data<HttpState>,
    viewer: Viewer,
    path: web::Path<String>,
    req: web::Json<SnippetInput>,
) -> Result<HttpResponse, AppError> {
    let user = viewer.require()?;
    let snippet = data
        .snippets
        .update(user, snippet_id(&path)?, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(snippet))
}

#[delete("/snippets/{id}")]
async fn delete_snippet(
    data: web::Data<HttpState>,
    viewer: Viewer,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = viewer.require()?;
    data.snippets.delete(user, snippet_id(&path)?).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(snippet_types)
        .service(list_snippets)
        .service(get_snippet)
        .service(create_snippet)
        .service(update_snippet)
        .service(delete_snippet);
}
