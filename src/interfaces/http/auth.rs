use super::session::Viewer;
use super::HttpState;
use crate::application::SignedIn;
use crate::domain::error::AppError;
use crate::domain::user::{Credentials, SessionStatus};
use actix_web::{get, post, web, HttpResponse};
use serde_json::json;
use tracing::info;

#[get("/session")]
async fn session(viewer: Viewer) -> HttpResponse {
    HttpResponse::Ok().json(SessionStatus::from(viewer.user))
}

#[post("/register")]
async fn register(
    data: web::Data<HttpState>,
    req: web::Json<Credentials>,
) -> Result<HttpResponse, AppError> {
    let signed_in = data.auth.register(req.into_inner()).await?;
    Ok(signed_in_response(&data, HttpResponse::Created(), signed_in))
}

#[post("/login")]
async fn login(
    data: web::Data<HttpState>,
    req: web::Json<Credentials>,
) -> Result<HttpResponse, AppError> {
    let signed_in = data.auth.login(req.into_inner()).await?;
    info!(user_id = signed_in.user.id, "User logged in");
    Ok(signed_in_response(&data, HttpResponse::Ok(), signed_in))
}

#[post("/logout")]
async fn logout(data: web::Data<HttpState>, viewer: Viewer) -> Result<HttpResponse, AppError> {
    if let Some(token) = viewer.token.as_deref() {
        data.auth.logout(token).await?;
    }
    Ok(HttpResponse::Ok()
        .cookie(data.cookie.removal_cookie())
        .json(json!({ "ok": true })))
}

fn signed_in_response(
    data: &HttpState,
    mut builder: actix_web::HttpResponseBuilder,
    signed_in: SignedIn,
) -> HttpResponse {
    builder
        .cookie(data.cookie.session_cookie(&signed_in.token, signed_in.expires_at))
        .json(signed_in.user)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(session)
        .service(register)
        .service(login)
        .service(logout);
}
