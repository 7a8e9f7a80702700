use super::HttpState;
use crate::domain::error::{AppError, Result};
use crate::domain::user::SessionUser;
use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Session cookie attributes.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
}

impl CookieSettings {
    /// Cookie lifetime follows the server-side session expiry.
    pub fn session_cookie(&self, token: &str, expires_at: DateTime<Utc>) -> Cookie<'static> {
        let max_age = (expires_at - Utc::now()).num_seconds().max(0);
        Cookie::build(self.name.clone(), token.to_string())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::seconds(max_age))
            .finish()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build(self.name.clone(), "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::ZERO)
            .finish()
    }
}

/// The caller behind a request, resolved from the session cookie.
/// Anonymous requests extract successfully with `user: None`.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub user: Option<SessionUser>,
    pub token: Option<String>,
}

impl Viewer {
    pub fn require(&self) -> Result<&SessionUser> {
        self.user
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

impl FromRequest for Viewer {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<HttpState>>().cloned() else {
            return Box::pin(async {
                Err(AppError::Internal("HTTP state is not configured".to_string()))
            });
        };
        let token = req
            .cookie(&state.cookie.name)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty());

        Box::pin(async move {
            let Some(token) = token else {
                return Ok(Viewer::default());
            };
            let user = state.auth.current_user(&token).await?;
            if user.is_none() {
                debug!("Ignoring unknown or expired session cookie");
            }
            Ok(Viewer {
                user,
                token: Some(token),
            })
        })
    }
}
