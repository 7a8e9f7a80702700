use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: Option<String>,
}

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub is_admin: bool,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

impl SessionUser {
    /// Owners and admins may mutate a snippet.
    pub fn can_manage(&self, owner_id: i64) -> bool {
        self.id == owner_id || self.is_admin
    }
}

/// Login and registration body. Absent and `null` fields both count as missing.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Credentials {
    #[serde(default)]
    #[validate(email(message = "Email address is not valid"), length(max = 254))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1024))]
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }

    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }

    pub fn is_incomplete(&self) -> bool {
        self.email().trim().is_empty() || self.password().is_empty()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

impl From<Option<SessionUser>> for SessionStatus {
    fn from(user: Option<SessionUser>) -> Self {
        Self {
            authenticated: user.is_some(),
            user,
        }
    }
}
