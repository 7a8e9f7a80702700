use crate::domain::snippet::{Snippet, SnippetOwner};
use crate::domain::user::User;

#[derive(sqlx::FromRow)]
pub(super) struct UserEntity {
    id: i64,
    email: String,
    password_hash: String,
    is_admin: i64,
    created_at: Option<String>,
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            password_hash: entity.password_hash,
            is_admin: entity.is_admin != 0,
            created_at: entity.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct SnippetEntity {
    id: i64,
    user_id: i64,
    #[sqlx(rename = "type")]
    snippet_type: String,
    name: String,
    description: Option<String>,
    script: Option<String>,
    metadata: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    owner_email: Option<String>,
}

impl From<SnippetEntity> for Snippet {
    fn from(entity: SnippetEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            snippet_type: entity.snippet_type,
            name: entity.name,
            description: entity.description.unwrap_or_default(),
            script: entity.script.unwrap_or_default(),
            metadata: Snippet::parse_metadata(entity.metadata.as_deref()),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            owner: entity.owner_email.map(|email| SnippetOwner { email }),
            can_manage: false,
        }
    }
}
