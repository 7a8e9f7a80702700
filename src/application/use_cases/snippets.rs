use crate::domain::error::{AppError, Result};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::snippet::{Snippet, SnippetFields, SnippetFilter, SnippetInput};
use crate::domain::snippet_type::{self, SnippetType};
use crate::domain::user::SessionUser;
use crate::infrastructure::db::{now_timestamp, HubRepository};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

/// Query parameters of the listing endpoint, already parsed.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub query: Option<String>,
    pub snippet_type: Option<String>,
    pub owned: bool,
    pub page: PageRequest,
}

pub struct SnippetUseCase {
    repository: Arc<HubRepository>,
}

impl SnippetUseCase {
    pub fn new(repository: Arc<HubRepository>) -> Self {
        Self { repository }
    }

    pub fn types(&self) -> &'static [SnippetType] {
        snippet_type::all()
    }

    pub async fn list(&self, query: ListQuery, viewer: Option<&SessionUser>) -> Result<Page<Snippet>> {
        let owner_id = if query.owned {
            match viewer {
                Some(user) => Some(user.id),
                None => return Err(unauthenticated()),
            }
        } else {
            None
        };

        let filter = SnippetFilter {
            query: query.query,
            snippet_type: query.snippet_type.map(|t| t.trim().to_string()),
            owner_id,
        };
        let (items, total) = self.repository.list_snippets(&filter, query.page).await?;
        let items = items
            .into_iter()
            .map(|snippet| with_permissions(snippet, viewer))
            .collect();

        Ok(Page::new(items, query.page, total))
    }

    pub async fn get(&self, snippet_id: i64, viewer: Option<&SessionUser>) -> Result<Snippet> {
        let snippet = self.repository.get_snippet(snippet_id).await?;
        Ok(with_permissions(snippet, viewer))
    }

    pub async fn create(&self, user: &SessionUser, input: SnippetInput) -> Result<Snippet> {
        input.validate()?;
        let (Some(type_id), Some(name)) = (input.trimmed_type(), input.trimmed_name()) else {
            return Err(AppError::ValidationError(
                "Type and name are required".to_string(),
            ));
        };

        let fields = resolve_fields(type_id, name, &input)?;
        let snippet_id = self
            .repository
            .insert_snippet(user.id, &fields, &now_timestamp())
            .await?;

        info!(snippet_id, user_id = user.id, snippet_type = %fields.snippet_type, "Created snippet");
        self.get(snippet_id, Some(user)).await
    }

    pub async fn update(&self, user: &SessionUser, snippet_id: i64, input: SnippetInput) -> Result<Snippet> {
        input.validate()?;
        let existing = self.repository.get_snippet(snippet_id).await?;
        if !user.can_manage(existing.user_id) {
            return Err(AppError::Forbidden(
                "Not allowed to update this snippet".to_string(),
            ));
        }

        let type_id = input.trimmed_type().unwrap_or(existing.snippet_type);
        let name = input.trimmed_name().unwrap_or(existing.name);
        let fields = resolve_fields(type_id, name, &input)?;
        self.repository
            .update_snippet(snippet_id, &fields, &now_timestamp())
            .await?;

        info!(snippet_id, user_id = user.id, "Updated snippet");
        self.get(snippet_id, Some(user)).await
    }

    pub async fn delete(&self, user: &SessionUser, snippet_id: i64) -> Result<()> {
        let existing = self.repository.get_snippet(snippet_id).await?;
        if !user.can_manage(existing.user_id) {
            return Err(AppError::Forbidden(
                "Not allowed to delete this snippet".to_string(),
            ));
        }

        self.repository.delete_snippet(snippet_id).await?;
        info!(snippet_id, user_id = user.id, "Deleted snippet");
        Ok(())
    }
}

fn resolve_fields(type_id: String, name: String, input: &SnippetInput) -> Result<SnippetFields> {
    let snippet_type = snippet_type::find(&type_id).ok_or_else(|| {
        AppError::ValidationError(format!("Unknown snippet type: {type_id}"))
    })?;

    let metadata = snippet_type::normalize_metadata(snippet_type, input.metadata_map()?);
    snippet_type::validate_metadata(snippet_type, &metadata)?;

    Ok(SnippetFields {
        snippet_type: type_id,
        name,
        description: input.description.clone().unwrap_or_default(),
        script: input.script.clone().unwrap_or_default(),
        metadata: Value::Object(metadata),
    })
}

fn with_permissions(mut snippet: Snippet, viewer: Option<&SessionUser>) -> Snippet {
    snippet.can_manage = viewer.is_some_and(|user| user.can_manage(snippet.user_id));
    snippet
}

fn unauthenticated() -> AppError {
    AppError::Unauthorized("Authentication required".to_string())
}
