use crate::domain::error::{AppError, Result};
use crate::domain::pagination::PageRequest;
use crate::domain::snippet::{Snippet, SnippetFields, SnippetFilter};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite};

use super::entities::SnippetEntity;
use super::HubRepository;

const SELECT_WITH_OWNER: &str = "SELECT snippets.id, snippets.user_id, snippets.type, snippets.name, \
     snippets.description, snippets.script, snippets.metadata, snippets.created_at, \
     snippets.updated_at, users.email AS owner_email \
     FROM snippets LEFT JOIN users ON users.id = snippets.user_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TypeCount {
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub snippet_type: String,
    pub count: i64,
}

impl HubRepository {
    pub async fn list_snippets(
        &self,
        filter: &SnippetFilter,
        page: PageRequest,
    ) -> Result<(Vec<Snippet>, i64)> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM snippets");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count snippets: {e}")))?;

        let mut select = QueryBuilder::<Sqlite>::new(SELECT_WITH_OWNER);
        push_filters(&mut select, filter);
        select.push(" ORDER BY snippets.updated_at DESC, snippets.id DESC LIMIT ");
        select.push_bind(page.limit);
        select.push(" OFFSET ");
        select.push_bind(page.offset());

        let rows = select
            .build_query_as::<SnippetEntity>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list snippets: {e}")))?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    pub async fn list_all_snippets(&self) -> Result<Vec<Snippet>> {
        let rows = sqlx::query_as::<_, SnippetEntity>(&format!(
            "{SELECT_WITH_OWNER} ORDER BY snippets.updated_at DESC, snippets.id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list snippets: {e}")))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_snippet(&self, snippet_id: i64) -> Result<Snippet> {
        let row = sqlx::query_as::<_, SnippetEntity>(&format!(
            "{SELECT_WITH_OWNER} WHERE snippets.id = ?"
        ))
        .bind(snippet_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch snippet: {e}")))?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(AppError::NotFound("Snippet not found".to_string())),
        }
    }

    pub async fn insert_snippet(&self, user_id: i64, fields: &SnippetFields, now: &str) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO snippets (user_id, type, name, description, script, metadata, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&fields.snippet_type)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.script)
        .bind(fields.metadata.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert snippet: {e}")))?;

        Ok(result.last_insert_rowid())
    }

    pub async fn update_snippet(&self, snippet_id: i64, fields: &SnippetFields, now: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE snippets SET type = ?, name = ?, description = ?, script = ?, metadata = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&fields.snippet_type)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.script)
        .bind(fields.metadata.to_string())
        .bind(now)
        .bind(snippet_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update snippet: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Snippet not found".to_string()));
        }
        Ok(())
    }

    /// Refreshes the imported content of an existing snippet, leaving its
    /// type, name and owner untouched.
    pub async fn refresh_snippet_content(
        &self,
        snippet_id: i64,
        description: &str,
        script: &str,
        metadata: &serde_json::Value,
        now: &str,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE snippets SET description = ?, script = ?, metadata = ?, updated_at = ? WHERE id = ?",
        )
        .bind(description)
        .bind(script)
        .bind(metadata.to_string())
        .bind(now)
        .bind(snippet_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to refresh snippet: {e}")))?;
        Ok(())
    }

    pub async fn delete_snippet(&self, snippet_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM snippets WHERE id = ?")
            .bind(snippet_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete snippet: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_snippet_id(&self, snippet_type: &str, name: &str) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM snippets WHERE type = ? AND name = ? LIMIT 1")
            .bind(snippet_type)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to look up snippet: {e}")))
    }

    pub async fn count_snippets_by_type(&self) -> Result<Vec<TypeCount>> {
        sqlx::query_as::<_, TypeCount>(
            "SELECT type, COUNT(*) AS count FROM snippets GROUP BY type ORDER BY count DESC, type",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to count snippets: {e}")))
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &SnippetFilter) {
    let mut joiner = " WHERE ";

    if let Some(query) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like(query));
        builder.push(joiner);
        builder.push("(");
        for (index, column) in ["snippets.name", "snippets.description", "snippets.script", "snippets.metadata"]
            .iter()
            .enumerate()
        {
            if index > 0 {
                builder.push(" OR ");
            }
            builder.push(*column);
            builder.push(" LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\'");
        }
        builder.push(")");
        joiner = " AND ";
    }

    if let Some(snippet_type) = filter.snippet_type.as_deref().filter(|t| !t.is_empty()) {
        builder.push(joiner);
        builder.push("snippets.type = ");
        builder.push_bind(snippet_type.to_string());
        joiner = " AND ";
    }

    if let Some(owner_id) = filter.owner_id {
        builder.push(joiner);
        builder.push("snippets.user_id = ");
        builder.push_bind(owner_id);
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::super::in_memory;
    use super::*;
    use serde_json::json;

    fn fields(snippet_type: &str, name: &str, script: &str) -> SnippetFields {
        SnippetFields {
            snippet_type: snippet_type.to_string(),
            name: name.to_string(),
            description: format!("{name} description"),
            script: script.to_string(),
            metadata: json!({ "table": "incident" }),
        }
    }

    async fn seeded() -> (HubRepository, i64, i64) {
        let repo = in_memory().await;
        let alice = repo.insert_user("alice@example.com", "hash", false).await.unwrap().id;
        let bob = repo.insert_user("bob@example.com", "hash", false).await.unwrap().id;
        repo.insert_snippet(alice, &fields("business_rule", "Close children", "current.update();"), "2024-01-01T00:00:00.000Z")
            .await
            .unwrap();
        repo.insert_snippet(bob, &fields("client_script", "Hide field", "g_form.setDisplay('x', false);"), "2024-01-02T00:00:00.000Z")
            .await
            .unwrap();
        repo.insert_snippet(alice, &fields("client_script", "100% width", "g_form.flash();"), "2024-01-03T00:00:00.000Z")
            .await
            .unwrap();
        (repo, alice, bob)
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
    }

    #[tokio::test]
    async fn test_list_orders_by_updated_at_with_owner() {
        let (repo, _, _) = seeded().await;
        let (items, total) = repo
            .list_snippets(&SnippetFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 3);
        let names: Vec<_> = items.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["100% width", "Hide field", "Close children"]);
        assert_eq!(items[1].owner.as_ref().unwrap().email, "bob@example.com");
        assert_eq!(items[0].metadata["table"], "incident");
    }

    #[tokio::test]
    async fn test_list_filters_combine() {
        let (repo, alice, _) = seeded().await;

        let by_type = SnippetFilter {
            snippet_type: Some("client_script".into()),
            ..Default::default()
        };
        assert_eq!(repo.list_snippets(&by_type, PageRequest::default()).await.unwrap().1, 2);

        let by_query = SnippetFilter {
            query: Some("G_FORM".into()),
            owner_id: Some(alice),
            ..Default::default()
        };
        let (items, total) = repo.list_snippets(&by_query, PageRequest::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].name, "100% width");

        let literal_percent = SnippetFilter {
            query: Some("100%".into()),
            ..Default::default()
        };
        assert_eq!(repo.list_snippets(&literal_percent, PageRequest::default()).await.unwrap().1, 1);

        let metadata_match = SnippetFilter {
            query: Some("incident".into()),
            ..Default::default()
        };
        assert_eq!(repo.list_snippets(&metadata_match, PageRequest::default()).await.unwrap().1, 3);
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let (repo, _, _) = seeded().await;
        let (items, total) = repo
            .list_snippets(&SnippetFilter::default(), PageRequest::new(Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Close children");
    }

    #[tokio::test]
    async fn test_update_refresh_and_delete() {
        let (repo, _, _) = seeded().await;
        let id = repo.find_snippet_id("business_rule", "Close children").await.unwrap().unwrap();

        let mut changed = fields("business_rule", "Close all children", "gs.log('x');");
        changed.metadata = json!({ "when": "after" });
        repo.update_snippet(id, &changed, "2024-02-01T00:00:00.000Z").await.unwrap();
        let updated = repo.get_snippet(id).await.unwrap();
        assert_eq!(updated.name, "Close all children");
        assert_eq!(updated.updated_at.as_deref(), Some("2024-02-01T00:00:00.000Z"));
        assert_eq!(updated.created_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));

        repo.refresh_snippet_content(id, "fresh", "new();", &json!({}), "2024-03-01T00:00:00.000Z")
            .await
            .unwrap();
        let refreshed = repo.get_snippet(id).await.unwrap();
        assert_eq!(refreshed.description, "fresh");
        assert_eq!(refreshed.name, "Close all children");

        assert!(repo.delete_snippet(id).await.unwrap());
        assert!(!repo.delete_snippet(id).await.unwrap());
        assert!(matches!(repo.get_snippet(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            repo.update_snippet(id, &changed, "2024-04-01T00:00:00.000Z").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_count_by_type() {
        let (repo, _, _) = seeded().await;
        let counts = repo.count_snippets_by_type().await.unwrap();
        assert_eq!(
            counts,
            vec![
                TypeCount { snippet_type: "client_script".into(), count: 2 },
                TypeCount { snippet_type: "business_rule".into(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_metadata_surfaces_as_empty_object() {
        let (repo, _, _) = seeded().await;
        let id = repo.find_snippet_id("client_script", "Hide field").await.unwrap().unwrap();
        sqlx::query("UPDATE snippets SET metadata = 'not json' WHERE id = ?")
            .bind(id)
            .execute(repo.pool())
            .await
            .unwrap();
        assert_eq!(repo.get_snippet(id).await.unwrap().metadata, json!({}));
    }
}
