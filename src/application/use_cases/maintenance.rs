use crate::domain::error::Result;
use crate::domain::snippet::Snippet;
use crate::infrastructure::db::repository::TypeCount;
use crate::infrastructure::db::HubRepository;
use crate::infrastructure::storage::ensure_parent_dir;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct LibraryStats {
    pub total: i64,
    pub by_type: Vec<TypeCount>,
}

/// Offline library chores run from the admin command line.
pub struct MaintenanceUseCase {
    repository: Arc<HubRepository>,
}

impl MaintenanceUseCase {
    pub fn new(repository: Arc<HubRepository>) -> Self {
        Self { repository }
    }

    /// Writes every snippet, newest first, as pretty-printed JSON.
    pub async fn export(&self, path: &Path) -> Result<usize> {
        let snippets: Vec<Snippet> = self.repository.list_all_snippets().await?;
        ensure_parent_dir(path)?;
        let json = serde_json::to_string_pretty(&snippets)?;
        tokio::fs::write(path, json).await?;
        info!(count = snippets.len(), path = %path.display(), "Exported snippets");
        Ok(snippets.len())
    }

    pub async fn stats(&self) -> Result<LibraryStats> {
        let by_type = self.repository.count_snippets_by_type().await?;
        let total = by_type.iter().map(|entry| entry.count).sum();
        Ok(LibraryStats { total, by_type })
    }

    /// Deletes by id and reports which ids existed.
    pub async fn delete(&self, snippet_ids: &[i64]) -> Result<Vec<(i64, bool)>> {
        let mut outcome = Vec::with_capacity(snippet_ids.len());
        for &snippet_id in snippet_ids {
            let deleted = self.repository.delete_snippet(snippet_id).await?;
            info!(snippet_id, deleted, "Delete requested");
            outcome.push((snippet_id, deleted));
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snippet::SnippetFields;
    use crate::infrastructure::db::repository::in_memory;
    use serde_json::json;

    async fn seeded() -> (MaintenanceUseCase, i64) {
        let repo = Arc::new(in_memory().await);
        let owner = repo.insert_user("library@servicenow.dev", "hash", false).await.unwrap();
        let mut first = 0;
        for (index, snippet_type) in ["business_rule", "client_script", "client_script"].iter().enumerate() {
            let fields = SnippetFields {
                snippet_type: snippet_type.to_string(),
                name: format!("Snippet {index}"),
                description: String::new(),
                script: "gs.info('x');".into(),
                metadata: json!({ "application": "Global" }),
            };
            let id = repo
                .insert_snippet(owner.id, &fields, &format!("2024-01-0{}T00:00:00.000Z", index + 1))
                .await
                .unwrap();
            if index == 0 {
                first = id;
            }
        }
        (MaintenanceUseCase::new(repo), first)
    }

    #[tokio::test]
    async fn test_export_writes_pretty_json() {
        let (maintenance, _) = seeded().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/snippets.json");

        assert_eq!(maintenance.export(&path).await.unwrap(), 3);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  {"));
        let exported: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(exported[0]["name"], "Snippet 2");
        assert_eq!(exported[0]["canManage"], false);
        assert_eq!(exported[0]["owner"]["email"], "library@servicenow.dev");
    }

    #[tokio::test]
    async fn test_stats_and_delete() {
        let (maintenance, first) = seeded().await;
        let stats = maintenance.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_type[0].snippet_type, "client_script");

        let outcome = maintenance.delete(&[first, 999]).await.unwrap();
        assert_eq!(outcome, vec![(first, true), (999, false)]);
        assert_eq!(maintenance.stats().await.unwrap().total, 2);
    }
}
