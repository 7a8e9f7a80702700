//! Imports snippets from a checkout of the community code-snippets
//! repository.

pub mod business_rule;
pub mod files;
pub mod metadata;
pub mod readme;

use crate::domain::error::{AppError, Result};
use crate::domain::snippet::SnippetFields;
use crate::infrastructure::db::{now_timestamp, HubRepository};
use crate::infrastructure::security::PasswordHasher;
use crate::infrastructure::storage::is_dir;
use files::{SourceInfo, WidgetFiles};
use metadata::{MetadataBuilder, SnippetSource};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const BUSINESS_RULE_EXTENSIONS: [&str; 2] = ["js", "jss"];
const SCRIPT_EXTENSIONS: [&str; 3] = ["js", "jss", "ts"];

#[derive(Clone, Copy)]
enum Reader {
    /// First script file of the folder.
    FirstScript,
    /// All script files, concatenated.
    Scripts(MetadataBuilder),
    Widget,
}

#[derive(Clone, Copy)]
pub struct Category {
    pub label: &'static str,
    pub snippet_type: &'static str,
    pub directory: &'static str,
    reader: Reader,
}

pub const BUSINESS_RULES: Category = Category {
    label: "Business Rules",
    snippet_type: "business_rule",
    directory: "Business Rules",
    reader: Reader::FirstScript,
};

pub const CATEGORIES: [Category; 9] = [
    BUSINESS_RULES,
    Category {
        label: "Client Scripts",
        snippet_type: "client_script",
        directory: "Client Scripts",
        reader: Reader::Scripts(metadata::client_script),
    },
    Category {
        label: "UI Actions",
        snippet_type: "ui_action",
        directory: "UI Actions",
        reader: Reader::Scripts(metadata::ui_action),
    },
    Category {
        label: "Script Includes",
        snippet_type: "script_include",
        directory: "Script Includes",
        reader: Reader::Scripts(metadata::script_include),
    },
    Category {
        label: "Scheduled Jobs",
        snippet_type: "scheduled_job",
        directory: "Scheduled Jobs",
        reader: Reader::Scripts(metadata::scheduled_job),
    },
    Category {
        label: "Inbound Actions",
        snippet_type: "inbound_action",
        directory: "Inbound Actions",
        reader: Reader::Scripts(metadata::inbound_action),
    },
    Category {
        label: "Fix scripts",
        snippet_type: "fix_script",
        directory: "Fix scripts",
        reader: Reader::Scripts(metadata::fix_script),
    },
    Category {
        label: "Service Portal Widgets",
        snippet_type: "service_portal_widget",
        directory: "Service Portal Widgets",
        reader: Reader::Widget,
    },
    Category {
        label: "Mail Scripts",
        snippet_type: "mail_script",
        directory: "Mail Scripts",
        reader: Reader::Scripts(metadata::mail_script),
    },
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub category: String,
    pub created: usize,
    pub updated: usize,
    pub skipped: Vec<String>,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} added, {} updated, {} skipped.",
            self.category,
            self.created,
            self.updated,
            self.skipped.len()
        )?;
        if !self.skipped.is_empty() {
            write!(f, "\n  Skipped: {}", self.skipped.join(", "))?;
        }
        Ok(())
    }
}

/// One snippet folder turned into storable content.
#[derive(Debug)]
struct ImportedSnippet {
    name: String,
    description: String,
    script: String,
    metadata: Map<String, Value>,
}

enum Upsert {
    Created,
    Updated,
}

pub struct ImportUseCase {
    repository: Arc<HubRepository>,
    hasher: PasswordHasher,
    owner_email: String,
    owner_password: String,
}

impl ImportUseCase {
    pub fn new(
        repository: Arc<HubRepository>,
        hasher: PasswordHasher,
        owner_email: String,
        owner_password: String,
    ) -> Self {
        Self {
            repository,
            hasher,
            owner_email,
            owner_password,
        }
    }

    /// Imports every known category found under `root`. Missing category
    /// folders are reported with zero counts.
    pub async fn import_all(&self, root: &Path) -> Result<Vec<ImportSummary>> {
        let owner_id = self.ensure_owner().await?;
        let mut summaries = Vec::with_capacity(CATEGORIES.len());

        for category in &CATEGORIES {
            let dir = root.join(category.directory);
            if !is_dir(&dir).await {
                warn!(
                    category = category.label,
                    dir = %dir.display(),
                    "Skipping category, directory not found"
                );
                summaries.push(ImportSummary {
                    category: category.label.to_string(),
                    ..Default::default()
                });
                continue;
            }
            summaries.push(self.import_category(category, &dir, owner_id).await?);
        }

        Ok(summaries)
    }

    /// Imports a single Business Rules folder, which must exist.
    pub async fn import_business_rules(&self, dir: &Path) -> Result<ImportSummary> {
        if !is_dir(dir).await {
            return Err(AppError::NotFound(format!(
                "Business Rules directory not found at {}",
                dir.display()
            )));
        }
        let owner_id = self.ensure_owner().await?;
        self.import_category(&BUSINESS_RULES, dir, owner_id).await
    }

    /// Returns the seed owner's id, creating the account on first use.
    pub async fn ensure_owner(&self) -> Result<i64> {
        if let Some(user) = self.repository.find_user_by_email(&self.owner_email).await? {
            return Ok(user.id);
        }
        let password_hash = self.hasher.hash(&self.owner_password);
        let user = self
            .repository
            .insert_user(&self.owner_email, &password_hash, false)
            .await?;
        info!(user_id = user.id, email = %user.email, "Created seed owner");
        Ok(user.id)
    }

    async fn import_category(&self, category: &Category, dir: &Path, owner_id: i64) -> Result<ImportSummary> {
        let mut summary = ImportSummary {
            category: category.label.to_string(),
            ..Default::default()
        };

        for (folder, path) in files::list_subdirectories(dir).await? {
            let Some(snippet) = read_snippet(category, &folder, &path).await? else {
                warn!(category = category.label, folder = %folder, "Skipping folder without scripts");
                summary.skipped.push(folder);
                continue;
            };

            match self.upsert(category.snippet_type, snippet, owner_id).await? {
                Upsert::Created => summary.created += 1,
                Upsert::Updated => summary.updated += 1,
            }
        }

        info!(
            category = category.label,
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped.len(),
            "Imported category"
        );
        Ok(summary)
    }

    /// Matches on `(type, name)`. Existing rows keep their owner.
    async fn upsert(&self, snippet_type: &str, snippet: ImportedSnippet, owner_id: i64) -> Result<Upsert> {
        let now = now_timestamp();
        let metadata = Value::Object(snippet.metadata);

        match self
            .repository
            .find_snippet_id(snippet_type, &snippet.name)
            .await?
        {
            Some(snippet_id) => {
                self.repository
                    .refresh_snippet_content(snippet_id, &snippet.description, &snippet.script, &metadata, &now)
                    .await?;
                Ok(Upsert::Updated)
            }
            None => {
                let fields = SnippetFields {
                    snippet_type: snippet_type.to_string(),
                    name: snippet.name,
                    description: snippet.description,
                    script: snippet.script,
                    metadata,
                };
                self.repository.insert_snippet(owner_id, &fields, &now).await?;
                Ok(Upsert::Created)
            }
        }
    }
}

async fn read_snippet(category: &Category, folder: &str, path: &Path) -> Result<Option<ImportedSnippet>> {
    let entries = files::list_files(path).await?;
    let readme = files::read_readme(&entries).await?;

    let (script, script_files, mut metadata) = match category.reader {
        Reader::FirstScript => {
            let Some(first) = files::read_script_files(&entries, &BUSINESS_RULE_EXTENSIONS)
                .await?
                .into_iter()
                .next()
            else {
                return Ok(None);
            };
            let script = first.content.trim().to_string();
            let metadata = business_rule::build_metadata(&script, &readme);
            (script, vec![first.name], metadata)
        }
        Reader::Scripts(build) => {
            let scripts = files::read_script_files(&entries, &SCRIPT_EXTENSIONS).await?;
            let script = files::combine_scripts(&scripts);
            if script.is_empty() {
                return Ok(None);
            }
            let metadata = build(SnippetSource {
                readme: &readme,
                script: &script,
            });
            let mut names: Vec<String> = scripts.into_iter().map(|f| f.name).collect();
            names.sort();
            (script, names, metadata)
        }
        Reader::Widget => {
            let widget: WidgetFiles = files::read_widget_files(&entries).await?;
            if widget.is_empty() {
                return Ok(None);
            }
            let metadata = metadata::widget(&readme, folder, &widget);
            (widget.compose_script(), widget.file_names(), metadata)
        }
    };

    if script.is_empty() {
        return Ok(None);
    }

    metadata
        .entry("application")
        .or_insert_with(|| Value::from("Global"));
    let source = SourceInfo::new(&[category.directory, folder], script_files)?;
    metadata.insert("source".into(), serde_json::to_value(source)?);

    Ok(Some(ImportedSnippet {
        name: folder.to_string(),
        description: readme::summarize_readme(&readme),
        script,
        metadata,
    }))
}
