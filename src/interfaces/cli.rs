use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::application::{ImportSummary, LibraryStats};
use crate::domain::error::Result;
use crate::infrastructure::bootstrap::AdminServices;

const DEFAULT_CHECKOUT: &str = "tmp/code-snippets";

/// Maintenance tool for the snippet library.
#[derive(Parser, Debug)]
#[command(name = "snippet-admin", version, about = "Import and maintain ServiceNow snippets")]
pub struct AdminCli {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum AdminCommand {
    /// Import every category from a code-snippets checkout
    Import {
        /// Root of the checkout
        #[arg(long, default_value = DEFAULT_CHECKOUT)]
        root: PathBuf,
    },

    /// Import a single Business Rules folder
    BusinessRules {
        /// Defaults to "Business Rules" inside the default checkout
        dir: Option<PathBuf>,
    },

    /// Write every snippet to a JSON file
    Export { file: PathBuf },

    /// Show snippet counts per type
    Stats,

    /// Delete snippets by id
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
}

pub async fn execute(services: &AdminServices, command: AdminCommand) -> Result<()> {
    match command {
        AdminCommand::Import { root } => {
            let summaries = services.import.import_all(&root).await?;
            print_summaries(&summaries);
        }
        AdminCommand::BusinessRules { dir } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CHECKOUT).join("Business Rules"));
            let summary = services.import.import_business_rules(&dir).await?;
            print_summaries(std::slice::from_ref(&summary));
        }
        AdminCommand::Export { file } => {
            let count = services.maintenance.export(&file).await?;
            println!("Exported {count} snippets to {}", file.display());
        }
        AdminCommand::Stats => {
            let stats = services.maintenance.stats().await?;
            print!("{}", render_stats(&stats));
        }
        AdminCommand::Delete { ids } => {
            for (snippet_id, deleted) in services.maintenance.delete(&ids).await? {
                if deleted {
                    println!("Deleted snippet {snippet_id}");
                } else {
                    warn!(snippet_id, "Snippet not found");
                    println!("Snippet {snippet_id} not found");
                }
            }
        }
    }
    Ok(())
}

fn print_summaries(summaries: &[ImportSummary]) {
    for summary in summaries {
        println!("{summary}");
    }
}

fn render_stats(stats: &LibraryStats) -> String {
    let mut out = format!("Total snippets: {}\n", stats.total);
    for entry in &stats.by_type {
        out.push_str(&format!("  {:<24}{}\n", entry.snippet_type, entry.count));
    }
    out
}
