//! Branch listing and search commands

use clap::Args;
use gitpulse_core::{Config, GitPulse};

/// List branches, newest first
#[derive(Args, Debug)]
pub struct BranchesArgs {}

impl BranchesArgs {
    /// Execute the branches command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let service = GitPulse::new(config);
        let records = service.get_branches().await?;
        println!("{}", serde_json::to_string_pretty(&records)?);
        Ok(())
    }
}

/// Search branches by free text
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query terms; all must match, in any searchable field
    pub query: String,
}

impl SearchArgs {
    /// Execute the search command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let service = GitPulse::new(config);
        let records = service.search_branches(&self.query).await?;
        if records.is_empty() {
            tracing::info!("No branches found matching the search");
        }
        println!("{}", serde_json::to_string_pretty(&records)?);
        Ok(())
    }
}
