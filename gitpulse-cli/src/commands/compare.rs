//! Branch comparison command

use clap::Args;
use gitpulse_core::{Config, GitPulse};

/// Compare two branches: commits unique to each side and file-level stats
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Base branch
    pub base: String,

    /// Branch to compare against the base
    pub compare: String,

    /// Cap on commits returned per direction
    #[arg(long, default_value_t = gitpulse_core::compare::DEFAULT_MAX_COMMITS)]
    pub max_commits: usize,

    /// Cap on diff-stat entries
    #[arg(long, default_value_t = gitpulse_core::compare::DEFAULT_MAX_FILES)]
    pub max_files: usize,
}

impl CompareArgs {
    /// Execute the compare command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let service = GitPulse::new(config);
        let result = service
            .compare_branches_with_limits(&self.base, &self.compare, self.max_commits, self.max_files)
            .await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}
