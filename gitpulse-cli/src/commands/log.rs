//! Recent commit log command

use clap::Args;
use gitpulse_core::service::DEFAULT_LOG_COUNT;
use gitpulse_core::{Config, GitPulse};

/// Show the most recent commits on HEAD with extracted tickets
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Number of commits to show
    #[arg(short = 'n', long, default_value_t = DEFAULT_LOG_COUNT)]
    pub count: usize,
}

impl LogArgs {
    /// Execute the log command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let service = GitPulse::new(config);
        let commits = service.recent_log(self.count).await?;
        println!("{}", serde_json::to_string_pretty(&commits)?);
        Ok(())
    }
}
