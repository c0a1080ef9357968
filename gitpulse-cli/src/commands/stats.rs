//! Per-file change statistics command

use clap::Args;
use gitpulse_core::service::DEFAULT_STATS_COMMIT_COUNT;
use gitpulse_core::{Config, GitPulse};

/// Aggregate per-file added/deleted counts over recent commits
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Branch to inspect
    #[arg(default_value = "HEAD")]
    pub branch: String,

    /// Number of recent commits to aggregate
    #[arg(short = 'n', long, default_value_t = DEFAULT_STATS_COMMIT_COUNT)]
    pub count: usize,

    /// Only count files whose path ends with this suffix
    #[arg(long, default_value = ".ts")]
    pub suffix: String,
}

impl StatsArgs {
    /// Execute the stats command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let service = GitPulse::new(config);
        let stats = service
            .file_stats(&self.branch, self.count, &self.suffix)
            .await?;
        println!("{}", serde_json::to_string_pretty(&stats)?);
        Ok(())
    }
}
