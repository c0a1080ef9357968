//! Spec listing command

use clap::Args;
use gitpulse_core::{Config, GitPulse};

/// List test spec files under the configured root
#[derive(Args, Debug)]
pub struct SpecsArgs {}

impl SpecsArgs {
    /// Execute the specs command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let service = GitPulse::new(config);
        let specs = service.list_specs().await?;
        println!("{}", serde_json::to_string_pretty(&specs)?);
        Ok(())
    }
}
