//! Remote management commands

use clap::{Args, Subcommand};
use gitpulse_core::{Config, GitPulse};

/// Remote management commands
#[derive(Args, Debug)]
pub struct RemoteArgs {
    #[command(subcommand)]
    pub command: RemoteCommand,
}

#[derive(Subcommand, Debug)]
pub enum RemoteCommand {
    /// Add a remote; duplicate names or URLs are rejected
    Add {
        /// Remote name
        name: String,

        /// Remote URL
        url: String,
    },

    /// Remove a configured remote
    Remove {
        /// Remote name
        name: String,
    },

    /// List configured remotes
    List,
}

impl RemoteArgs {
    /// Execute the remote command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let service = GitPulse::new(config);

        match &self.command {
            RemoteCommand::Add { name, url } => {
                service.add_remote(name, url).await?;
                println!("Added remote {name} with URL {url}");
            }
            RemoteCommand::Remove { name } => {
                service.remove_remote(name).await?;
                println!("Removed remote {name}");
            }
            RemoteCommand::List => {
                let remotes = service.list_remotes().await?;
                println!("{}", serde_json::to_string_pretty(&remotes)?);
            }
        }

        Ok(())
    }
}
