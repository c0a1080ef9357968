//! Branch mutation commands

use clap::{Args, Subcommand};
use gitpulse_core::{Config, GitPulse};

/// Branch mutation commands
#[derive(Args, Debug)]
pub struct BranchArgs {
    #[command(subcommand)]
    pub command: BranchCommand,
}

#[derive(Subcommand, Debug)]
pub enum BranchCommand {
    /// Check out an existing branch
    Checkout {
        /// Branch name
        branch: String,
    },

    /// Force-delete a local branch
    Delete {
        /// Branch name
        branch: String,
    },

    /// Create a branch from a remote's target branch
    Create {
        /// Remote name
        remote: String,

        /// Branch on the remote to start from
        target: String,

        /// Base name for the new branch
        name: String,
    },

    /// Show the currently checked-out branch
    Current,

    /// List configured remotes
    Remotes,

    /// List local branches tracking a remote
    Tracking {
        /// Remote name
        remote: String,
    },
}

impl BranchArgs {
    /// Execute the branch command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let service = GitPulse::new(config);

        match &self.command {
            BranchCommand::Checkout { branch } => {
                service.checkout_branch(branch).await?;
                println!("Checked out branch {branch}");
            }
            BranchCommand::Delete { branch } => {
                service.delete_branch(branch).await?;
                println!("Deleted branch {branch}");
            }
            BranchCommand::Create {
                remote,
                target,
                name,
            } => {
                let created = service.create_branch(remote, target, name).await?;
                println!("Created and checked out branch {created}");
            }
            BranchCommand::Current => {
                println!("{}", service.current_branch().await?);
            }
            BranchCommand::Remotes => {
                let remotes = service.list_remotes().await?;
                println!("{}", serde_json::to_string_pretty(&remotes)?);
            }
            BranchCommand::Tracking { remote } => {
                let branches = service.branches_tracking_remote(remote).await?;
                println!("{}", serde_json::to_string_pretty(&branches)?);
            }
        }

        Ok(())
    }
}
