//! Branch and remote mutation operations
//!
//! The write-side counterpart of the cached read path: create, delete and
//! check out branches, manage remotes, stash pending changes. Mutations
//! surface errors to the caller (unlike reads) and the service layer
//! invalidates the branch snapshot after the branch-affecting ones.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::command::CommandRunner;
use crate::refs::{validate_name_component, validate_ref};
use crate::{Error, Result};

/// Outcome of a stash operation
#[derive(Debug, Clone, Serialize)]
pub struct StashOutcome {
    /// Message reported by git, or a fallback when git printed nothing
    pub message: String,
    /// Branch checked out after the stash
    pub branch: String,
}

/// Executes branch and remote mutations against the repository
#[derive(Debug, Clone)]
pub struct BranchOps {
    runner: Arc<CommandRunner>,
}

impl BranchOps {
    /// Create mutation ops over the given runner
    pub fn new(runner: Arc<CommandRunner>) -> Self {
        Self { runner }
    }

    /// Name of the currently checked-out branch
    pub async fn current_branch(&self) -> Result<String> {
        let output = self.runner.run_git(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        Ok(output.stdout.trim().to_string())
    }

    /// List configured remote names
    pub async fn list_remotes(&self) -> Result<Vec<String>> {
        let output = self.runner.run_git(&["remote"]).await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Remote name/URL pairs from `git remote -v`
    async fn list_remotes_verbose(&self) -> Result<Vec<(String, String)>> {
        let output = self.runner.run_git(&["remote", "-v"]).await?;
        Ok(output
            .stdout
            .lines()
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                Some((parts.next()?.to_string(), parts.next()?.to_string()))
            })
            .collect())
    }

    /// Add a remote, rejecting duplicates by name or URL
    pub async fn add_remote(&self, remote: &str, url: &str) -> Result<()> {
        validate_name_component(remote)?;
        if url.trim().is_empty() || url.starts_with('-') {
            return Err(Error::Config(format!("Invalid remote URL: {url:?}")));
        }

        let existing = self.list_remotes_verbose().await?;
        let name_exists = existing.iter().any(|(name, _)| name == remote);
        let url_exists = existing.iter().any(|(_, existing_url)| existing_url == url);
        let message = match (name_exists, url_exists) {
            (true, true) => "Remote with this name and URL already exists",
            (true, false) => "Remote with this name already exists",
            (false, true) => "Remote with this URL already exists",
            (false, false) => {
                self.runner.run_git(&["remote", "add", remote, url]).await?;
                return Ok(());
            }
        };
        Err(Error::ExternalTool {
            message: message.to_string(),
        })
    }

    /// Remove a remote; the remote must exist
    pub async fn remove_remote(&self, remote: &str) -> Result<()> {
        validate_name_component(remote)?;
        if !self.list_remotes().await?.iter().any(|r| r == remote) {
            return Err(Error::ExternalTool {
                message: format!("Remote {remote:?} does not exist"),
            });
        }
        self.runner.run_git(&["remote", "remove", remote]).await?;
        Ok(())
    }

    /// Local branch names tracking the given remote
    ///
    /// Filters `git branch -vv` output by the remote prefix, so only
    /// branches with upstream info mentioning `<remote>/` are returned.
    pub async fn branches_tracking_remote(&self, remote: &str) -> Result<Vec<String>> {
        validate_name_component(remote)?;
        let marker = format!("{remote}/");
        let output = self.runner.run_git(&["branch", "-vv"]).await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| line.contains(&marker))
            .filter_map(|line| line.trim_start_matches("* ").split_whitespace().next())
            .map(str::to_string)
            .collect())
    }

    /// Stash pending changes and report the branch left checked out
    pub async fn stash(&self) -> Result<StashOutcome> {
        let output = self.runner.run_git(&["stash"]).await?;
        let message = match output.stdout.trim() {
            "" => "Stash complete".to_string(),
            text => text.to_string(),
        };
        Ok(StashOutcome {
            message,
            branch: self.current_branch().await?,
        })
    }

    /// Force-delete a local branch
    pub async fn delete_branch(&self, branch: &str) -> Result<()> {
        validate_ref(branch)?;
        self.runner.run_git(&["branch", "-D", branch]).await?;
        Ok(())
    }

    /// Check out an existing branch
    pub async fn checkout_branch(&self, branch: &str) -> Result<()> {
        validate_ref(branch)?;
        self.runner.run_git(&["checkout", branch]).await?;
        Ok(())
    }

    /// Create and check out a branch from a remote's target branch
    ///
    /// The new branch is named `<name>_<remote>_<Month>_<DD>`; `remote` and
    /// `name` are single components (no slash or dot) so the composed name
    /// stays unambiguous. The remote is fetched first and the remote branch
    /// must exist.
    pub async fn create_branch(&self, remote: &str, target_branch: &str, name: &str) -> Result<String> {
        validate_name_component(remote)?;
        validate_ref(target_branch)?;
        validate_name_component(name)?;

        let new_branch = format!("{name}_{remote}_{}", Utc::now().format("%B_%d"));

        self.runner.run_git(&["fetch", remote]).await?;

        let remote_ref = format!("refs/remotes/{remote}/{target_branch}");
        if self
            .runner
            .run_git(&["show-ref", "--verify", "--quiet", &remote_ref])
            .await
            .is_err()
        {
            return Err(Error::ExternalTool {
                message: format!("Remote branch {remote}/{target_branch} does not exist"),
            });
        }

        let start_point = format!("{remote}/{target_branch}");
        self.runner
            .run_git(&["checkout", "-b", &new_branch, &start_point])
            .await?;

        Ok(new_branch)
    }
}
