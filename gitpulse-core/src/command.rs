//! Asynchronous git subprocess execution
//!
//! All repository reads go through [`CommandRunner`]: one subprocess per
//! call, argv-style invocation (no shell), a captured-output ceiling and a
//! per-call timeout. No process outlives the call that spawned it.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::config::RunnerConfig;
use crate::{Error, Result};

/// Captured output of a completed git invocation
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output, lossily decoded as UTF-8
    pub stdout: String,
    /// Standard error, lossily decoded as UTF-8
    pub stderr: String,
}

/// Executes git commands against a repository working directory
#[derive(Debug, Clone)]
pub struct CommandRunner {
    /// Repository working directory
    repo_path: PathBuf,
    /// Maximum captured stdout size in bytes
    max_output_bytes: usize,
    /// Per-invocation timeout
    timeout: Duration,
}

impl CommandRunner {
    /// Create a runner for the given repository path
    pub fn new(repo_path: impl Into<PathBuf>, config: &RunnerConfig) -> Self {
        Self {
            repo_path: repo_path.into(),
            max_output_bytes: config.max_output_bytes,
            timeout: config.timeout,
        }
    }

    /// Get the repository working directory
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Run `git` with the given arguments in the repository directory
    ///
    /// Returns the captured output, or:
    /// - [`Error::ExternalTool`] on non-zero exit or timeout, carrying the
    ///   tool's stderr (falling back to stdout, then a generic message)
    /// - [`Error::OutputTooLarge`] when captured stdout exceeds the ceiling
    /// - [`Error::Config`] for an empty argument list or a missing workdir
    pub async fn run_git(&self, args: &[&str]) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(Error::Config("Empty git argument list".to_string()));
        }

        if !self.repo_path.is_dir() {
            return Err(Error::Config(format!(
                "Repository path is not a directory: {}",
                self.repo_path.display()
            )));
        }

        let child = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::Config("git executable not found in PATH".to_string())
                } else {
                    Error::Io(e)
                }
            })?;

        // Dropping the timed-out future drops the child, which kills it
        // (kill_on_drop), so a stuck invocation cannot linger past the call.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(Error::Io)?,
            Err(_) => {
                return Err(Error::ExternalTool {
                    message: format!(
                        "git {} timed out after {:?}",
                        args.first().unwrap_or(&""),
                        self.timeout
                    ),
                });
            }
        };

        if output.stdout.len() > self.max_output_bytes {
            return Err(Error::OutputTooLarge {
                limit: self.max_output_bytes,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let message = if !stderr.trim().is_empty() {
                stderr.trim().to_string()
            } else if !stdout.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                format!("git exited with {}", output.status)
            };
            return Err(Error::ExternalTool { message });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner_for(path: impl Into<PathBuf>) -> CommandRunner {
        CommandRunner::new(path, &RunnerConfig::default())
    }

    #[tokio::test]
    async fn test_empty_args_rejected() {
        let runner = runner_for(std::env::temp_dir());
        let result = runner.run_git(&[]).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_workdir_rejected() {
        let runner = runner_for("/nonexistent/path/12345");
        let result = runner.run_git(&["status"]).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_version_succeeds() {
        let runner = runner_for(std::env::temp_dir());
        let output = runner.run_git(&["--version"]).await.unwrap();
        assert!(output.stdout.contains("git version"));
    }

    #[tokio::test]
    async fn test_failure_carries_tool_diagnostics() {
        let temp = tempfile::TempDir::new().unwrap();
        let runner = runner_for(temp.path());
        // Not a git repository, so rev-parse fails with a message on stderr
        let result = runner.run_git(&["rev-parse", "--verify", "HEAD"]).await;
        match result {
            Err(Error::ExternalTool { message }) => assert!(!message.is_empty()),
            other => panic!("expected ExternalTool error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_output_ceiling_enforced() {
        let config = RunnerConfig {
            max_output_bytes: 4,
            ..RunnerConfig::default()
        };
        let runner = CommandRunner::new(std::env::temp_dir(), &config);
        let result = runner.run_git(&["--version"]).await;
        assert!(matches!(result, Err(Error::OutputTooLarge { limit: 4 })));
    }
}
