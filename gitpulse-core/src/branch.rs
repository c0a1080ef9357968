//! Branch metadata aggregation
//!
//! Builds one [`BranchRecord`] per local branch from several independent git
//! queries. A failed sub-query degrades that one field to its empty default;
//! it never aborts the refresh, so the snapshot always carries one record
//! per branch name.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::command::CommandRunner;
use crate::config::AggregatorConfig;
use crate::parse;
use crate::refs::validate_ref;
use crate::Result;

/// Sentinel for branches with no issue-tracker token in their history
pub const NO_TICKET: &str = "no ticket available";

/// Reflog subject marker for branch creation events
const CREATED_FROM_MARKER: &str = "branch: Created from";

/// Metadata for one local branch
///
/// `name` is never empty; every other field represents absence explicitly
/// (None or empty string) so consumers can render "-" consistently.
#[derive(Debug, Clone, Serialize)]
pub struct BranchRecord {
    /// Branch name, unique key
    pub name: String,
    /// Author date of the branch's first commit
    pub created_at: Option<DateTime<Utc>>,
    /// Date of the first "Created from" reflog entry; absent if pruned
    pub reflog_date: Option<DateTime<Utc>>,
    /// Upstream tracking short name, or a branch-name heuristic, or empty
    pub created_from: String,
    /// First issue-tracker token in the branch's commit messages
    pub bug_ticket: String,
}

impl BranchRecord {
    /// Sort key for newest-first presentation
    pub fn sort_date(&self) -> Option<DateTime<Utc>> {
        self.reflog_date.or(self.created_at)
    }
}

/// Builds branch records by querying git, a bounded number of branches at a
/// time
#[derive(Debug, Clone)]
pub struct BranchAggregator {
    runner: Arc<CommandRunner>,
    concurrency: usize,
}

impl BranchAggregator {
    /// Create an aggregator over the given runner
    pub fn new(runner: Arc<CommandRunner>, config: &AggregatorConfig) -> Self {
        Self {
            runner,
            concurrency: config.concurrency.max(1),
        }
    }

    /// List local branch names
    pub async fn list_branch_names(&self) -> Result<Vec<String>> {
        let output = self
            .runner
            .run_git(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])
            .await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Build the full snapshot: one record per local branch
    ///
    /// Fails only when the branch listing itself fails; per-branch query
    /// failures degrade to empty fields.
    pub async fn snapshot(&self) -> Result<Vec<BranchRecord>> {
        let names = self.list_branch_names().await?;

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut set = JoinSet::new();
        for name in names {
            let semaphore = semaphore.clone();
            let aggregator = self.clone();
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                aggregator.build_record(&name).await
            });
        }

        let mut records = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(error = %e, "branch aggregation task failed"),
            }
        }
        Ok(records)
    }

    /// Build the record for a single branch; never errors
    pub async fn build_record(&self, name: &str) -> BranchRecord {
        let mut record = BranchRecord {
            name: name.to_string(),
            created_at: None,
            reflog_date: None,
            created_from: String::new(),
            bug_ticket: NO_TICKET.to_string(),
        };

        // Branch names come from git itself, but they still pass the
        // allow-list before being interpolated into further queries.
        if validate_ref(name).is_err() {
            tracing::warn!(branch = name, "branch name failed syntax check, fields left empty");
            return record;
        }

        record.created_at = self.query_creation_date(name).await;
        record.reflog_date = self.query_reflog_date(name).await;
        record.created_from = self.query_created_from(name).await;
        if let Some(ticket) = self.query_first_ticket(name).await {
            record.bug_ticket = ticket;
        }

        record
    }

    /// Author date of the branch's first commit
    ///
    /// `--max-parents=0` restricts the log to root commits, so the output
    /// stays a handful of lines no matter how long the history is; the
    /// oldest root wins.
    async fn query_creation_date(&self, name: &str) -> Option<DateTime<Utc>> {
        match self
            .runner
            .run_git(&["log", "--max-parents=0", "--reverse", "--format=%aI", name])
            .await
        {
            Ok(output) => parse::parse_creation_date(output.stdout.lines().next().unwrap_or("")),
            Err(e) => {
                tracing::warn!(branch = name, error = %e, "creation date query failed");
                None
            }
        }
    }

    /// Date of the first "Created from" reflog entry
    ///
    /// The reflog is scanned in git's native order (most recent entry
    /// first); the first matching line wins. A pruned reflog yields None.
    async fn query_reflog_date(&self, name: &str) -> Option<DateTime<Utc>> {
        match self
            .runner
            .run_git(&["reflog", "show", name, "--date=format:%b %d, %Y, %H:%M"])
            .await
        {
            Ok(output) => output
                .stdout
                .lines()
                .find(|line| line.contains(CREATED_FROM_MARKER))
                .and_then(parse::parse_reflog_date),
            Err(e) => {
                tracing::warn!(branch = name, error = %e, "reflog query failed");
                None
            }
        }
    }

    /// Upstream tracking short name, falling back to the name heuristic
    async fn query_created_from(&self, name: &str) -> String {
        let upstream = match self
            .runner
            .run_git(&[
                "for-each-ref",
                "--format=%(upstream:short)",
                &format!("refs/heads/{name}"),
            ])
            .await
        {
            Ok(output) => output.stdout.trim().to_string(),
            Err(e) => {
                tracing::warn!(branch = name, error = %e, "upstream query failed");
                String::new()
            }
        };

        if upstream.is_empty() {
            parse::created_from_fallback(name)
        } else {
            upstream
        }
    }

    /// First issue-tracker token in the branch's commit messages
    ///
    /// git filters the history to the newest commit whose message carries a
    /// token, so only that one message is ever captured.
    async fn query_first_ticket(&self, name: &str) -> Option<String> {
        let grep = format!("--grep={}", parse::TICKET_PATTERN);
        match self
            .runner
            .run_git(&["log", "-n", "1", "--extended-regexp", &grep, "--pretty=%B", name])
            .await
        {
            Ok(output) => parse::first_ticket(&output.stdout),
            Err(e) => {
                tracing::warn!(branch = name, error = %e, "ticket query failed");
                None
            }
        }
    }
}
