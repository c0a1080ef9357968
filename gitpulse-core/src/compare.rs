//! Two-way branch comparison
//!
//! Computes the commits reachable from one branch but not the other (both
//! directions) and a per-file numeric diff-stat, with bounded result sizes.
//! Unlike branch aggregation, any failed query here is fatal to the whole
//! comparison: a partial result would be actively misleading to someone
//! deciding between merge and force push.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::cache::TtlCache;
use crate::command::CommandRunner;
use crate::parse::{self, CommitRecord, FileStat};
use crate::refs::validate_ref;
use crate::Result;

/// Default cap on commits returned per direction
pub const DEFAULT_MAX_COMMITS: usize = 100;

/// Default cap on diff-stat entries
pub const DEFAULT_MAX_FILES: usize = 200;

/// Cache key: results are memoized per ref pair and limits
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CompareKey {
    base: String,
    compare: String,
    max_commits: usize,
    max_files: usize,
}

/// Result of comparing two branches
#[derive(Debug, Clone, Serialize)]
pub struct CompareResult {
    /// Base ref name
    pub base: String,
    /// Compare ref name
    pub compare: String,
    /// Commits reachable from `base` but not `compare`
    pub only_in_base: Vec<CommitRecord>,
    /// Commits reachable from `compare` but not `base`
    pub only_in_compare: Vec<CommitRecord>,
    /// True when `only_in_base` hit the commit cap
    pub only_in_base_truncated: bool,
    /// True when `only_in_compare` hit the commit cap
    pub only_in_compare_truncated: bool,
    /// Per-file change counts between the two refs
    pub file_stats: Vec<FileStat>,
    /// True when `file_stats` hit the file cap
    pub file_stats_truncated: bool,
}

/// Compares branches, memoizing results per (base, compare, limits)
///
/// The compare cache is never proactively invalidated: a comparison can keep
/// serving a result that no longer reflects the repository until its TTL
/// lapses. That is documented behavior, matching the read-mostly design.
pub struct CompareService {
    runner: Arc<CommandRunner>,
    cache: TtlCache<CompareKey, CompareResult>,
}

impl CompareService {
    /// Create a compare service with the given result TTL
    pub fn new(runner: Arc<CommandRunner>, ttl: Duration) -> Self {
        Self {
            runner,
            cache: TtlCache::new(ttl),
        }
    }

    /// Compare two branches with default limits
    pub async fn compare(&self, base: &str, compare: &str) -> Result<CompareResult> {
        self.compare_with_limits(base, compare, DEFAULT_MAX_COMMITS, DEFAULT_MAX_FILES)
            .await
    }

    /// Compare two branches, capping commits per direction and diff-stat rows
    ///
    /// Both names must pass the ref syntax allow-list before any subprocess
    /// is spawned.
    pub async fn compare_with_limits(
        &self,
        base: &str,
        compare: &str,
        max_commits: usize,
        max_files: usize,
    ) -> Result<CompareResult> {
        validate_ref(base)?;
        validate_ref(compare)?;

        let key = CompareKey {
            base: base.to_string(),
            compare: compare.to_string(),
            max_commits,
            max_files,
        };

        self.cache
            .get_or_refresh(key, || self.fetch(base, compare, max_commits, max_files))
            .await
    }

    async fn fetch(
        &self,
        base: &str,
        compare: &str,
        max_commits: usize,
        max_files: usize,
    ) -> Result<CompareResult> {
        let only_in_compare = self.directional_log(base, compare, max_commits).await?;
        let only_in_base = self.directional_log(compare, base, max_commits).await?;

        let diff = self
            .runner
            .run_git(&["diff", "--numstat", &format!("{base}..{compare}")])
            .await?;
        let file_stats: Vec<FileStat> = diff
            .stdout
            .lines()
            .filter_map(parse::parse_numstat_line)
            .take(max_files)
            .collect();

        // Exact-equality truncation heuristic: a branch with precisely
        // `max_commits` new commits is indistinguishable from one with more.
        Ok(CompareResult {
            base: base.to_string(),
            compare: compare.to_string(),
            only_in_base_truncated: only_in_base.len() == max_commits,
            only_in_compare_truncated: only_in_compare.len() == max_commits,
            file_stats_truncated: file_stats.len() == max_files,
            only_in_base,
            only_in_compare,
            file_stats,
        })
    }

    /// Commits reachable from `include` but not `exclude`, tagged with the
    /// branch they belong to
    async fn directional_log(
        &self,
        exclude: &str,
        include: &str,
        max_commits: usize,
    ) -> Result<Vec<CommitRecord>> {
        let range = format!("{exclude}..{include}");
        let limit = max_commits.to_string();
        let output = self
            .runner
            .run_git(&[
                "log",
                &range,
                "--graph",
                "--pretty=format:%H|%an|%aI|%s",
                "-n",
                &limit,
            ])
            .await?;

        Ok(output
            .stdout
            .lines()
            .filter_map(|line| parse::parse_graph_log_line(line, Some(include)))
            .collect())
    }
}
