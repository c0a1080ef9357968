//! The GitPulse service facade
//!
//! Owns the command runner and the three caches with an explicit lifecycle
//! (constructed once at service start, no module-level singletons) and
//! exposes the read API the outer layer serves: branch snapshot, search,
//! comparison, spec listing, recent log, and the branch mutations that
//! invalidate the snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::branch::{BranchAggregator, BranchRecord};
use crate::cache::TtlCache;
use crate::command::CommandRunner;
use crate::compare::{CompareResult, CompareService};
use crate::config::Config;
use crate::ops::{BranchOps, StashOutcome};
use crate::parse::{self, CommitRecord, FileStat};
use crate::refs::validate_ref;
use crate::search;
use crate::specs::SpecService;
use crate::Result;

/// Default number of commits returned by [`GitPulse::recent_log`]
pub const DEFAULT_LOG_COUNT: usize = 3;

/// Default number of commits aggregated by [`GitPulse::file_stats`]
pub const DEFAULT_STATS_COMMIT_COUNT: usize = 3;

/// Cached, queryable view of a repository's branch metadata
pub struct GitPulse {
    aggregator: BranchAggregator,
    branch_cache: TtlCache<(), Vec<BranchRecord>>,
    specs: SpecService,
    compare: CompareService,
    ops: BranchOps,
    runner: Arc<CommandRunner>,
}

impl GitPulse {
    /// Build the service from configuration
    pub fn new(config: &Config) -> Self {
        let runner = Arc::new(CommandRunner::new(&config.repo_path, &config.runner));
        Self {
            aggregator: BranchAggregator::new(runner.clone(), &config.aggregator),
            branch_cache: TtlCache::new(config.cache.branch_ttl),
            specs: SpecService::new(&config.repo_path, &config.specs, config.cache.specs_ttl),
            compare: CompareService::new(runner.clone(), config.cache.compare_ttl),
            ops: BranchOps::new(runner.clone()),
            runner,
        }
    }

    /// Branch snapshot, sorted newest-first by reflog date falling back to
    /// creation date
    ///
    /// Served from cache; a stale snapshot is returned while a refresh is in
    /// flight, so reads never block on git once a snapshot exists. A read
    /// never errors: when even the first population fails (bad repository
    /// path, git missing) the failure is logged and an empty snapshot
    /// served, and the next read retries.
    pub async fn get_branches(&self) -> Result<Vec<BranchRecord>> {
        let mut records = match self
            .branch_cache
            .get_or_refresh((), || self.aggregator.snapshot())
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "branch snapshot unavailable, serving empty snapshot");
                Vec::new()
            }
        };
        records.sort_by(|a, b| b.sort_date().cmp(&a.sort_date()));
        Ok(records)
    }

    /// Filter the branch snapshot by a free-text query
    pub async fn search_branches(&self, query: &str) -> Result<Vec<BranchRecord>> {
        let records = self.get_branches().await?;
        Ok(search::search(query, &records))
    }

    /// Compare two branches with default limits
    pub async fn compare_branches(&self, base: &str, compare: &str) -> Result<CompareResult> {
        self.compare.compare(base, compare).await
    }

    /// Compare two branches with explicit commit/file caps
    pub async fn compare_branches_with_limits(
        &self,
        base: &str,
        compare: &str,
        max_commits: usize,
        max_files: usize,
    ) -> Result<CompareResult> {
        self.compare
            .compare_with_limits(base, compare, max_commits, max_files)
            .await
    }

    /// Mark the branch snapshot stale
    ///
    /// Called after any mutating branch operation; the next read triggers
    /// exactly one fresh aggregation even inside the TTL window. The compare
    /// cache is deliberately left alone.
    pub fn invalidate_branch_cache(&self) {
        self.branch_cache.invalidate(&());
    }

    /// List cached spec file paths
    pub async fn list_specs(&self) -> Result<Vec<String>> {
        self.specs.list().await
    }

    /// Last `count` commits of HEAD, newest first, with extracted tickets
    pub async fn recent_log(&self, count: usize) -> Result<Vec<CommitRecord>> {
        let limit = count.to_string();
        let output = self
            .runner
            .run_git(&["log", "-n", &limit, "--pretty=format:%H|%an|%aI|%s"])
            .await?;
        Ok(output
            .stdout
            .lines()
            .filter_map(|line| parse::parse_graph_log_line(line, None))
            .collect())
    }

    /// Per-file added/deleted totals over the last `count` commits of
    /// `branch`, filtered to paths ending in `suffix` and keyed by path
    pub async fn file_stats(&self, branch: &str, count: usize, suffix: &str) -> Result<Vec<FileStat>> {
        validate_ref(branch)?;
        let limit = count.to_string();
        let output = self
            .runner
            .run_git(&["log", "-n", &limit, "--numstat", "--pretty=format:", branch])
            .await?;

        let mut totals: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for stat in output.stdout.lines().filter_map(parse::parse_numstat_line) {
            if !stat.file.ends_with(suffix) {
                continue;
            }
            let entry = totals.entry(stat.file).or_insert((0, 0));
            entry.0 += stat.added;
            entry.1 += stat.deleted;
        }
        Ok(totals
            .into_iter()
            .map(|(file, (added, deleted))| FileStat {
                file,
                added,
                deleted,
            })
            .collect())
    }

    /// Name of the currently checked-out branch
    pub async fn current_branch(&self) -> Result<String> {
        self.ops.current_branch().await
    }

    /// List configured remote names
    pub async fn list_remotes(&self) -> Result<Vec<String>> {
        self.ops.list_remotes().await
    }

    /// Local branch names tracking the given remote
    pub async fn branches_tracking_remote(&self, remote: &str) -> Result<Vec<String>> {
        self.ops.branches_tracking_remote(remote).await
    }

    /// Add a remote, rejecting duplicates by name or URL
    ///
    /// Remotes are not part of the branch snapshot, so nothing is
    /// invalidated.
    pub async fn add_remote(&self, remote: &str, url: &str) -> Result<()> {
        self.ops.add_remote(remote, url).await
    }

    /// Remove a configured remote
    pub async fn remove_remote(&self, remote: &str) -> Result<()> {
        self.ops.remove_remote(remote).await
    }

    /// Stash pending changes and invalidate the snapshot
    pub async fn stash(&self) -> Result<StashOutcome> {
        let outcome = self.ops.stash().await?;
        self.invalidate_branch_cache();
        Ok(outcome)
    }

    /// Force-delete a local branch and invalidate the snapshot
    pub async fn delete_branch(&self, branch: &str) -> Result<()> {
        self.ops.delete_branch(branch).await?;
        self.invalidate_branch_cache();
        Ok(())
    }

    /// Check out a branch and invalidate the snapshot
    pub async fn checkout_branch(&self, branch: &str) -> Result<()> {
        self.ops.checkout_branch(branch).await?;
        self.invalidate_branch_cache();
        Ok(())
    }

    /// Create a branch from a remote's target branch and invalidate the
    /// snapshot; returns the new branch name
    pub async fn create_branch(
        &self,
        remote: &str,
        target_branch: &str,
        name: &str,
    ) -> Result<String> {
        let created = self.ops.create_branch(remote, target_branch, name).await?;
        self.invalidate_branch_cache();
        Ok(created)
    }
}
