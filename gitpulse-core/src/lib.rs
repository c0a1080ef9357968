//! GitPulse Core - cached, queryable branch metadata for a git repository
//!
//! This crate shells out to git, parses its textual output into typed
//! records, and serves the results through TTL caches with single-flight
//! refresh: a branch snapshot, a spec-file listing, and memoized two-way
//! branch comparisons.

pub mod branch;
pub mod cache;
pub mod command;
pub mod compare;
pub mod config;
pub mod error;
pub mod ops;
pub mod parse;
pub mod refs;
pub mod search;
pub mod service;
pub mod specs;

#[cfg(test)]
pub(crate) mod testutil;

pub use branch::BranchRecord;
pub use compare::CompareResult;
pub use config::Config;
pub use error::{Error, Result};
pub use ops::StashOutcome;
pub use parse::{CommitRecord, FileStat};
pub use service::GitPulse;
