//! CLI command implementations

pub mod branch;
pub mod branches;
pub mod compare;
pub mod log;
pub mod remote;
pub mod specs;
pub mod stats;

pub use branch::BranchArgs;
pub use branches::{BranchesArgs, SearchArgs};
pub use compare::CompareArgs;
pub use log::LogArgs;
pub use remote::RemoteArgs;
pub use specs::SpecsArgs;
pub use stats::StatsArgs;
