//! GitPulse CLI - query cached branch metadata for a git repository
//!
//! The terminal surface over gitpulse-core: branch snapshot, search,
//! comparison, spec listing and the branch mutations.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gitpulse_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{
    BranchArgs, BranchesArgs, CompareArgs, LogArgs, RemoteArgs, SearchArgs, SpecsArgs, StatsArgs,
};

/// GitPulse: cached, queryable view of a repository's branches
#[derive(Parser, Debug)]
#[command(name = "gitpulse")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the git repository (overrides config and env)
    #[arg(long, global = true, env = "GITPULSE_REPO_PATH")]
    repo: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// List branches, newest first
    #[command(visible_alias = "br")]
    Branches(BranchesArgs),

    /// Search branches by free text
    Search(SearchArgs),

    /// Compare two branches
    #[command(visible_alias = "cmp")]
    Compare(CompareArgs),

    /// List test spec files
    Specs(SpecsArgs),

    /// Show recent commits on HEAD
    Log(LogArgs),

    /// Branch mutations (checkout, delete, create) and tracking queries
    Branch(BranchArgs),

    /// Remote management (add, remove, list)
    Remote(RemoteArgs),

    /// Per-file change statistics over recent commits
    Stats(StatsArgs),

    /// Stash pending changes
    Stash,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.repo.clone())?;

    if cli.verbose {
        tracing::info!(repo_path = %config.repo_path.display(), "Configuration loaded");
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("gitpulse {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Branches(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Search(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Compare(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Specs(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Log(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Branch(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Remote(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Stats(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Stash) => {
            let service = gitpulse_core::GitPulse::new(&config);
            let outcome = service.stash().await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Some(Commands::Config) => {
            println!("GitPulse Configuration");
            println!("======================");
            println!();
            println!("repo_path: {}", config.repo_path.display());
            println!("specs root: {}", config.specs.root);
            println!("specs pattern: {}", config.specs.pattern);
            println!("branch TTL: {:?}", config.cache.branch_ttl);
            println!("specs TTL: {:?}", config.cache.specs_ttl);
            println!("compare TTL: {:?}", config.cache.compare_ttl);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("GitPulse - cached branch metadata queries");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
