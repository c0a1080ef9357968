//! Configuration management for GitPulse
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (GITPULSE_*)
//! 3. Config file (~/.config/gitpulse/config.toml)
//! 4. Default values

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Spec-file discovery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpecsConfig {
    /// Root directory for spec files, relative to the repository path
    pub root: String,

    /// Glob pattern matched against paths under `root`
    pub pattern: String,
}

impl Default for SpecsConfig {
    fn default() -> Self {
        Self {
            root: "cypress/e2e".to_string(),
            pattern: "**/*.spec.{ts,js}".to_string(),
        }
    }
}

/// TTLs for the three cached datasets
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Branch snapshot TTL
    #[serde(with = "humantime_serde")]
    pub branch_ttl: Duration,

    /// Spec listing TTL
    #[serde(with = "humantime_serde")]
    pub specs_ttl: Duration,

    /// Branch comparison TTL
    #[serde(with = "humantime_serde")]
    pub compare_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            branch_ttl: Duration::from_secs(30),
            specs_ttl: Duration::from_secs(60),
            compare_ttl: Duration::from_secs(5 * 60),
        }
    }
}

/// Subprocess execution configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Maximum captured output size in bytes
    pub max_output_bytes: usize,

    /// Per-invocation timeout; a stuck git call is killed on expiry
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_output_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Branch aggregation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// How many branches are aggregated concurrently
    ///
    /// Each branch issues several git subprocesses; this bounds subprocess
    /// load against the repository.
    pub concurrency: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Path to the git repository working directory
    pub repo_path: PathBuf,

    /// Spec-file discovery settings
    pub specs: SpecsConfig,

    /// Cache TTLs
    pub cache: CacheConfig,

    /// Subprocess settings
    pub runner: RunnerConfig,

    /// Aggregation settings
    pub aggregator: AggregatorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            specs: SpecsConfig::default(),
            cache: CacheConfig::default(),
            runner: RunnerConfig::default(),
            aggregator: AggregatorConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/gitpulse/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitpulse").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - GITPULSE_REPO_PATH: Path to the repository
    /// - GITPULSE_SPECS_ROOT: Spec-file root directory
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(repo_path) = std::env::var("GITPULSE_REPO_PATH") {
            self.repo_path = PathBuf::from(repo_path);
        }

        if let Ok(root) = std::env::var("GITPULSE_SPECS_ROOT") {
            self.specs.root = root;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, repo_path: Option<PathBuf>) -> Self {
        if let Some(path) = repo_path {
            self.repo_path = path;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(repo_path: Option<PathBuf>) -> Result<Self> {
        Ok(Self::load()?.with_env_overrides().with_cli_overrides(repo_path))
    }
}
