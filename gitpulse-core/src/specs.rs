//! Spec file discovery
//!
//! Scans a directory for test spec files matching a glob pattern, behind the
//! same TTL cache as the branch snapshot. Scan failures degrade to an empty
//! list; listing never errors.

use std::path::PathBuf;
use std::time::Duration;

use globset::GlobBuilder;
use ignore::WalkBuilder;

use crate::cache::TtlCache;
use crate::config::SpecsConfig;
use crate::Result;

/// Lists spec files under a root directory, cached with a TTL
pub struct SpecService {
    root: PathBuf,
    pattern: String,
    cache: TtlCache<(), Vec<String>>,
}

impl SpecService {
    /// Create a service scanning `repo_path/<specs root>` for the configured
    /// pattern
    pub fn new(repo_path: impl Into<PathBuf>, config: &SpecsConfig, ttl: Duration) -> Self {
        Self {
            root: repo_path.into().join(&config.root),
            pattern: config.pattern.clone(),
            cache: TtlCache::new(ttl),
        }
    }

    /// List matching spec paths relative to the root, sorted
    pub async fn list(&self) -> Result<Vec<String>> {
        self.cache.get_or_refresh((), || async { Ok(self.scan()) }).await
    }

    fn scan(&self) -> Vec<String> {
        let glob = match GlobBuilder::new(&self.pattern).build() {
            Ok(glob) => glob,
            Err(e) => {
                tracing::warn!(pattern = %self.pattern, error = %e, "invalid spec glob pattern");
                return Vec::new();
            }
        };
        let matcher = glob.compile_matcher();

        if !self.root.is_dir() {
            tracing::warn!(root = %self.root.display(), "spec root is not a directory");
            return Vec::new();
        }

        let mut specs = Vec::new();
        for entry in WalkBuilder::new(&self.root).build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "spec scan entry failed");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let rel = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            if matcher.is_match(rel) {
                specs.push(rel.to_string_lossy().into_owned());
            }
        }
        specs.sort_unstable();
        specs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str) {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "// spec").unwrap();
    }

    fn service(dir: &TempDir) -> SpecService {
        let config = SpecsConfig {
            root: "cypress/e2e".to_string(),
            pattern: "**/*.spec.{ts,js}".to_string(),
        };
        SpecService::new(dir.path(), &config, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_lists_matching_specs_sorted() {
        let dir = TempDir::new().unwrap();
        write(&dir, "cypress/e2e/widgets/b.spec.ts");
        write(&dir, "cypress/e2e/a.spec.js");
        write(&dir, "cypress/e2e/not-a-spec.ts");
        write(&dir, "elsewhere/c.spec.ts");

        let specs = service(&dir).list().await.unwrap();
        assert_eq!(specs, vec!["a.spec.js", "widgets/b.spec.ts"]);
    }

    #[tokio::test]
    async fn test_missing_root_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let specs = service(&dir).list().await.unwrap();
        assert!(specs.is_empty());
    }

    #[tokio::test]
    async fn test_listing_is_cached_within_ttl() {
        let dir = TempDir::new().unwrap();
        write(&dir, "cypress/e2e/a.spec.ts");

        let svc = service(&dir);
        assert_eq!(svc.list().await.unwrap().len(), 1);

        // New file is not visible until the TTL lapses
        write(&dir, "cypress/e2e/b.spec.ts");
        assert_eq!(svc.list().await.unwrap().len(), 1);
    }
}
