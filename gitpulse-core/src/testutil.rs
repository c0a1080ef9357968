//! Test fixtures: throwaway git repositories built in a temp directory

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// A git repository in a temporary directory, deleted on drop
pub struct GitFixture {
    dir: TempDir,
}

impl GitFixture {
    /// Create an initialized repository with a `main` default branch
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let fixture = Self { dir };
        fixture.git(&["init", "--initial-branch=main"]);
        fixture.git(&["config", "user.name", "Test User"]);
        fixture.git(&["config", "user.email", "test@example.com"]);
        fixture
    }

    /// Repository path
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Run a git command, panicking on failure
    pub fn git(&self, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .expect("spawn git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// Create an empty commit with the given message on the current branch
    pub fn commit(&self, message: &str) {
        self.git(&["commit", "--allow-empty", "-m", message]);
    }

    /// Create a branch at the current HEAD
    pub fn branch(&self, name: &str) {
        self.git(&["branch", name]);
    }

    /// Write a file relative to the repository root
    pub fn write_file(&self, rel: &str, contents: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(path, contents).expect("write file");
    }

    /// Stage everything and commit
    pub fn add_commit(&self, message: &str) {
        self.git(&["add", "-A"]);
        self.git(&["commit", "-m", message]);
    }
}
