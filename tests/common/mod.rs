#![allow(dead_code)]

pub mod mock_commands;

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tempfile::TempDir;

/// Generous bound for background polls and commands in tests.
pub const WAIT: Duration = Duration::from_secs(30);

/// `git` with an isolated environment: no user/system config, fixed identity
/// and dates, C locale.
pub fn git_command(dir: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir)
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_CONFIG_SYSTEM", "/dev/null")
        .env("GIT_AUTHOR_NAME", "Test User")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test User")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_AUTHOR_DATE", "2025-01-01T00:00:00Z")
        .env("GIT_COMMITTER_DATE", "2025-01-01T00:00:00Z")
        .env("LC_ALL", "C")
        .env("LANG", "C");
    cmd
}

/// Run git in `dir`, panicking with its output on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = git_command(dir)
        .args(args)
        .output()
        .expect("Failed to run git");
    if !output.status.success() {
        panic!(
            "git {} failed:\nstdout: {}\nstderr: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub struct TestRepo {
    temp_dir: TempDir,
    root: PathBuf,
}

impl TestRepo {
    /// A fresh repository on `main` with one commit.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("project");
        std::fs::create_dir(&root).expect("Failed to create project directory");
        // Canonicalize to resolve symlinks (important on macOS where /var is symlink to /private/var)
        let root = root
            .canonicalize()
            .expect("Failed to canonicalize temp path");

        git(&root, &["init", "-b", "main"]);
        let repo = Self { temp_dir, root };
        repo.commit("README.md", "# Game\n", "Initial commit");
        repo
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Scratch directory next to the repository, outside any work tree.
    pub fn sibling(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::create_dir_all(&path).expect("Failed to create sibling directory");
        path.canonicalize().expect("Failed to canonicalize sibling")
    }

    pub fn write_file(&self, name: &str, content: &str) {
        std::fs::write(self.root.join(name), content).expect("Failed to write file");
    }

    pub fn commit(&self, name: &str, content: &str, message: &str) {
        self.write_file(name, content);
        git(&self.root, &["add", name]);
        git(&self.root, &["commit", "-m", message]);
    }

    /// Add a bare `origin` and push `main` to it with upstream tracking.
    pub fn add_origin(&self) -> PathBuf {
        let origin = self.temp_dir.path().join("origin.git");
        git(
            self.temp_dir.path(),
            &["init", "--bare", "-b", "main", "origin.git"],
        );
        let origin = origin.canonicalize().expect("Failed to canonicalize origin");
        git(
            &self.root,
            &["remote", "add", "origin", origin.to_str().unwrap()],
        );
        git(&self.root, &["push", "-u", "origin", "main"]);
        origin
    }

    /// Push `count` commits to `origin` from a second clone, leaving this
    /// repository behind once it fetches.
    pub fn advance_origin(&self, count: usize) {
        let clone = self.temp_dir.path().join("other");
        if !clone.exists() {
            git(
                self.temp_dir.path(),
                &["clone", "origin.git", "other"],
            );
        }
        for i in 0..count {
            let name = format!("remote-{i}.txt");
            std::fs::write(clone.join(&name), format!("{i}\n")).unwrap();
            git(&clone, &["add", &name]);
            git(&clone, &["commit", "-m", &format!("Remote change {i}")]);
        }
        git(&clone, &["push", "origin", "main"]);
    }
}
