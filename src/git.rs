//! Git status probe
//!
//! Two calls: `rev-parse --show-toplevel` to find the repository, then
//! `status --porcelain=v2 -b` in its root for branch tracking and counts.

pub mod porcelain;

use std::path::Path;

use crate::error::ScmError;
use crate::process::CommandRunner;
use crate::status::{ProviderKind, SourceControlStatus};

pub use porcelain::{PorcelainStatus, parse_porcelain_v2};

/// Arguments for each Git call, in one place so tests and the executor agree.
pub mod args {
    pub const SHOW_TOPLEVEL: &[&str] = &["rev-parse", "--show-toplevel"];
    pub const STATUS: &[&str] = &["status", "--porcelain=v2", "-b"];
    pub const FETCH: &[&str] = &["fetch", "--prune"];
    pub const PULL_REBASE: &[&str] = &["pull", "--rebase"];
    pub const PUSH: &[&str] = &["push"];
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

impl PorcelainStatus {
    /// Copy parsed fields onto a snapshot.
    pub fn apply_to(self, status: &mut SourceControlStatus) {
        status.branch = self.branch;
        status.has_upstream = self.has_upstream;
        status.ahead = self.ahead;
        status.behind = self.behind;
        status.staged = self.staged;
        status.unstaged = self.unstaged;
        status.untracked = self.untracked;
        status.has_conflicts = self.has_conflicts;
    }
}

/// Probe the Git repository containing `project_dir`.
///
/// Never fails: a missing client or a directory outside any repository is
/// reported on the returned snapshot.
pub fn probe(runner: &dyn CommandRunner, git: &str, project_dir: &Path) -> SourceControlStatus {
    let mut status = SourceControlStatus::for_provider(ProviderKind::Git);

    let toplevel = runner.run(git, &to_args(args::SHOW_TOPLEVEL), project_dir);
    if !toplevel.launched {
        status.last_error = ScmError::ClientMissing {
            provider: ProviderKind::Git,
        }
        .message();
        return status;
    }
    status.client_available = true;

    if toplevel.exit_code != 0 {
        status.last_error = ScmError::NotARepo {
            provider: ProviderKind::Git,
            detail: toplevel.stderr.trim().to_string(),
        }
        .message();
        return status;
    }

    status.is_repo = true;
    status.repo_root = toplevel.stdout.trim().to_string();

    let repo_root = if status.repo_root.is_empty() {
        project_dir.to_path_buf()
    } else {
        Path::new(&status.repo_root).to_path_buf()
    };

    let output = runner.run(git, &to_args(args::STATUS), &repo_root);
    if output.success() {
        parse_porcelain_v2(&output.stdout).apply_to(&mut status);
    } else {
        // The toplevel lookup succeeded, so this is still a repository
        log::debug!("git status failed in {}: {}", repo_root.display(), output.stderr.trim());
        status.last_error = ScmError::CommandFailed {
            command: "git status".to_string(),
            stderr: output.stderr.trim().to_string(),
        }
        .message();
    }

    status
}
