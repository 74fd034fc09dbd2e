//! Plastic SCM (Unity Version Control) status probe
//!
//! No single `cm` command reports everything, so one probe aggregates four:
//!
//! 1. `getworkspacefrompath`: workspace name and root
//! 2. `workspaceinfo`: branch
//! 3. `status --header --head`: changeset vs head, fallback branch
//! 4. `status --machinereadable ...`: pending change counts
//!
//! Every call is checked for authentication failures. The first one found
//! ends the probe early; the snapshot still reports the workspace (when it was
//! found) with `auth_required` set.

pub mod auth;
pub mod parse;

use std::path::Path;

use crate::error::ScmError;
use crate::process::{CommandRunner, ProcessOutput};
use crate::status::{ProviderKind, SourceControlStatus};

pub use auth::AuthKeywords;
pub use parse::{
    FIELD_SEPARATOR, LINE_END, LINE_START, PendingChanges, StatusHeader, parse_machine_readable,
    parse_status_header, parse_workspace_info_branch, parse_workspace_lookup,
};

/// Argument lists for each `cm` call.
///
/// Passed as argv, so no shell quoting is needed around paths or the format.
pub mod args {
    use super::{FIELD_SEPARATOR, LINE_END, LINE_START};

    pub fn workspace_from_path(dir: &str) -> Vec<String> {
        vec![
            "getworkspacefrompath".to_string(),
            dir.to_string(),
            "--format={wkname}|{wkpath}".to_string(),
        ]
    }

    pub fn workspace_info(root: &str) -> Vec<String> {
        vec!["workspaceinfo".to_string(), root.to_string()]
    }

    pub const STATUS_HEADER: &[&str] = &["status", "--header", "--head"];

    pub fn machine_readable_status() -> Vec<String> {
        vec![
            "status".to_string(),
            "--machinereadable".to_string(),
            "--noheader".to_string(),
            "--controlledchanged".to_string(),
            "--private".to_string(),
            format!("--fieldseparator={FIELD_SEPARATOR}"),
            format!("--startlineseparator={LINE_START}"),
            format!("--endlineseparator={LINE_END}"),
        ]
    }

    pub const UPDATE: &[&str] = &["update"];
}

/// Output text that signals an authentication failure, if any.
///
/// Stderr is checked whatever the exit code: `cm` has been seen to print
/// credential errors on otherwise successful calls. Stdout only counts on
/// failure, where it carries the error text.
fn auth_failure(output: &ProcessOutput, auth: &AuthKeywords) -> Option<String> {
    if !output.launched {
        return None;
    }
    if auth.matches(&output.stderr) {
        return Some(output.combined());
    }
    if !output.success() && auth.matches(&output.stdout) {
        return Some(output.combined());
    }
    None
}

fn mark_auth_required(status: &mut SourceControlStatus, detail: String) {
    log::debug!("Plastic SCM authentication required: {detail}");
    status.auth_required = true;
    status.last_error = ScmError::AuthRequired { detail }.message();
}

/// Probe the Plastic workspace containing `project_dir`.
///
/// Never fails: missing client, missing workspace and login problems are
/// reported on the returned snapshot. A step failing after the workspace was
/// found leaves the fields gathered so far in place.
pub fn probe(
    runner: &dyn CommandRunner,
    cm: &str,
    auth: &AuthKeywords,
    project_dir: &Path,
) -> SourceControlStatus {
    let mut status = SourceControlStatus::for_provider(ProviderKind::Plastic);

    let dir = project_dir.to_string_lossy();
    let lookup = runner.run(cm, &args::workspace_from_path(&dir), project_dir);
    if !lookup.launched {
        status.last_error = ScmError::ClientMissing {
            provider: ProviderKind::Plastic,
        }
        .message();
        return status;
    }
    status.client_available = true;

    if let Some(detail) = auth_failure(&lookup, auth) {
        mark_auth_required(&mut status, detail);
        return status;
    }

    if lookup.exit_code != 0 || lookup.stdout.is_empty() {
        let error = if lookup.exit_code != 0 {
            ScmError::NotARepo {
                provider: ProviderKind::Plastic,
                detail: lookup.stderr.trim().to_string(),
            }
        } else {
            ScmError::RootNotFound
        };
        status.last_error = error.message();
        return status;
    }

    let Some((workspace_name, workspace_root)) = parse_workspace_lookup(&lookup.stdout) else {
        status.last_error = ScmError::RootNotFound.message();
        return status;
    };

    status.is_repo = true;
    status.workspace_name = workspace_name;
    status.repo_root = workspace_root;
    let root = Path::new(&status.repo_root).to_path_buf();

    // Branch
    let info = runner.run(cm, &args::workspace_info(&status.repo_root), &root);
    if let Some(detail) = auth_failure(&info, auth) {
        mark_auth_required(&mut status, detail);
        return status;
    }
    if info.success() {
        if let Some(branch) = parse_workspace_info_branch(&info.stdout) {
            status.branch = branch;
        }
    } else {
        log::debug!("cm workspaceinfo failed: {}", info.stderr.trim());
    }

    // Changeset position
    let header_args: Vec<String> = args::STATUS_HEADER.iter().map(|s| s.to_string()).collect();
    let header = runner.run(cm, &header_args, &root);
    if let Some(detail) = auth_failure(&header, auth) {
        mark_auth_required(&mut status, detail);
        return status;
    }
    if header.success() {
        let parsed = parse_status_header(&header.stdout);
        if let Some((ahead, behind)) = parsed.ahead_behind() {
            status.has_upstream = true;
            status.ahead = ahead;
            status.behind = behind;
        }
        if status.branch.is_empty()
            && let Some(branch) = parsed.branch
        {
            status.branch = branch;
        }
    } else {
        log::debug!("cm status --header failed: {}", header.stderr.trim());
    }

    // Pending changes
    let pending = runner.run(cm, &args::machine_readable_status(), &root);
    if let Some(detail) = auth_failure(&pending, auth) {
        mark_auth_required(&mut status, detail);
        return status;
    }
    if pending.success() {
        let changes = parse_machine_readable(&pending.stdout);
        status.untracked = changes.untracked;
        status.unstaged = changes.unstaged();
        status.has_conflicts = changes.has_conflicts;
    } else {
        status.last_error = ScmError::ParseIncomplete {
            step: "cm status",
            detail: pending.stderr.trim().to_string(),
        }
        .message();
    }

    status
}
