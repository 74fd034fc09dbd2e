//! Toolbar label, tooltip and status summary text
//!
//! Pure functions of a snapshot plus local work; the renderer decides how
//! to draw them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::SafeSaveConfig;
use crate::status::{LocalWorkState, ProviderKind, SourceControlStatus};

const MISSING_CLIENT_HELP: &str = "Git or Plastic SCM CLI not found. Install Git or Unity Version Control (Plastic SCM) CLI and restart the editor.";
const LOGIN_HELP: &str = "Plastic SCM login required. Sign in via Source Control to continue.";
const NO_REPO_HELP: &str = "Project is not inside a Git repository or Plastic SCM workspace.";

/// Branch (or workspace) shown before the `|` in the label.
pub fn branch_label(status: &SourceControlStatus) -> String {
    let mut branch = if !status.branch.is_empty() {
        status.branch.clone()
    } else if !status.workspace_name.is_empty() {
        status.workspace_name.clone()
    } else if status.auth_required && status.provider == ProviderKind::Plastic {
        "Plastic".to_string()
    } else {
        "unknown".to_string()
    };
    if status.provider == ProviderKind::Git && branch.contains("detached") {
        branch = "detached".to_string();
    }
    branch
}

/// State shown after the `|`, in gate precedence order.
pub fn state_label(status: &SourceControlStatus, work: &LocalWorkState) -> String {
    if status.has_conflicts {
        "Conflicts".to_string()
    } else if work.has_unsaved_assets {
        format!("Unsaved {}", work.unsaved_count)
    } else if status.is_diverged() {
        "Diverged".to_string()
    } else if status.behind > 0 {
        format!("Behind {}", status.behind)
    } else if !status.is_clean_tree() {
        "Changes".to_string()
    } else if status.ahead > 0 {
        format!("Ahead {}", status.ahead)
    } else {
        "Clean".to_string()
    }
}

/// Toolbar label, e.g. `main | Behind 2` or `No SCM Repo`.
pub fn status_label(status: &SourceControlStatus, work: &LocalWorkState) -> String {
    if !status.client_available {
        return "SCM Missing".to_string();
    }
    if status.auth_required {
        return "Login Required".to_string();
    }
    if !status.is_repo {
        return "No SCM Repo".to_string();
    }
    format!("{} | {}", branch_label(status), state_label(status, work))
}

/// Renderer-agnostic icon/colour class for the toolbar button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Needs attention: login, conflicts, or a diverged branch
    Warning,
    /// No client or no repository
    Inactive,
    Unsaved,
    Behind,
    Changes,
    Ahead,
    Clean,
}

pub fn severity(status: &SourceControlStatus, work: &LocalWorkState) -> Severity {
    if status.auth_required {
        Severity::Warning
    } else if !status.client_available || !status.is_repo {
        Severity::Inactive
    } else if status.has_conflicts || status.is_diverged() {
        Severity::Warning
    } else if work.has_unsaved_assets {
        Severity::Unsaved
    } else if status.behind > 0 {
        Severity::Behind
    } else if !status.is_clean_tree() {
        Severity::Changes
    } else if status.ahead > 0 {
        Severity::Ahead
    } else {
        Severity::Clean
    }
}

/// Explanation for snapshots without a usable repository, if that applies.
fn unavailable_text(status: &SourceControlStatus) -> Option<&'static str> {
    if !status.client_available {
        Some(MISSING_CLIENT_HELP)
    } else if status.auth_required {
        Some(LOGIN_HELP)
    } else if !status.is_repo {
        Some(NO_REPO_HELP)
    } else {
        None
    }
}

fn detail_lines(status: &SourceControlStatus, work: &LocalWorkState) -> Vec<String> {
    let mut lines = vec![format!("Provider: {}", status.provider.display_name())];
    if status.provider == ProviderKind::Plastic && !status.workspace_name.is_empty() {
        lines.push(format!("Workspace: {}", status.workspace_name));
    }
    lines.push(format!("Root: {}", status.repo_root));

    let branch = if status.branch.is_empty() {
        &status.workspace_name
    } else {
        &status.branch
    };
    if !branch.is_empty() {
        lines.push(format!("Branch: {branch}"));
    }

    match status.provider {
        ProviderKind::Git => {
            if status.has_upstream {
                lines.push(format!(
                    "Ahead: {}  Behind: {}",
                    status.ahead, status.behind
                ));
            } else {
                lines.push("Upstream: not set".to_string());
            }
            lines.push(format!(
                "Staged: {}  Unstaged: {}  Untracked: {}",
                status.staged, status.unstaged, status.untracked
            ));
        }
        ProviderKind::Plastic => {
            if status.behind > 0 {
                lines.push(format!("Updates available: {}", status.behind));
            }
            lines.push(format!(
                "Pending changes: {}",
                status.unstaged + status.untracked
            ));
        }
        ProviderKind::None => {}
    }

    if work.has_unsaved_assets {
        lines.push(format!("Unsaved assets: {}", work.unsaved_count));
        if !work.sample_asset_name.is_empty() {
            lines.push(format!("Example: {}", work.sample_asset_name));
        }
    }
    lines
}

/// Hover text for the toolbar button.
pub fn tooltip(status: &SourceControlStatus, work: &LocalWorkState, now: DateTime<Utc>) -> String {
    if let Some(text) = unavailable_text(status) {
        return if status.last_error.is_empty() {
            text.to_string()
        } else {
            format!("{text}\n{}", status.last_error)
        };
    }

    let mut lines = detail_lines(status, work);
    if let Some(updated) = status.last_update_utc {
        let age = (now - updated).num_seconds().max(0);
        lines.push(format!("Updated: {age}s ago"));
    }
    lines.join("\n")
}

/// Text for the "Show Status Details" action.
pub fn status_summary(status: &SourceControlStatus, work: &LocalWorkState) -> String {
    if let Some(text) = unavailable_text(status) {
        return if status.last_error.is_empty() {
            text.to_string()
        } else {
            format!("{text}\n\nDetails:\n{}", status.last_error)
        };
    }
    detail_lines(status, work).join("\n")
}

/// Menu entry describing the auto-fetch cadence.
pub fn auto_fetch_interval_label(config: &SafeSaveConfig) -> String {
    let seconds = config.auto_fetch_interval().as_secs();
    if config.auto_fetch {
        format!("Auto fetch interval: {seconds}s")
    } else {
        format!("Auto fetch interval: {seconds}s (disabled)")
    }
}
