//! Normalized source control status model.
//!
//! A [`SourceControlStatus`] is a value: every poll builds a fresh one and the
//! poller swaps it in whole. Readers never observe a half-written snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which version-control tool produced a status.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    #[default]
    None,
    Git,
    Plastic,
}

impl ProviderKind {
    /// Human-facing provider name used in menus and summaries.
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::Git => "Git",
            ProviderKind::Plastic => "Plastic SCM",
            ProviderKind::None => "Source Control",
        }
    }
}

/// Snapshot of one poll.
///
/// Invariants (enforced by [`SourceControlStatus::normalized`]):
/// - `client_available == false` implies `is_repo == false` and zero counts
/// - `is_repo == false` implies zero counts and an empty branch
///
/// `auth_required` is only ever set by the Plastic probe. A Git authentication
/// failure surfaces as an ordinary `last_error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceControlStatus {
    pub provider: ProviderKind,
    pub client_available: bool,
    pub is_repo: bool,
    pub auth_required: bool,
    pub has_upstream: bool,
    pub has_conflicts: bool,
    pub ahead: u32,
    pub behind: u32,
    pub staged: u32,
    pub unstaged: u32,
    pub untracked: u32,
    pub branch: String,
    pub repo_root: String,
    pub workspace_name: String,
    pub last_error: String,
    pub last_update_utc: Option<DateTime<Utc>>,
}

impl SourceControlStatus {
    /// Empty status attributed to `provider`.
    pub fn for_provider(provider: ProviderKind) -> Self {
        Self {
            provider,
            ..Default::default()
        }
    }

    /// Staged + unstaged + untracked.
    pub fn pending_changes(&self) -> u32 {
        self.staged + self.unstaged + self.untracked
    }

    /// No pending local VCS changes of any kind.
    pub fn is_clean_tree(&self) -> bool {
        self.pending_changes() == 0
    }

    /// Local and remote both have changes the other lacks.
    pub fn is_diverged(&self) -> bool {
        self.ahead > 0 && self.behind > 0
    }

    /// Apply the model invariants, clearing fields that carry no meaning.
    pub fn normalized(mut self) -> Self {
        if !self.client_available {
            self.is_repo = false;
        }
        if !self.is_repo {
            self.has_upstream = false;
            self.has_conflicts = false;
            self.ahead = 0;
            self.behind = 0;
            self.staged = 0;
            self.unstaged = 0;
            self.untracked = 0;
            self.branch.clear();
        }
        self
    }
}

/// Unsaved editor work, supplied by the host and read-only here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalWorkState {
    pub has_unsaved_assets: bool,
    pub unsaved_count: u32,
    pub sample_asset_name: String,
}

impl LocalWorkState {
    /// Build from a list of dirty asset names, sampling the first.
    pub fn from_dirty_assets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        Self {
            has_unsaved_assets: !names.is_empty(),
            unsaved_count: names.len() as u32,
            sample_asset_name: names.into_iter().next().unwrap_or_default(),
        }
    }
}
