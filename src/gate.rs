//! Action gating
//!
//! Every mutating action requires a fully clean local state: no pending VCS
//! changes and no unsaved editor assets. Syncing over either risks losing work.

use serde::Serialize;

use crate::status::{ProviderKind, SourceControlStatus};

pub fn can_fetch(status: &SourceControlStatus) -> bool {
    status.provider == ProviderKind::Git && status.client_available && status.is_repo
}

/// Pull with rebase: behind upstream with nothing local to lose.
pub fn can_pull(status: &SourceControlStatus, has_unsaved_assets: bool) -> bool {
    can_fetch(status)
        && status.has_upstream
        && status.behind > 0
        && status.is_clean_tree()
        && !has_unsaved_assets
}

/// Push: ahead and not behind (a diverged branch must pull first).
pub fn can_push(status: &SourceControlStatus, has_unsaved_assets: bool) -> bool {
    can_fetch(status)
        && status.has_upstream
        && status.ahead > 0
        && status.behind == 0
        && status.is_clean_tree()
        && !has_unsaved_assets
}

/// Plastic workspace update.
pub fn can_update(status: &SourceControlStatus, has_unsaved_assets: bool) -> bool {
    status.provider == ProviderKind::Plastic
        && status.client_available
        && status.is_repo
        && status.is_clean_tree()
        && !has_unsaved_assets
}

/// All gate results for one snapshot, as handed to the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionAvailability {
    pub fetch: bool,
    pub pull: bool,
    pub push: bool,
    pub update: bool,
}

impl ActionAvailability {
    pub fn evaluate(status: &SourceControlStatus, has_unsaved_assets: bool) -> Self {
        Self {
            fetch: can_fetch(status),
            pull: can_pull(status, has_unsaved_assets),
            push: can_push(status, has_unsaved_assets),
            update: can_update(status, has_unsaved_assets),
        }
    }
}
