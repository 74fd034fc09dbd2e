//! Provider resolution and probe sequencing
//!
//! An explicit provider preference from the host is authoritative: only that
//! tool is probed. A misconfigured preference therefore reads as "no repo"
//! instead of silently switching tools. Without a preference, Git is probed
//! first and Plastic only when Git finds no repository.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::config::SafeSaveConfig;
use crate::process::{CommandRunner, SystemRunner};
use crate::plastic::AuthKeywords;
use crate::status::{ProviderKind, SourceControlStatus};
use crate::{git, plastic};

/// Map the host's active source control integration name to a provider.
///
/// `None` means no integration is active or enabled.
pub fn resolve_preferred_provider(active_integration: Option<&str>) -> ProviderKind {
    let Some(name) = active_integration else {
        return ProviderKind::None;
    };
    let name = name.to_lowercase();
    if name.contains("plastic") || name.contains("unity") {
        ProviderKind::Plastic
    } else if name.contains("git") {
        ProviderKind::Git
    } else {
        ProviderKind::None
    }
}

/// Runs the provider probes. Cheap to clone and safe to move to a worker.
#[derive(Clone)]
pub struct Probes {
    runner: Arc<dyn CommandRunner>,
    git: String,
    plastic: String,
    auth: AuthKeywords,
}

impl std::fmt::Debug for Probes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probes")
            .field("git", &self.git)
            .field("plastic", &self.plastic)
            .finish_non_exhaustive()
    }
}

impl Probes {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &SafeSaveConfig) -> Self {
        Self {
            runner,
            git: config.git_executable.clone(),
            plastic: config.plastic_executable.clone(),
            auth: AuthKeywords::new(&config.auth_keywords),
        }
    }

    /// Probes backed by real processes.
    pub fn system(config: &SafeSaveConfig) -> Self {
        Self::new(Arc::new(SystemRunner), config)
    }

    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    /// Executable name used for `provider`'s commands.
    pub fn executable(&self, provider: ProviderKind) -> Option<&str> {
        match provider {
            ProviderKind::Git => Some(&self.git),
            ProviderKind::Plastic => Some(&self.plastic),
            ProviderKind::None => None,
        }
    }

    pub fn probe_git(&self, project_dir: &Path) -> SourceControlStatus {
        git::probe(&*self.runner, &self.git, project_dir)
    }

    pub fn probe_plastic(&self, project_dir: &Path) -> SourceControlStatus {
        plastic::probe(&*self.runner, &self.plastic, &self.auth, project_dir)
    }

    /// One full probe sequence for `preferred`, stamped with the current time.
    pub fn probe(&self, preferred: ProviderKind, project_dir: &Path) -> SourceControlStatus {
        let status = match preferred {
            ProviderKind::Git => self.probe_git(project_dir),
            ProviderKind::Plastic => self.probe_plastic(project_dir),
            ProviderKind::None => self.probe_with_fallback(project_dir),
        };
        SourceControlStatus {
            last_update_utc: Some(Utc::now()),
            ..status.normalized()
        }
    }

    fn probe_with_fallback(&self, project_dir: &Path) -> SourceControlStatus {
        let git = self.probe_git(project_dir);
        if git.is_repo {
            return git;
        }

        let plastic = self.probe_plastic(project_dir);
        if plastic.is_repo {
            return plastic;
        }

        log::debug!(
            "No repository at {} (git: {:?}, plastic: {:?})",
            project_dir.display(),
            git.last_error,
            plastic.last_error
        );
        combine_not_found(&git, &plastic)
    }
}

/// Status for a directory that neither tool claims.
fn combine_not_found(
    git: &SourceControlStatus,
    plastic: &SourceControlStatus,
) -> SourceControlStatus {
    let errors: Vec<String> = [git, plastic]
        .into_iter()
        .filter(|status| !status.last_error.is_empty())
        .map(|status| format!("{}: {}", status.provider.display_name(), status.last_error))
        .collect();

    SourceControlStatus {
        provider: ProviderKind::None,
        client_available: git.client_available || plastic.client_available,
        last_error: errors.join("\n"),
        ..Default::default()
    }
}
