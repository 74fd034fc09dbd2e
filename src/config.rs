//! SafeSave configuration
//!
//! Settings are read from, in increasing priority:
//!
//! 1. User config: `<config_dir>/safesave/config.toml`
//! 2. Project config: `<project>/.config/safesave.toml`
//! 3. Environment: `SAFESAVE_*` (e.g. `SAFESAVE_AUTO_FETCH=true`,
//!    `SAFESAVE_AUTH_KEYWORDS=login,token`)
//!
//! Missing files are fine. Raw values are stored as written; the interval
//! accessors clamp them to their minimums.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use config::{Case, Config, Environment, File, FileFormat};
use etcetera::base_strategy::{BaseStrategy, choose_base_strategy};
use serde::{Deserialize, Serialize};

/// Minimum seconds between unsaved-asset checks.
pub const MIN_DIRTY_CHECK_SECONDS: f64 = 0.1;
/// Minimum seconds between status polls.
pub const MIN_STATUS_POLL_SECONDS: f64 = 1.0;
/// Minimum seconds between automatic fetches.
pub const MIN_AUTO_FETCH_SECONDS: f64 = 10.0;
/// Minimum seconds between status-change toasts.
pub const MIN_STATUS_TOAST_SECONDS: f64 = 0.5;

/// Substrings that mark Plastic output as an authentication failure.
///
/// A heuristic over observed CLI wording, not a documented contract of the tool.
pub const DEFAULT_AUTH_KEYWORDS: &[&str] = &[
    "login",
    "log in",
    "authentication",
    "credential",
    "unauthorized",
    "not authorized",
    "access denied",
    "token",
    "expired",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct SafeSaveConfig {
    pub dirty_check_interval_seconds: f64,
    pub status_poll_interval_seconds: f64,
    pub auto_fetch: bool,
    pub auto_fetch_interval_seconds: f64,
    pub toast_on_status_change: bool,
    pub status_toast_min_interval_seconds: f64,
    pub git_executable: String,
    pub plastic_executable: String,
    pub auth_keywords: Vec<String>,
}

impl Default for SafeSaveConfig {
    fn default() -> Self {
        Self {
            dirty_check_interval_seconds: 1.0,
            status_poll_interval_seconds: 5.0,
            auto_fetch: false,
            auto_fetch_interval_seconds: 120.0,
            toast_on_status_change: true,
            status_toast_min_interval_seconds: 4.0,
            git_executable: "git".to_string(),
            plastic_executable: "cm".to_string(),
            auth_keywords: DEFAULT_AUTH_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Longest interval any setting can express (about 136 years).
pub const MAX_INTERVAL_SECONDS: f64 = u32::MAX as f64;

/// Seconds floored at `min` and capped at [`MAX_INTERVAL_SECONDS`]. NaN and
/// negative values collapse to the floor; infinity means the cap.
fn clamped(seconds: f64, min: f64) -> Duration {
    let seconds = if seconds.is_nan() {
        min
    } else {
        seconds.clamp(min, MAX_INTERVAL_SECONDS)
    };
    Duration::from_secs_f64(seconds)
}

impl SafeSaveConfig {
    pub fn dirty_check_interval(&self) -> Duration {
        clamped(self.dirty_check_interval_seconds, MIN_DIRTY_CHECK_SECONDS)
    }

    pub fn status_poll_interval(&self) -> Duration {
        clamped(self.status_poll_interval_seconds, MIN_STATUS_POLL_SECONDS)
    }

    pub fn auto_fetch_interval(&self) -> Duration {
        clamped(self.auto_fetch_interval_seconds, MIN_AUTO_FETCH_SECONDS)
    }

    pub fn status_toast_min_interval(&self) -> Duration {
        clamped(
            self.status_toast_min_interval_seconds,
            MIN_STATUS_TOAST_SECONDS,
        )
    }

    /// Load layered configuration for the project at `project_dir`.
    pub fn load(project_dir: &Path) -> anyhow::Result<Self> {
        Self::load_from(user_config_path().as_deref(), project_dir)
    }

    /// Load with an explicit user config path (`None` skips the user layer).
    pub fn load_from(user_config: Option<&Path>, project_dir: &Path) -> anyhow::Result<Self> {
        Self::load_layers(user_config, project_dir, environment())
    }

    fn load_layers(
        user_config: Option<&Path>,
        project_dir: &Path,
        env: Environment,
    ) -> anyhow::Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = user_config {
            log::debug!("User config: {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let project_config = project_config_path(project_dir);
        log::debug!("Project config: {}", project_config.display());
        builder = builder.add_source(
            File::from(project_config.as_path())
                .format(FileFormat::Toml)
                .required(false),
        );

        builder
            .add_source(env)
            .build()
            .context("Failed to read SafeSave configuration")?
            .try_deserialize()
            .context("Invalid SafeSave configuration")
    }
}

/// `SAFESAVE_*` variables. `SAFESAVE_AUTH_KEYWORDS` is a comma-separated list.
fn environment() -> Environment {
    Environment::with_prefix("SAFESAVE")
        .prefix_separator("_")
        .convert_case(Case::Kebab)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("auth-keywords")
}

/// `<config_dir>/safesave/config.toml`, honouring `XDG_CONFIG_HOME`.
pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("safesave").join("config.toml"));
    }
    let strategy = choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("safesave").join("config.toml"))
}

/// `<project>/.config/safesave.toml`
pub fn project_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".config").join("safesave.toml")
}
