//! SafeSave error taxonomy
//!
//! Probe and command failures never propagate as `Err`: they are folded into
//! the status snapshot or a command outcome as text, and the next poll retries.
//! `ScmError` gives those texts one home so every layer words them the same way.

use crate::status::ProviderKind;

/// Categorised source control failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScmError {
    /// The provider's executable could not be found or started
    ClientMissing { provider: ProviderKind },
    /// The directory is outside any repository or workspace
    NotARepo {
        provider: ProviderKind,
        detail: String,
    },
    /// Plastic reported an authentication/login failure
    AuthRequired { detail: String },
    /// A command ran but exited non-zero
    CommandFailed { command: String, stderr: String },
    /// A later Plastic step failed after the workspace was found
    ParseIncomplete { step: &'static str, detail: String },
    /// `getworkspacefrompath` succeeded without naming a root
    RootNotFound,
}

impl ScmError {
    /// Text stored in `SourceControlStatus::last_error`.
    pub fn message(&self) -> String {
        match self {
            ScmError::ClientMissing {
                provider: ProviderKind::Git,
            } => "Git executable not found.".to_string(),
            ScmError::ClientMissing {
                provider: ProviderKind::Plastic,
            } => "Plastic SCM CLI not found.".to_string(),
            ScmError::ClientMissing {
                provider: ProviderKind::None,
            } => "Source control client not found.".to_string(),
            ScmError::NotARepo { detail, .. } => detail.clone(),
            ScmError::AuthRequired { .. } => "Plastic SCM login required.".to_string(),
            ScmError::CommandFailed { stderr, .. } => stderr.clone(),
            ScmError::ParseIncomplete { detail, .. } => detail.clone(),
            ScmError::RootNotFound => "Plastic SCM workspace root not found.".to_string(),
        }
    }
}

impl std::fmt::Display for ScmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScmError::NotARepo { provider, detail } if detail.is_empty() => {
                write!(f, "{} repository not found", provider.display_name())
            }
            ScmError::CommandFailed { command, stderr } => {
                if stderr.is_empty() {
                    write!(f, "{command} failed")
                } else {
                    write!(f, "{command} failed: {stderr}")
                }
            }
            ScmError::ParseIncomplete { step, detail } => {
                write!(f, "{step}: {detail}")
            }
            ScmError::AuthRequired { detail } if !detail.is_empty() => {
                write!(f, "{} ({detail})", self.message())
            }
            _ => f.write_str(&self.message()),
        }
    }
}

impl std::error::Error for ScmError {}

/// Cap on stderr text carried into failure notifications.
pub const MAX_ERROR_CHARS: usize = 200;

/// First [`MAX_ERROR_CHARS`] characters of trimmed command output.
///
/// Counts characters, not bytes, so multi-byte output never splits mid-char.
pub fn truncate_error(text: &str) -> String {
    text.trim().chars().take(MAX_ERROR_CHARS).collect()
}
