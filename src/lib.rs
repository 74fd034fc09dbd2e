pub mod config;
pub mod error;
pub mod executor;
pub mod gate;
pub mod git;
pub mod label;
pub mod notify;
pub mod plastic;
pub mod poller;
pub mod process;
pub mod provider;
pub mod session;
pub mod status;

pub use config::SafeSaveConfig;
pub use error::ScmError;
pub use executor::{CommandExecutor, CommandOutcome, VcsCommand};
pub use gate::ActionAvailability;
pub use label::Severity;
pub use poller::StatusPoller;
pub use process::{CommandRunner, ProcessOutput, SystemRunner};
pub use provider::{Probes, resolve_preferred_provider};
pub use session::{ActionResult, EditorState, Session, UiSink};
pub use status::{LocalWorkState, ProviderKind, SourceControlStatus};
