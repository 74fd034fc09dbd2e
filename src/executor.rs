//! Mutating VCS commands (fetch, pull, push, update)
//!
//! Commands run on their own worker threads and are not serialized against
//! the status poller: a fetch and a poll may overlap. Outcomes come back over a
//! channel and are applied by the owning thread in [`CommandExecutor::drain`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam_channel as chan;

use crate::error::{ScmError, truncate_error};
use crate::git;
use crate::plastic;
use crate::provider::Probes;
use crate::status::ProviderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum VcsCommand {
    Fetch,
    /// Timer-driven fetch; success is not announced
    AutoFetch,
    PullRebase,
    Push,
    Update,
}

impl VcsCommand {
    pub fn provider(self) -> ProviderKind {
        match self {
            VcsCommand::Update => ProviderKind::Plastic,
            _ => ProviderKind::Git,
        }
    }

    pub fn args(self) -> &'static [&'static str] {
        match self {
            VcsCommand::Fetch | VcsCommand::AutoFetch => git::args::FETCH,
            VcsCommand::PullRebase => git::args::PULL_REBASE,
            VcsCommand::Push => git::args::PUSH,
            VcsCommand::Update => plastic::args::UPDATE,
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            VcsCommand::Fetch => "Fetch completed.",
            VcsCommand::AutoFetch => "Auto fetch completed.",
            VcsCommand::PullRebase => "Pull completed.",
            VcsCommand::Push => "Push completed.",
            VcsCommand::Update => "Update completed.",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            VcsCommand::Fetch => "Fetch failed.",
            VcsCommand::AutoFetch => "Auto fetch failed.",
            VcsCommand::PullRebase => "Pull failed.",
            VcsCommand::Push => "Push failed.",
            VcsCommand::Update => "Update failed.",
        }
    }

    /// Suppress the success notification; failures are always reported.
    pub fn silent_success(self) -> bool {
        matches!(self, VcsCommand::AutoFetch)
    }

    /// Re-poll status once the command finishes.
    pub fn refresh_after(self) -> bool {
        true
    }
}

/// Result of one command, ready for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: VcsCommand,
    pub success: bool,
    /// Trimmed stderr, at most 200 characters; empty on success
    pub error: String,
}

impl CommandOutcome {
    /// Notifications to show, as `(message, is_success)`.
    ///
    /// A failure yields the failure message followed by the error text.
    pub fn notifications(&self) -> Vec<(String, bool)> {
        let mut messages = Vec::new();
        if self.success {
            if !self.command.silent_success() {
                messages.push((self.command.success_message().to_string(), true));
            }
        } else {
            messages.push((self.command.failure_message().to_string(), false));
            if !self.error.is_empty() {
                messages.push((self.error.clone(), false));
            }
        }
        messages
    }
}

/// Executable plus arguments, for logs and errors.
fn command_line(executable: &str, command: VcsCommand) -> String {
    format!("{} {}", executable, command.args().join(" "))
}

fn run_command(probes: &Probes, command: VcsCommand, working_dir: &Path) -> CommandOutcome {
    let Some(executable) = probes.executable(command.provider()) else {
        return CommandOutcome {
            command,
            success: false,
            error: String::new(),
        };
    };
    let args: Vec<String> = command.args().iter().map(|s| s.to_string()).collect();
    let output = probes.runner().run(executable, &args, working_dir);

    let success = output.success();
    let error = if success {
        String::new()
    } else if !output.launched {
        ScmError::ClientMissing {
            provider: command.provider(),
        }
        .message()
    } else {
        let failure = ScmError::CommandFailed {
            command: command_line(executable, command),
            stderr: output.stderr.trim().to_string(),
        };
        log::debug!("{failure}");
        truncate_error(&failure.message())
    };

    CommandOutcome {
        command,
        success,
        error,
    }
}

pub struct CommandExecutor {
    probes: Probes,
    liveness: Arc<()>,
    pending: usize,
    tx: chan::Sender<CommandOutcome>,
    rx: chan::Receiver<CommandOutcome>,
}

impl CommandExecutor {
    pub fn new(probes: Probes) -> Self {
        let (tx, rx) = chan::unbounded();
        Self {
            probes,
            liveness: Arc::new(()),
            pending: 0,
            tx,
            rx,
        }
    }

    /// Commands started but not yet drained.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Start `command` in `working_dir` on a worker thread.
    pub fn run_async(&mut self, command: VcsCommand, working_dir: impl Into<PathBuf>) {
        let probes = self.probes.clone();
        let working_dir = working_dir.into();
        let liveness: Weak<()> = Arc::downgrade(&self.liveness);
        let tx = self.tx.clone();

        log::debug!("Starting {command} in {}", working_dir.display());
        let spawned = std::thread::Builder::new()
            .name(format!("safesave-{command}"))
            .spawn(move || {
                let outcome = run_command(&probes, command, &working_dir);
                if liveness.upgrade().is_none() {
                    log::debug!("Executor dropped; discarding {command} outcome");
                    return;
                }
                let _ = tx.send(outcome);
            });

        match spawned {
            Ok(_) => self.pending += 1,
            Err(e) => {
                log::warn!("Failed to start {command}: {e}");
                // Report through the normal path so the UI still hears about it
                let _ = self.tx.send(CommandOutcome {
                    command,
                    success: false,
                    error: truncate_error(&e.to_string()),
                });
                self.pending += 1;
            }
        }
    }

    /// Run `command` on the calling thread.
    pub fn run_blocking(&self, command: VcsCommand, working_dir: &Path) -> CommandOutcome {
        run_command(&self.probes, command, working_dir)
    }

    /// Finished outcomes, oldest first.
    pub fn drain(&mut self) -> Vec<CommandOutcome> {
        let outcomes: Vec<CommandOutcome> = self.rx.try_iter().collect();
        self.pending = self.pending.saturating_sub(outcomes.len());
        outcomes
    }

    /// Block up to `timeout` for the next outcome.
    pub fn wait(&mut self, timeout: Duration) -> Option<CommandOutcome> {
        let outcome = self.rx.recv_timeout(timeout).ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(outcome)
    }
}
