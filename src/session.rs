//! Toolbar session
//!
//! One [`Session`] per toolbar: it owns the poller, the command executor and
//! the notifier, and is driven by [`Session::tick`] from the host's main
//! thread. The host supplies editor state through [`EditorState`] and
//! receives labels, notifications and prompts through [`UiSink`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::config::SafeSaveConfig;
use crate::executor::{CommandExecutor, CommandOutcome, VcsCommand};
use crate::gate::{self, ActionAvailability};
use crate::label;
use crate::notify::ChangeNotifier;
use crate::poller::StatusPoller;
use crate::provider::{Probes, resolve_preferred_provider};
use crate::status::{LocalWorkState, ProviderKind, SourceControlStatus};

/// How often hosts are expected to call [`Session::tick`].
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

pub const PULL_PROMPT: &str = "Pull from upstream with rebase? This will update your working tree.";
pub const PUSH_PROMPT: &str = "Push local commits to upstream?";
pub const UPDATE_PROMPT: &str = "Update workspace to the latest changeset?";

pub const PULL_DISABLED: &str =
    "Pull is disabled until the working tree is clean and upstream is set.";
pub const PUSH_DISABLED: &str =
    "Push is disabled until the working tree is clean, ahead, and upstream is set.";
pub const UPDATE_DISABLED: &str =
    "Update is disabled until the workspace is clean and there are no unsaved assets.";

/// Read-only view of the host editor.
pub trait EditorState {
    /// Name of the active, enabled source control integration, if any.
    fn source_control_provider(&self) -> Option<String> {
        None
    }

    /// Current unsaved assets.
    fn local_work(&self) -> LocalWorkState {
        LocalWorkState::default()
    }
}

/// Where the session sends its output. Every method defaults to doing nothing.
pub trait UiSink {
    fn status_label_changed(&mut self, _label: &str) {}

    fn notify(&mut self, _message: &str, _success: bool) {}

    fn actions_changed(&mut self, _actions: &ActionAvailability) {}

    /// Ask the user to confirm a mutating action. Declines by default.
    fn confirm(&mut self, _prompt: &str) -> bool {
        false
    }

    /// Show the detailed status text.
    fn show_details(&mut self, _text: &str) {}
}

/// Why an action entry point did not start a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    Started,
    Disabled,
    Declined,
    Unavailable,
}

pub struct Session<E, U> {
    config: SafeSaveConfig,
    editor: E,
    ui: U,
    poller: StatusPoller,
    executor: CommandExecutor,
    notifier: ChangeNotifier,
    local_work: LocalWorkState,
    last_dirty_check: Option<Instant>,
    last_poll: Option<Instant>,
    last_auto_fetch: Instant,
}

impl<E: EditorState, U: UiSink> Session<E, U> {
    pub fn new(
        config: SafeSaveConfig,
        probes: Probes,
        project_dir: impl Into<PathBuf>,
        editor: E,
        ui: U,
    ) -> Self {
        Self {
            config,
            editor,
            ui,
            poller: StatusPoller::new(probes.clone(), project_dir),
            executor: CommandExecutor::new(probes),
            notifier: ChangeNotifier::new(),
            local_work: LocalWorkState::default(),
            last_dirty_check: None,
            last_poll: None,
            last_auto_fetch: Instant::now(),
        }
    }

    pub fn config(&self) -> &SafeSaveConfig {
        &self.config
    }

    pub fn project_dir(&self) -> &Path {
        self.poller.project_dir()
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn snapshot(&self) -> Arc<SourceControlStatus> {
        self.poller.snapshot()
    }

    pub fn local_work(&self) -> &LocalWorkState {
        &self.local_work
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_in_flight()
    }

    pub fn pending_commands(&self) -> usize {
        self.executor.pending()
    }

    pub fn label(&self) -> String {
        label::status_label(&self.snapshot(), &self.local_work)
    }

    pub fn tooltip(&self) -> String {
        label::tooltip(&self.snapshot(), &self.local_work, Utc::now())
    }

    pub fn actions(&self) -> ActionAvailability {
        ActionAvailability::evaluate(&self.snapshot(), self.local_work.has_unsaved_assets)
    }

    pub fn preferred_provider(&self) -> ProviderKind {
        resolve_preferred_provider(self.editor.source_control_provider().as_deref())
    }

    /// Advance timers and apply finished background work.
    pub fn tick(&mut self, now: Instant) {
        if self
            .last_dirty_check
            .is_none_or(|t| now.saturating_duration_since(t) >= self.config.dirty_check_interval())
        {
            self.last_dirty_check = Some(now);
            self.refresh_local_work(now);
        }

        if self
            .last_poll
            .is_none_or(|t| now.saturating_duration_since(t) >= self.config.status_poll_interval())
        {
            self.last_poll = Some(now);
            self.request_update();
        }

        if self.poller.drain() {
            self.status_replaced(now);
        }

        for outcome in self.executor.drain() {
            self.command_finished(outcome);
        }

        self.maybe_auto_fetch(now);
    }

    /// Start a status poll unless one is running.
    pub fn request_update(&mut self) -> bool {
        let preferred = self.preferred_provider();
        self.poller.request_update(preferred)
    }

    /// Block until the in-flight poll lands, then apply it.
    pub fn wait_for_status(&mut self, timeout: Duration) -> bool {
        if !self.poller.wait(timeout) {
            return false;
        }
        self.status_replaced(Instant::now());
        true
    }

    /// Block until the next command finishes, then report it.
    pub fn wait_for_command(&mut self, timeout: Duration) -> Option<CommandOutcome> {
        let outcome = self.executor.wait(timeout)?;
        self.command_finished(outcome.clone());
        Some(outcome)
    }

    fn refresh_local_work(&mut self, now: Instant) {
        let work = self.editor.local_work();
        if work != self.local_work {
            self.local_work = work;
            let actions = self.actions();
            self.ui.actions_changed(&actions);
        }
        self.maybe_notify(now);
    }

    fn status_replaced(&mut self, now: Instant) {
        let label = self.label();
        self.ui.status_label_changed(&label);
        let actions = self.actions();
        self.ui.actions_changed(&actions);
        self.maybe_notify(now);
    }

    fn maybe_notify(&mut self, now: Instant) {
        // Nothing to compare against until the first poll lands
        if self.snapshot().last_update_utc.is_none() {
            return;
        }
        let label = self.label();
        if let Some(changed) = self.notifier.observe(
            &label,
            now,
            self.config.status_toast_min_interval(),
            self.config.toast_on_status_change,
        ) {
            self.ui.notify(&format!("SafeSave: {changed}"), true);
        }
    }

    fn command_finished(&mut self, outcome: CommandOutcome) {
        for (message, success) in outcome.notifications() {
            self.ui.notify(&message, success);
        }
        if outcome.command.refresh_after() {
            self.request_update();
        }
    }

    fn maybe_auto_fetch(&mut self, now: Instant) {
        if !self.config.auto_fetch {
            return;
        }
        let status = self.snapshot();
        let ready = status.provider == ProviderKind::Git
            && status.client_available
            && status.is_repo
            && !self.poller.is_in_flight();
        if ready
            && now.saturating_duration_since(self.last_auto_fetch)
                >= self.config.auto_fetch_interval()
        {
            log::debug!("Auto fetch due");
            self.last_auto_fetch = now;
            self.run(VcsCommand::AutoFetch);
        }
    }

    /// Start `command` if its provider is the project's, else tell the user.
    fn run(&mut self, command: VcsCommand) -> ActionResult {
        let status = self.snapshot();
        let provider = command.provider();
        if status.provider != provider || !status.client_available || !status.is_repo {
            self.ui.notify(
                &format!("{} is not available for this project.", provider.display_name()),
                false,
            );
            return ActionResult::Unavailable;
        }
        let working_dir = if status.repo_root.is_empty() {
            self.poller.project_dir().to_path_buf()
        } else {
            PathBuf::from(&status.repo_root)
        };
        self.executor.run_async(command, working_dir);
        ActionResult::Started
    }

    /// Re-check a mutating action's gate against fresh local work, then confirm.
    fn gated(
        &mut self,
        command: VcsCommand,
        allowed: fn(&SourceControlStatus, bool) -> bool,
        disabled: &str,
        prompt: &str,
    ) -> ActionResult {
        self.local_work = self.editor.local_work();
        let status = self.snapshot();
        if !allowed(&status, self.local_work.has_unsaved_assets) {
            self.ui.notify(disabled, false);
            return ActionResult::Disabled;
        }
        if !self.ui.confirm(prompt) {
            return ActionResult::Declined;
        }
        self.run(command)
    }

    /// "Refresh": re-read local work and poll now.
    pub fn refresh(&mut self, now: Instant) {
        self.last_dirty_check = Some(now);
        self.refresh_local_work(now);
        self.request_update();
    }

    pub fn fetch(&mut self) -> ActionResult {
        self.run(VcsCommand::Fetch)
    }

    pub fn pull_rebase(&mut self) -> ActionResult {
        self.gated(
            VcsCommand::PullRebase,
            gate::can_pull,
            PULL_DISABLED,
            PULL_PROMPT,
        )
    }

    pub fn push(&mut self) -> ActionResult {
        self.gated(VcsCommand::Push, gate::can_push, PUSH_DISABLED, PUSH_PROMPT)
    }

    pub fn plastic_update(&mut self) -> ActionResult {
        self.gated(
            VcsCommand::Update,
            gate::can_update,
            UPDATE_DISABLED,
            UPDATE_PROMPT,
        )
    }

    /// "Show Status Details": hand the summary to the UI and return it.
    pub fn show_status(&mut self) -> String {
        let summary = label::status_summary(&self.snapshot(), &self.local_work);
        self.ui.show_details(&summary);
        summary
    }

    /// Flip auto-fetch for this session and restart its timer.
    pub fn toggle_auto_fetch(&mut self, now: Instant) -> bool {
        self.config.auto_fetch = !self.config.auto_fetch;
        self.last_auto_fetch = now;
        log::debug!("Auto fetch {}", if self.config.auto_fetch { "enabled" } else { "disabled" });
        self.config.auto_fetch
    }

    pub fn auto_fetch_label(&self) -> String {
        label::auto_fetch_interval_label(&self.config)
    }
}
