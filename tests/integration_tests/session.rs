//! Session flows against a real repository.

use std::time::{Duration, Instant};

use safesave::session::{PULL_DISABLED, PUSH_PROMPT};
use safesave::{
    ActionAvailability, ActionResult, EditorState, LocalWorkState, Probes, SafeSaveConfig,
    Session, UiSink, VcsCommand,
};

use crate::common::{TestRepo, WAIT};

#[derive(Default)]
struct Editor {
    unsaved: Vec<String>,
}

impl EditorState for Editor {
    fn source_control_provider(&self) -> Option<String> {
        Some("Git".to_string())
    }

    fn local_work(&self) -> LocalWorkState {
        LocalWorkState::from_dirty_assets(self.unsaved.iter().cloned())
    }
}

#[derive(Default)]
struct Sink {
    labels: Vec<String>,
    notes: Vec<(String, bool)>,
    prompts: Vec<String>,
    actions: Option<ActionAvailability>,
}

impl UiSink for Sink {
    fn status_label_changed(&mut self, label: &str) {
        self.labels.push(label.to_string());
    }

    fn notify(&mut self, message: &str, success: bool) {
        self.notes.push((message.to_string(), success));
    }

    fn actions_changed(&mut self, actions: &ActionAvailability) {
        self.actions = Some(*actions);
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        true
    }
}

fn session(repo: &TestRepo) -> Session<Editor, Sink> {
    let config = SafeSaveConfig::default();
    let probes = Probes::system(&config);
    Session::new(
        config,
        probes,
        repo.root_path(),
        Editor::default(),
        Sink::default(),
    )
}

#[test]
fn test_push_flow() {
    let repo = TestRepo::new();
    repo.add_origin();
    repo.commit("level.txt", "v2\n", "Local change");

    let mut s = session(&repo);
    s.tick(Instant::now());
    assert!(s.wait_for_status(WAIT));
    assert_eq!(s.ui().labels, vec!["main | Ahead 1".to_string()]);
    assert!(s.ui().actions.unwrap().push);

    assert_eq!(s.push(), ActionResult::Started);
    assert_eq!(s.ui().prompts, vec![PUSH_PROMPT.to_string()]);

    let outcome = s.wait_for_command(WAIT).unwrap();
    assert_eq!(outcome.command, VcsCommand::Push);
    assert!(outcome.success, "{outcome:?}");
    assert!(s.ui().notes.contains(&("Push completed.".to_string(), true)));

    // The command re-polls on completion
    assert!(s.wait_for_status(WAIT));
    assert_eq!(s.label(), "main | Clean");
}

#[test]
fn test_unsaved_work_blocks_pull() {
    let repo = TestRepo::new();
    repo.add_origin();
    repo.advance_origin(1);

    let mut s = session(&repo);
    assert_eq!(s.fetch(), ActionResult::Unavailable);
    s.ui_mut().notes.clear();

    s.tick(Instant::now());
    assert!(s.wait_for_status(WAIT));
    assert_eq!(s.fetch(), ActionResult::Started);
    assert!(s.wait_for_command(WAIT).unwrap().success);
    assert!(s.wait_for_status(WAIT));
    assert_eq!(s.label(), "main | Behind 1");

    s.editor_mut().unsaved = vec!["/Game/Maps/Arena".to_string()];
    assert_eq!(s.pull_rebase(), ActionResult::Disabled);
    assert_eq!(
        s.ui().notes.last(),
        Some(&(PULL_DISABLED.to_string(), false))
    );
    assert!(s.ui().prompts.is_empty());
    assert_eq!(s.label(), "main | Unsaved 1");
    assert!(s.tooltip().contains("/Game/Maps/Arena"));
}

#[test]
fn test_working_tree_edit_toasts_after_quiet_window() {
    let repo = TestRepo::new();
    let mut s = session(&repo);

    let t0 = Instant::now();
    s.tick(t0);
    assert!(s.wait_for_status(WAIT));
    assert_eq!(s.label(), "main | Clean");

    repo.write_file("README.md", "# Game\n\nEdited\n");
    s.refresh(t0 + Duration::from_secs(1));
    assert!(s.wait_for_status(WAIT));
    assert_eq!(s.label(), "main | Changes");
    assert!(s.ui().notes.is_empty());

    // Announced by the first dirty check after the quiet window
    s.tick(Instant::now() + Duration::from_secs(5));
    assert_eq!(
        s.ui().notes,
        vec![("SafeSave: main | Changes".to_string(), true)]
    );
}
