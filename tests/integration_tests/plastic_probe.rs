//! Plastic SCM probing against mock `cm` scripts.

use std::path::Path;

use safesave::label::{Severity, severity, status_label};
use safesave::{
    ActionAvailability, CommandExecutor, LocalWorkState, Probes, ProviderKind, SafeSaveConfig,
    VcsCommand,
};
use tempfile::TempDir;

use crate::common::mock_commands::{
    MockWorkspace, create_mock_cm, create_mock_cm_login_required, create_mock_cm_no_workspace,
    mock_cm_log,
};

fn probes_with(cm: &Path) -> Probes {
    let config = SafeSaveConfig {
        plastic_executable: cm.to_string_lossy().into_owned(),
        // Keep auto-detection from finding a real repository
        git_executable: "safesave-test-no-such-git".into(),
        ..Default::default()
    };
    Probes::system(&config)
}

#[test]
fn test_workspace_with_pending_changes() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let cm = create_mock_cm(
        &root,
        &MockWorkspace {
            name: "MyGame",
            root: &root,
            branch: "/main/task-7",
            changeset: 40,
            head: 43,
            changes: &[
                "CH|/ws/MyGame/Hero.uasset|False|NO_MERGES",
                "PR|/ws/MyGame/New.uasset|False|NO_MERGES",
            ],
        },
    );

    let status = probes_with(&cm).probe(ProviderKind::Plastic, &root);
    assert_eq!(status.provider, ProviderKind::Plastic);
    assert!(status.client_available && status.is_repo);
    assert_eq!(status.workspace_name, "MyGame");
    assert_eq!(status.repo_root, root.to_str().unwrap());
    assert_eq!(status.branch, "/main/task-7");
    assert!(status.has_upstream);
    assert_eq!((status.ahead, status.behind), (0, 3));
    assert_eq!(status.unstaged, 1);
    assert_eq!(status.untracked, 1);
    assert!(!status.has_conflicts);
    assert!(status.last_error.is_empty());

    let work = LocalWorkState::default();
    assert_eq!(status_label(&status, &work), "/main/task-7 | Behind 3");
    // Pending changes block the update
    assert!(!ActionAvailability::evaluate(&status, false).update);

    let log = mock_cm_log(&root);
    assert_eq!(log.len(), 4);
    assert!(log[0].starts_with("getworkspacefrompath"));
    assert!(log[3].contains("--machinereadable"));
}

#[test]
fn test_clean_workspace_allows_update() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let cm = create_mock_cm(
        &root,
        &MockWorkspace {
            name: "MyGame",
            root: &root,
            branch: "/main",
            changeset: 12,
            head: 15,
            changes: &[],
        },
    );
    let probes = probes_with(&cm);

    let status = probes.probe(ProviderKind::Plastic, &root);
    assert!(status.is_clean_tree());
    assert!(ActionAvailability::evaluate(&status, false).update);
    assert!(!ActionAvailability::evaluate(&status, true).update);

    let outcome = CommandExecutor::new(probes).run_blocking(VcsCommand::Update, &root);
    assert!(outcome.success, "{outcome:?}");
    assert_eq!(
        outcome.notifications(),
        vec![("Update completed.".to_string(), true)]
    );
    assert_eq!(mock_cm_log(&root).last().map(String::as_str), Some("update"));
}

#[test]
fn test_conflicts_are_detected() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let cm = create_mock_cm(
        &root,
        &MockWorkspace {
            name: "MyGame",
            root: &root,
            branch: "/main",
            changeset: 5,
            head: 5,
            changes: &["CH|/ws/MyGame/Map.umap|False|MERGE_CONFLICT"],
        },
    );

    let status = probes_with(&cm).probe(ProviderKind::Plastic, &root);
    assert!(status.has_conflicts);
    let work = LocalWorkState::default();
    assert_eq!(status_label(&status, &work), "/main | Conflicts");
    assert_eq!(severity(&status, &work), Severity::Warning);
}

#[test]
fn test_login_required() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let cm = create_mock_cm_login_required(&root);

    let status = probes_with(&cm).probe(ProviderKind::Plastic, &root);
    assert!(status.client_available);
    assert!(status.auth_required);
    assert!(!status.is_repo);
    assert_eq!(status.last_error, "Plastic SCM login required.");
    assert_eq!(
        status_label(&status, &LocalWorkState::default()),
        "Login Required"
    );
}

#[test]
fn test_not_a_workspace() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let cm = create_mock_cm_no_workspace(&root);

    let status = probes_with(&cm).probe(ProviderKind::Plastic, &root);
    assert!(status.client_available);
    assert!(!status.is_repo);
    assert!(!status.auth_required);
    assert!(status.last_error.contains("is not in a workspace"));
}

#[test]
fn test_auto_detect_falls_back_to_plastic() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let cm = create_mock_cm(
        &root,
        &MockWorkspace {
            name: "MyGame",
            root: &root,
            branch: "/main",
            changeset: 1,
            head: 1,
            changes: &[],
        },
    );

    let status = probes_with(&cm).probe(ProviderKind::None, &root);
    assert_eq!(status.provider, ProviderKind::Plastic);
    assert!(status.is_repo);
    assert_eq!(
        status_label(&status, &LocalWorkState::default()),
        "/main | Clean"
    );
}

#[test]
fn test_auto_detect_finds_nothing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let cm = create_mock_cm_no_workspace(&root);

    let status = probes_with(&cm).probe(ProviderKind::None, &root);
    assert_eq!(status.provider, ProviderKind::None);
    assert!(status.client_available);
    assert!(!status.is_repo);
    assert!(status.last_error.contains("Git: Git executable not found."));
    assert!(status.last_error.contains("Plastic SCM: "));
}
