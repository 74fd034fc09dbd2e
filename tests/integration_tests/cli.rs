//! The `safesave` binary.

use std::path::Path;
use std::process::{Command, Output};

use crate::common::TestRepo;

fn safesave(dir: &Path, args: &[&str]) -> Output {
    safesave_with_env(dir, args, &[])
}

fn safesave_with_env(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let config_home = dir.join(".config-home");
    Command::new(env!("CARGO_BIN_EXE_safesave"))
        .args(args)
        .arg("--dir")
        .arg(dir)
        .envs(env.iter().copied())
        .env("XDG_CONFIG_HOME", &config_home)
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_CONFIG_SYSTEM", "/dev/null")
        .env("LC_ALL", "C")
        .env_remove("SAFESAVE_LOG")
        .stdin(std::process::Stdio::null())
        .output()
        .expect("Failed to run safesave")
}

#[test]
fn test_status_json() {
    let repo = TestRepo::new();
    let output = safesave(repo.root_path(), &["status", "--json"]);
    assert!(output.status.success(), "{output:?}");

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["label"], "main | Clean");
    assert_eq!(report["severity"], "clean");
    assert_eq!(report["status"]["provider"], "git");
    assert_eq!(report["status"]["branch"], "main");
    assert_eq!(report["actions"]["fetch"], true);
    assert_eq!(report["actions"]["push"], false);
}

#[test]
fn test_status_text() {
    let repo = TestRepo::new();
    repo.write_file("notes.txt", "scratch\n");
    let output = safesave(repo.root_path(), &["status", "--provider", "git"]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("main | Changes"), "{stdout}");
    assert!(stdout.contains("Provider: Git"), "{stdout}");
    assert!(stdout.contains("Upstream: not set"), "{stdout}");
}

#[test]
fn test_project_config_overrides_executable() {
    let repo = TestRepo::new();
    let config_dir = repo.root_path().join(".config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("safesave.toml"),
        "git-executable = \"safesave-test-no-such-git\"\n",
    )
    .unwrap();

    let output = safesave(repo.root_path(), &["status", "--json", "--provider", "git"]);
    assert!(output.status.success(), "{output:?}");
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["label"], "SCM Missing");
    assert_eq!(report["status"]["last_error"], "Git executable not found.");
}

#[test]
fn test_push_disabled_without_upstream() {
    let repo = TestRepo::new();
    let output = safesave(repo.root_path(), &["push", "--yes"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Push is disabled until the working tree is clean, ahead, and upstream is set."),
        "{stderr}"
    );
}

#[test]
fn test_missing_directory_is_an_error() {
    let repo = TestRepo::new();
    let missing = repo.root_path().join("does-not-exist");
    let output = safesave(&missing, &["status"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn test_auth_keywords_from_environment() {
    let repo = TestRepo::new();
    let output = safesave_with_env(
        repo.root_path(),
        &["status", "--json"],
        &[("SAFESAVE_AUTH_KEYWORDS", "login,token")],
    );
    assert!(output.status.success(), "{output:?}");
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["label"], "main | Clean");
}
