// Mock `cm` (Plastic SCM CLI) executables
//
// All mock logic is written as shell scripts (#!/bin/sh), so these helpers are
// Unix-only. Tests point `plastic-executable` at the script's absolute path.

use std::fs;
use std::path::{Path, PathBuf};

/// Write an executable shell script and return its path.
#[cfg(unix)]
pub fn write_mock_script(bin_dir: &Path, name: &str, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let script_path = bin_dir.join(name);
    fs::write(&script_path, script).unwrap();
    fs::set_permissions(&script_path, fs::Permissions::from_mode(0o755)).unwrap();
    script_path
}

/// Escape single quotes in shell strings.
fn escape_shell_string(s: &str) -> String {
    s.replace('\'', "'\"'\"'")
}

/// Shell lines echoing `output` verbatim, one `printf` per line.
fn printf_lines(output: &str) -> String {
    output
        .lines()
        .map(|line| format!("        printf '%s\\n' '{}'\n", escape_shell_string(line)))
        .collect()
}

/// What a mock `cm` workspace looks like.
pub struct MockWorkspace<'a> {
    pub name: &'a str,
    pub root: &'a Path,
    pub branch: &'a str,
    pub changeset: u32,
    pub head: u32,
    /// Machine-readable status records, without separators: `"CH|/path|False|NO_MERGES"`
    pub changes: &'a [&'a str],
}

/// A `cm` that answers the four probe commands for `workspace` and accepts
/// `update`. Every invocation is appended to `<bin_dir>/cm.log`.
#[cfg(unix)]
pub fn create_mock_cm(bin_dir: &Path, workspace: &MockWorkspace) -> PathBuf {
    let records: String = workspace
        .changes
        .iter()
        .map(|record| format!("@@SAFE@@{record}##SAFE##\n"))
        .collect();
    let script = format!(
        r#"#!/bin/sh
echo "$*" >> '{log}'
case "$1" in
    getworkspacefrompath)
        printf '%s\n' '{name}|{root}'
        ;;
    workspaceinfo)
{info}        ;;
    status)
        case "$2" in
            --header)
                printf '%s\n' '{branch}@{name}@local (cs:{cs} - head:{head})'
                ;;
            *)
{records}                ;;
        esac
        ;;
    update)
        echo 'Updating workspace'
        ;;
    *)
        echo "unknown command: $1" >&2
        exit 1
        ;;
esac
"#,
        log = bin_dir.join("cm.log").display(),
        name = escape_shell_string(workspace.name),
        root = escape_shell_string(&workspace.root.display().to_string()),
        info = printf_lines(&format!("Branch: {}", workspace.branch)),
        branch = escape_shell_string(workspace.branch),
        cs = workspace.changeset,
        head = workspace.head,
        records = printf_lines(&records),
    );
    write_mock_script(bin_dir, "cm", &script)
}

/// A `cm` whose every command fails asking for credentials.
#[cfg(unix)]
pub fn create_mock_cm_login_required(bin_dir: &Path) -> PathBuf {
    write_mock_script(
        bin_dir,
        "cm",
        r#"#!/bin/sh
echo 'Error: You need to log in to Unity DevOps to use this command.' >&2
exit 1
"#,
    )
}

/// A `cm` that reports the directory is not in a workspace.
#[cfg(unix)]
pub fn create_mock_cm_no_workspace(bin_dir: &Path) -> PathBuf {
    write_mock_script(
        bin_dir,
        "cm",
        r#"#!/bin/sh
echo "The path $2 is not in a workspace." >&2
exit 1
"#,
    )
}

/// Commands the mock `cm` received, one per line.
pub fn mock_cm_log(bin_dir: &Path) -> Vec<String> {
    fs::read_to_string(bin_dir.join("cm.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
