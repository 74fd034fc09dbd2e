//! Parsers for the four Plastic CLI outputs
//!
//! None of these formats is a stable contract, so every parser is lenient:
//! unrecognised lines are skipped and missing fields leave defaults in place.

use std::sync::LazyLock;

use regex::Regex;

pub const FIELD_SEPARATOR: &str = "|";
pub const LINE_START: &str = "@@SAFE@@";
pub const LINE_END: &str = "##SAFE##";

static CHANGESET: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"cs:(\d+)").ok());
static HEAD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"head:(\d+)").ok());

/// Workspace name and root from `getworkspacefrompath --format={wkname}|{wkpath}`.
///
/// Returns `None` unless both a name and a root are present.
pub fn parse_workspace_lookup(stdout: &str) -> Option<(String, String)> {
    let mut parts = stdout
        .trim()
        .split(FIELD_SEPARATOR)
        .filter(|p| !p.is_empty());
    let name = parts.next()?.trim().to_string();
    let root = parts.next()?.trim().to_string();
    if root.is_empty() {
        return None;
    }
    Some((name, root))
}

/// Branch from `workspaceinfo`: the first line starting with `Branch`,
/// split at its first `:` or `=`.
pub fn parse_workspace_info_branch(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("Branch"))
        .find_map(|line| {
            let split = line.find([':', '='])?;
            Some(line[split + 1..].trim().to_string())
        })
}

/// Changeset position and fallback branch from `status --header --head`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusHeader {
    pub current_changeset: Option<u64>,
    pub head_changeset: Option<u64>,
    pub branch: Option<String>,
}

impl StatusHeader {
    /// `(ahead, behind)` once both changesets are known.
    pub fn ahead_behind(&self) -> Option<(u32, u32)> {
        let (cs, head) = (self.current_changeset?, self.head_changeset?);
        let clamp = |n: u64| u32::try_from(n).unwrap_or(u32::MAX);
        Some((clamp(cs.saturating_sub(head)), clamp(head.saturating_sub(cs))))
    }
}

fn capture_number(re: Option<&Regex>, line: &str) -> Option<u64> {
    re?.captures(line)?.get(1)?.as_str().parse().ok()
}

/// Text before any `(`, truncated at `@`, when it looks like a branch spec
/// (`/main/task` or `lb:label`).
fn header_branch(line: &str) -> Option<String> {
    let left = line.split('(').next().unwrap_or(line).trim();
    let looks_like_branch = left.starts_with('/')
        || left
            .get(..3)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("lb:"));
    if !looks_like_branch {
        return None;
    }
    let branch = left.split('@').next().unwrap_or(left).trim();
    Some(branch.to_string())
}

pub fn parse_status_header(stdout: &str) -> StatusHeader {
    let mut header = StatusHeader::default();
    for line in stdout.lines() {
        if let Some(cs) = capture_number(Option::as_ref(&CHANGESET), line) {
            header.current_changeset = Some(cs);
        }
        if let Some(head) = capture_number(Option::as_ref(&HEAD), line) {
            header.head_changeset = Some(head);
        }
        if header.branch.is_none() {
            header.branch = header_branch(line);
        }
    }
    header
}

/// Pending change counts from the machine-readable status listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingChanges {
    pub changed: u32,
    pub untracked: u32,
    pub has_conflicts: bool,
}

impl PendingChanges {
    /// Controlled changes, i.e. everything that is not private.
    pub fn unstaged(&self) -> u32 {
        self.changed.saturating_sub(self.untracked)
    }
}

fn is_conflict_field(field: &str) -> bool {
    let upper = field.to_uppercase();
    upper.contains("CONFLICT") || (upper.contains("MERGE") && !upper.contains("NO_MERGES"))
}

/// Parse `status --machinereadable` output decorated with [`LINE_START`],
/// [`LINE_END`] and [`FIELD_SEPARATOR`].
///
/// Records are split on newlines and on the end marker, so output that omits
/// newlines between records still counts correctly.
pub fn parse_machine_readable(stdout: &str) -> PendingChanges {
    let mut pending = PendingChanges::default();

    let records = stdout.split(LINE_END).flat_map(str::lines);
    for record in records {
        let clean = record.replace(LINE_START, "").replace(LINE_END, "");
        let clean = clean.trim();
        if clean.is_empty() {
            continue;
        }

        let fields: Vec<&str> = clean.split(FIELD_SEPARATOR).collect();
        let code = fields[0].trim();
        if code.eq_ignore_ascii_case("STATUS") {
            continue;
        }

        pending.changed += 1;

        // Codes combine with '+', e.g. "PR+LM"
        if code
            .split('+')
            .filter(|part| !part.is_empty())
            .any(|part| part.eq_ignore_ascii_case("PR"))
        {
            pending.untracked += 1;
        }

        if fields.iter().any(|field| is_conflict_field(field)) {
            pending.has_conflicts = true;
        }
    }

    pending
}
