//! `git status --porcelain=v2 -b` parsing

/// Counts and flags extracted from porcelain v2 output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PorcelainStatus {
    pub branch: String,
    pub has_upstream: bool,
    pub ahead: u32,
    pub behind: u32,
    pub staged: u32,
    pub unstaged: u32,
    pub untracked: u32,
    pub has_conflicts: bool,
}

const BRANCH_HEAD: &str = "# branch.head ";
const BRANCH_UPSTREAM: &str = "# branch.upstream ";
const BRANCH_AB: &str = "# branch.ab ";

/// Leading decimal digits of `s`, 0 when there are none.
fn leading_count(s: &str) -> u32 {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().unwrap_or(0)
}

/// Parse porcelain v2 status with branch headers.
///
/// Unknown lines are ignored, so output from newer git versions degrades to
/// fewer counts rather than an error.
pub fn parse_porcelain_v2(output: &str) -> PorcelainStatus {
    let mut status = PorcelainStatus::default();

    for line in output.lines() {
        if let Some(head) = line.strip_prefix(BRANCH_HEAD) {
            status.branch = head.trim().to_string();
        } else if line.starts_with(BRANCH_UPSTREAM) {
            status.has_upstream = true;
        } else if let Some(ab) = line.strip_prefix(BRANCH_AB) {
            // "+<ahead> -<behind>"
            let mut parts = ab.split_whitespace();
            if let Some(ahead) = parts.next().and_then(|p| p.strip_prefix('+')) {
                status.ahead = leading_count(ahead);
            }
            if let Some(behind) = parts.next().and_then(|p| p.strip_prefix('-')) {
                status.behind = leading_count(behind);
            }
        } else if (line.starts_with("1 ") || line.starts_with("2 ")) && line.len() > 3 {
            // Ordinary (1) and renamed/copied (2) entries: "<kind> <XY> ..."
            let bytes = line.as_bytes();
            let index_status = bytes[2];
            let worktree_status = bytes[3];
            if index_status != b'.' {
                status.staged += 1;
            }
            if worktree_status != b'.' {
                status.unstaged += 1;
            }
            if index_status == b'U' || worktree_status == b'U' {
                status.has_conflicts = true;
            }
        } else if line.starts_with("u ") {
            status.has_conflicts = true;
        } else if line.starts_with("? ") {
            status.untracked += 1;
        }
    }

    status
}
