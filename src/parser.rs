// Parsing of `git` porcelain output.
//
// None of this output is a stable API. The substrings relied upon are:
//  - `checkout: moving` marks a branch switch in the reflog
//  - `HEAD@{<timestamp>}` carries the `--date=iso` timestamp of the entry
//  - the last `to ` on a switch line precedes the destination branch
//  - `HEAD ->` marks the symbolic alias in `git branch -r`

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::collections::HashMap;

pub const SWITCH_MARKER: &str = "checkout: moving";
const TIMESTAMP_OPEN: &str = "HEAD@{";
const TIMESTAMP_CLOSE: char = '}';
const DESTINATION_MARKER: &str = "to ";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";
const REMOTE_HEAD_ALIAS: &str = "HEAD ->";

/// Branch name to the latest moment it was switched to
pub type UsageMap = HashMap<String, DateTime<FixedOffset>>;

/// A remote-tracking branch split at its first `/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBranch {
    pub remote: String,
    pub short_name: String,
}

impl RemoteBranch {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.remote, self.short_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl GitVersion {
    /// `git branch --show-current` needs 2.22
    pub const MINIMUM: GitVersion = GitVersion {
        major: 2,
        minor: 22,
        patch: None,
    };

    pub fn is_supported(&self) -> bool {
        (self.major, self.minor) >= (Self::MINIMUM.major, Self::MINIMUM.minor)
    }
}

impl std::fmt::Display for GitVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

/// Extract the first `MAJOR.MINOR[.PATCH]` token of `git --version`
pub fn parse_git_version(input: &str) -> Option<GitVersion> {
    let version_re = Regex::new(r"(?P<major>\d+)\.(?P<minor>\d+)(?:\.(?P<patch>\d+))?").ok()?;
    let caps = version_re.captures(input)?;

    let major = caps.name("major")?.as_str().parse().ok()?;
    let minor = caps.name("minor")?.as_str().parse().ok()?;
    let patch = match caps.name("patch") {
        Some(patch) => Some(patch.as_str().parse().ok()?),
        None => None,
    };

    Some(GitVersion {
        major,
        minor,
        patch,
    })
}

/// Names from `git branch`, without the `*`/`+` marker column
///
/// The `(HEAD detached at ...)` pseudo entry is not a branch and is dropped.
pub fn parse_local_branches(input: &str) -> Vec<String> {
    input
        .lines()
        .map(|line| {
            line.strip_prefix("* ")
                .or_else(|| line.strip_prefix("+ "))
                .unwrap_or(line)
                .trim()
        })
        .filter(|name| !name.is_empty() && !name.starts_with('('))
        .map(str::to_string)
        .collect()
}

/// Entries from `git branch -r`, without the `origin/HEAD -> origin/main` alias
pub fn parse_remote_branches(input: &str) -> Vec<RemoteBranch> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains(REMOTE_HEAD_ALIAS))
        .filter_map(|line| {
            let (remote, short_name) = line.split_once('/')?;
            Some(RemoteBranch {
                remote: remote.to_string(),
                short_name: short_name.to_string(),
            })
        })
        .collect()
}

/// Parse one line of `git reflog show --date=iso`
///
/// Returns the destination branch and the moment of the switch, or `None` when
/// the line is not a branch switch or its timestamp does not parse.
pub fn parse_switch_line(line: &str) -> Option<(String, DateTime<FixedOffset>)> {
    let line = line.trim_end();
    if !line.contains(SWITCH_MARKER) {
        return None;
    }

    let (_, rest) = line.split_once(TIMESTAMP_OPEN)?;
    let (raw_timestamp, _) = rest.split_once(TIMESTAMP_CLOSE)?;
    let timestamp = match DateTime::parse_from_str(raw_timestamp.trim(), TIMESTAMP_FORMAT) {
        Ok(timestamp) => timestamp,
        Err(e) => {
            log::debug!("Skipping reflog line with bad timestamp {:?}: {}", raw_timestamp, e);
            return None;
        }
    };

    let idx = line.rfind(DESTINATION_MARKER)?;
    let branch = line[idx + DESTINATION_MARKER.len()..].trim();
    if branch.is_empty() {
        return None;
    }

    Some((branch.to_string(), timestamp))
}

/// Fold the whole reflog into the latest switch moment of each branch
pub fn parse_reflog(input: &str) -> UsageMap {
    let mut usage = UsageMap::new();
    for (branch, timestamp) in input.lines().filter_map(parse_switch_line) {
        usage
            .entry(branch)
            .and_modify(|latest| {
                if timestamp > *latest {
                    *latest = timestamp;
                }
            })
            .or_insert(timestamp);
    }
    usage
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_parse_switch_line_scenario() {
        let line = "1a2b3c4 HEAD@{2024-01-10 09:00:00 +0000}: checkout: moving from main to feature";
        let (branch, timestamp) = parse_switch_line(line).expect("Should parse switch");
        assert_eq!(branch, "feature");
        assert_eq!(timestamp.with_timezone(&Utc), utc(2024, 1, 10, 9, 0, 0));
    }

    #[test]
    fn test_parse_switch_line_keeps_offset() {
        let line = "1a2b3c4 HEAD@{2024-01-10 11:30:00 +0230}: checkout: moving from main to dev";
        let (_, timestamp) = parse_switch_line(line).unwrap();
        assert_eq!(timestamp.offset().local_minus_utc(), 2 * 3600 + 30 * 60);
        assert_eq!(timestamp.with_timezone(&Utc), utc(2024, 1, 10, 9, 0, 0));
    }

    #[test]
    fn test_parse_switch_line_ignores_other_entries() {
        let lines = [
            "1a2b3c4 HEAD@{2024-01-10 09:00:00 +0000}: commit: move to new api",
            "1a2b3c4 HEAD@{2024-01-10 09:00:00 +0000}: merge feature: Fast-forward",
            "1a2b3c4 HEAD@{2024-01-10 09:00:00 +0000}: reset: moving to HEAD~1",
            "",
        ];
        for line in lines {
            assert_eq!(parse_switch_line(line), None, "line: {:?}", line);
        }
    }

    #[test]
    fn test_parse_switch_line_skips_malformed_timestamp() {
        let line = "1a2b3c4 HEAD@{2 hours ago}: checkout: moving from main to feature";
        assert_eq!(parse_switch_line(line), None);

        let line = "1a2b3c4 HEAD@{2024-13-40 09:00:00 +0000}: checkout: moving from main to feature";
        assert_eq!(parse_switch_line(line), None);
    }

    #[test]
    fn test_parse_switch_line_without_timestamp_block() {
        let line = "checkout: moving from main to feature";
        assert_eq!(parse_switch_line(line), None);
    }

    #[test]
    fn test_parse_switch_line_uses_last_to() {
        let line = "1a2b3c4 HEAD@{2024-01-10 09:00:00 +0000}: checkout: moving from to to/x to go-to-market";
        let (branch, _) = parse_switch_line(line).unwrap();
        assert_eq!(branch, "go-to-market");
    }

    #[test]
    fn test_parse_switch_line_trailing_whitespace() {
        let line = "1a2b3c4 HEAD@{2024-01-10 09:00:00 +0000}: checkout: moving from main to feature  \r";
        let (branch, _) = parse_switch_line(line).unwrap();
        assert_eq!(branch, "feature");
    }

    #[test]
    fn test_parse_reflog_keeps_latest_timestamp() {
        // newest first, as git prints it, plus one entry out of order
        let input = "\
aaaaaaa HEAD@{2024-01-12 10:00:00 +0000}: checkout: moving from feature to main
bbbbbbb HEAD@{2024-01-11 10:00:00 +0000}: commit: wip
ccccccc HEAD@{2024-01-10 09:00:00 +0000}: checkout: moving from main to feature
ddddddd HEAD@{2024-01-13 08:00:00 +0000}: checkout: moving from main to feature
eeeeeee HEAD@{2024-01-09 09:00:00 +0000}: checkout: moving from feature to main
";
        let usage = parse_reflog(input);
        assert_eq!(usage.len(), 2);
        assert_eq!(usage["feature"].with_timezone(&Utc), utc(2024, 1, 13, 8, 0, 0));
        assert_eq!(usage["main"].with_timezone(&Utc), utc(2024, 1, 12, 10, 0, 0));
    }

    #[test]
    fn test_parse_reflog_compares_instants_across_offsets() {
        let input = "\
aaaaaaa HEAD@{2024-01-10 10:00:00 +0200}: checkout: moving from main to feature
bbbbbbb HEAD@{2024-01-10 09:00:00 +0000}: checkout: moving from main to feature
";
        let usage = parse_reflog(input);
        assert_eq!(usage["feature"].with_timezone(&Utc), utc(2024, 1, 10, 9, 0, 0));
    }

    #[test]
    fn test_parse_reflog_without_switches() {
        let input = "aaaaaaa HEAD@{2024-01-10 09:00:00 +0000}: commit (initial): first\n";
        assert!(parse_reflog(input).is_empty());
    }

    #[test]
    fn test_parse_local_branches_strips_markers() {
        let input = "  main\n* feature\n+ other-worktree\n\n";
        assert_eq!(
            parse_local_branches(input),
            vec!["main", "feature", "other-worktree"]
        );
    }

    #[test]
    fn test_parse_local_branches_keeps_leading_plus_in_name() {
        let input = "  +hotfix\n* +wip\n+ ++shared\n";
        assert_eq!(parse_local_branches(input), vec!["+hotfix", "+wip", "++shared"]);
    }

    #[test]
    fn test_parse_local_branches_detached_head() {
        let input = "* (HEAD detached at 1a2b3c4)\n  main\n";
        assert_eq!(parse_local_branches(input), vec!["main"]);
    }

    #[test]
    fn test_parse_remote_branches() {
        let input = "  origin/HEAD -> origin/main\n  origin/main\n  origin/team/feature\n  upstream/dev\n  weird\n";
        let remotes = parse_remote_branches(input);
        assert_eq!(remotes.len(), 3);
        assert_eq!(remotes[0].full_name(), "origin/main");
        assert_eq!(remotes[1].remote, "origin");
        assert_eq!(remotes[1].short_name, "team/feature");
        assert_eq!(remotes[2].remote, "upstream");
    }

    #[test]
    fn test_parse_git_version() {
        let version = parse_git_version("git version 2.39.5 (Apple Git-154)").unwrap();
        assert_eq!(
            version,
            GitVersion {
                major: 2,
                minor: 39,
                patch: Some(5)
            }
        );
        assert_eq!(version.to_string(), "2.39.5");

        let version = parse_git_version("git version 2.45").unwrap();
        assert_eq!(version.patch, None);
        assert!(parse_git_version("git version unknown").is_none());
    }

    #[test]
    fn test_git_version_support() {
        let supported = |s: &str| parse_git_version(s).unwrap().is_supported();
        assert!(!supported("git version 2.21.0"));
        assert!(!supported("git version 1.99.9"));
        assert!(supported("git version 2.22.0"));
        assert!(supported("git version 2.30.1"));
        assert!(supported("git version 3.0"));
    }
}
