use crate::{
    errors::{CheckoutError, Result},
    git::GitCli,
    parser::{
        parse_git_version, parse_local_branches, parse_reflog, parse_remote_branches,
        RemoteBranch, UsageMap,
    },
};
use chrono::{DateTime, FixedOffset};
use std::cmp::Ordering;
use std::collections::HashSet;

/// One branch the operator can check out
#[derive(Debug, Clone, PartialEq)]
pub struct BranchRecord {
    /// Bare name for local branches, `<remote>/<short>` for remote-only ones
    pub name: String,
    /// Latest switch to this branch seen in the reflog, if any
    pub last_usage: Option<DateTime<FixedOffset>>,
    pub is_current: bool,
    /// Set only for remote branches with no local branch of the same short or full name
    pub remote: Option<RemoteBranch>,
}

impl BranchRecord {
    pub fn local(name: impl Into<String>, is_current: bool) -> Self {
        Self {
            name: name.into(),
            last_usage: None,
            is_current,
            remote: None,
        }
    }

    pub fn remote(remote: RemoteBranch) -> Self {
        Self {
            name: remote.full_name(),
            last_usage: None,
            is_current: false,
            remote: Some(remote),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Move `last_usage` forward, never backward
    pub fn record_usage(&mut self, timestamp: DateTime<FixedOffset>) {
        match self.last_usage {
            Some(latest) if latest >= timestamp => {}
            _ => self.last_usage = Some(timestamp),
        }
    }
}

/// Refuse to run against a git without `branch --show-current`
pub fn check_git_version<G: GitCli>(git: &G) -> Result<()> {
    let output = git.version()?;
    let version = parse_git_version(&output)
        .ok_or_else(|| CheckoutError::UnrecognizedVersion(output.trim().to_string()))?;

    log::debug!("Detected git {}", version);

    if !version.is_supported() {
        return Err(CheckoutError::UnsupportedToolVersion {
            version: version.to_string(),
        });
    }
    Ok(())
}

/// Merge local branches, remote-only branches and reflog usage into one set
///
/// Usage is matched by exact name. A remote-only record therefore only gets a
/// timestamp when the reflog recorded a switch to the full `<remote>/<short>`
/// name, which git rarely does: switching to a remote branch is usually logged
/// under the local tracking branch created for it.
pub fn merge_branches(
    local: Vec<String>,
    current: Option<&str>,
    remotes: Vec<RemoteBranch>,
    usage: &UsageMap,
) -> Vec<BranchRecord> {
    let local_names: HashSet<&str> = local.iter().map(String::as_str).collect();

    let mut records: Vec<BranchRecord> = local
        .iter()
        .map(|name| BranchRecord::local(name.as_str(), Some(name.as_str()) == current))
        .collect();

    for remote in remotes {
        let full_name = remote.full_name();
        if local_names.contains(full_name.as_str()) {
            log::debug!("Hiding {} behind local branch of the same name", full_name);
            continue;
        }
        if local_names.contains(remote.short_name.as_str()) {
            log::debug!(
                "Hiding {} behind local branch {}",
                full_name,
                remote.short_name
            );
            continue;
        }
        records.push(BranchRecord::remote(remote));
    }

    for record in &mut records {
        if let Some(timestamp) = usage.get(&record.name) {
            record.record_usage(*timestamp);
        }
    }

    records
}

/// Query git for everything needed to build the branch set
///
/// Queries run one after the other. All of them are read-only.
pub fn collect_branches<G: GitCli>(git: &G) -> Result<Vec<BranchRecord>> {
    if !git.is_repository()? {
        return Err(CheckoutError::NotARepository);
    }

    let current = git.current_branch()?;
    let current = current.trim();
    let current = if current.is_empty() {
        log::debug!("HEAD is detached, no current branch");
        None
    } else {
        Some(current)
    };

    let local = parse_local_branches(&git.local_branches()?);
    let remotes = parse_remote_branches(&git.remote_branches()?);
    let usage = parse_reflog(&git.reflog()?);

    log::debug!(
        "Found {} local branches, {} remote branches, {} reflog switch targets",
        local.len(),
        remotes.len(),
        usage.len()
    );

    Ok(merge_branches(local, current, remotes, &usage))
}

/// Most recently used first, never-used last
pub fn compare_recency(a: &BranchRecord, b: &BranchRecord) -> Ordering {
    match (&a.last_usage, &b.last_usage) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort by [`compare_recency`], ties keep their discovery order
pub fn rank(mut records: Vec<BranchRecord>) -> Vec<BranchRecord> {
    records.sort_by(compare_recency);
    records
}
