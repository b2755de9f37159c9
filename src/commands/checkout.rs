use crate::{
    core::{check_git_version, collect_branches, rank, BranchRecord},
    errors::{CheckoutError, Result},
    git::GitCli,
    select::{branch_label, Selection, Selector},
};

/// The git command a selection turns into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// `git checkout <branch>`
    Plain(String),
    /// `git checkout -b <local> <upstream>`
    Tracking { local: String, upstream: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    CheckedOut(Dispatch),
    Cancelled,
}

/// Decide how to check out the selected branch
///
/// A remote-only branch whose short name already exists locally (created since
/// the list was built, or hidden behind an odd remote layout) is checked out
/// as is rather than re-created.
pub fn plan_dispatch<G: GitCli>(git: &G, branch: &BranchRecord) -> Result<Dispatch> {
    let Some(remote) = &branch.remote else {
        return Ok(Dispatch::Plain(branch.name.clone()));
    };

    if git.local_branch_exists(&remote.short_name)? {
        log::info!(
            "Local branch {} already exists, not tracking {}",
            remote.short_name,
            branch.name
        );
        return Ok(Dispatch::Plain(remote.short_name.clone()));
    }

    Ok(Dispatch::Tracking {
        local: remote.short_name.clone(),
        upstream: remote.full_name(),
    })
}

/// Issue the checkout. Failures are never retried.
pub fn dispatch<G: GitCli>(git: &G, branch: &BranchRecord) -> Result<Dispatch> {
    let plan = plan_dispatch(git, branch)?;
    match &plan {
        Dispatch::Plain(name) => git.checkout(name)?,
        Dispatch::Tracking { local, upstream } => git.checkout_tracking(local, upstream)?,
    }
    Ok(plan)
}

/// One run: version check, enumerate, rank, select, dispatch
pub struct Checkout;

impl Checkout {
    pub fn execute<G: GitCli, S: Selector>(&self, git: &G, selector: &S) -> Result<Outcome> {
        check_git_version(git)?;

        let branches = rank(collect_branches(git)?);
        let labels: Vec<String> = branches.iter().map(branch_label).collect();

        let index = match selector.select(&labels)? {
            Selection::Chosen(index) => index,
            Selection::Cancelled => {
                log::info!("Selection cancelled, nothing checked out");
                return Ok(Outcome::Cancelled);
            }
        };

        let branch = branches.get(index).ok_or_else(|| {
            CheckoutError::Selection(format!(
                "selected index {} out of range for {} branches",
                index,
                branches.len()
            ))
        })?;

        Ok(Outcome::CheckedOut(dispatch(git, branch)?))
    }
}
