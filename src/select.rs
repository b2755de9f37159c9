use crate::{
    core::BranchRecord,
    errors::{CheckoutError, Result},
};
use std::process::Command;

const DATE_FORMAT: &str = "%d/%m/%y %H:%M";
const NO_DATE: &str = "                    ";
const REMOTE_PADDING: &str = "                  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Index into the labels handed to the selector
    Chosen(usize),
    Cancelled,
}

pub trait Selector {
    fn select(&self, labels: &[String]) -> Result<Selection>;
}

/// How a branch is shown in the finder
pub fn branch_label(branch: &BranchRecord) -> String {
    let prefix = if branch.is_current { "* " } else { "  " };

    if branch.is_remote() {
        return format!("{}{}{}", prefix, REMOTE_PADDING, branch.name);
    }

    let timestamp = match &branch.last_usage {
        Some(last_usage) => last_usage.format(DATE_FORMAT).to_string(),
        None => NO_DATE.to_string(),
    };
    format!("{}{}    {}", prefix, timestamp, branch.name)
}

/// Fuzzy selection through the `fzf` binary
pub struct FzfSelector {
    pub args: Vec<String>,
}

impl FzfSelector {
    pub fn new() -> Self {
        Self {
            // keep the recency order instead of fzf's match score order
            args: vec!["--no-sort".to_string(), "--prompt=branch> ".to_string()],
        }
    }

    fn is_available(&self) -> bool {
        match Command::new("fzf").arg("--version").output() {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }
}

impl Selector for FzfSelector {
    fn select(&self, labels: &[String]) -> Result<Selection> {
        if labels.is_empty() {
            return Ok(Selection::Cancelled);
        }

        if !self.is_available() {
            return Err(CheckoutError::Selection(
                "fzf not found, install it from https://github.com/junegunn/fzf".to_string(),
            ));
        }

        // empty when the operator hits Esc
        let selected = rust_fzf::select(labels.to_vec(), self.args.clone());
        Ok(match_label(labels, &selected))
    }
}

/// Map a line echoed back by the finder to its index
///
/// An exact match wins. Otherwise the padding is ignored, but only when that
/// leaves a single candidate.
pub fn match_label(labels: &[String], selected: &str) -> Selection {
    let line = selected.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Selection::Cancelled;
    }

    if let Some(index) = labels.iter().position(|label| label == line) {
        return Selection::Chosen(index);
    }

    let mut candidates = labels
        .iter()
        .enumerate()
        .filter(|(_, label)| label.trim() == line.trim());
    match (candidates.next(), candidates.next()) {
        (Some((index, _)), None) => Selection::Chosen(index),
        (None, _) => {
            log::warn!("Selected line {:?} matches no branch", line);
            Selection::Cancelled
        }
        (Some(_), Some(_)) => {
            log::warn!("Selected line {:?} matches several branches", line);
            Selection::Cancelled
        }
    }
}

#[cfg(test)]
pub struct MockSelector {
    pub outcome: Selection,
    pub shown: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockSelector {
    pub fn choosing(index: usize) -> Self {
        Self {
            outcome: Selection::Chosen(index),
            shown: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn cancelling() -> Self {
        Self {
            outcome: Selection::Cancelled,
            shown: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn get_shown(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Selector for MockSelector {
    fn select(&self, labels: &[String]) -> Result<Selection> {
        *self.shown.lock().unwrap() = labels.to_vec();
        Ok(self.outcome)
    }
}
