use crate::errors::{CheckoutError, Result};
use std::process::{Command, Output};

#[cfg(test)]
use std::collections::{HashMap, HashSet};

/// The `git` queries and commands this tool relies on
///
/// Queries return raw stdout; parsing lives in [`crate::parser`].
pub trait GitCli {
    fn is_repository(&self) -> Result<bool>;
    fn version(&self) -> Result<String>;
    fn current_branch(&self) -> Result<String>;
    fn local_branches(&self) -> Result<String>;
    fn remote_branches(&self) -> Result<String>;
    fn reflog(&self) -> Result<String>;
    fn local_branch_exists(&self, name: &str) -> Result<bool>;
    fn checkout(&self, branch: &str) -> Result<()>;
    fn checkout_tracking(&self, local: &str, upstream: &str) -> Result<()>;
}

pub struct GitCliImpl;

impl GitCliImpl {
    pub fn new() -> Self {
        Self
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        let output = Command::new("git").args(args).output()?;
        log::debug!("git {} -> {}", args.join(" "), output.status);
        Ok(output)
    }

    fn run_command(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CheckoutError::QueryFailed {
                command: args.join(" "),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run with the terminal attached so git talks to the operator directly
    fn run_attached(&self, target: &str, args: &[&str]) -> Result<()> {
        let status = Command::new("git").args(args).status()?;
        log::debug!("git {} -> {}", args.join(" "), status);

        if !status.success() {
            return Err(CheckoutError::CheckoutFailed {
                target: target.to_string(),
                reason: status.to_string(),
            });
        }
        Ok(())
    }
}

impl GitCli for GitCliImpl {
    fn is_repository(&self) -> Result<bool> {
        Ok(self.output(&["rev-parse", "--git-dir"])?.status.success())
    }

    fn version(&self) -> Result<String> {
        self.run_command(&["--version"])
    }

    fn current_branch(&self) -> Result<String> {
        self.run_command(&["branch", "--show-current"])
    }

    fn local_branches(&self) -> Result<String> {
        self.run_command(&["branch"])
    }

    fn remote_branches(&self) -> Result<String> {
        self.run_command(&["branch", "-r"])
    }

    fn reflog(&self) -> Result<String> {
        self.run_command(&["reflog", "show", "--date=iso"])
    }

    fn local_branch_exists(&self, name: &str) -> Result<bool> {
        let reference = format!("refs/heads/{}", name);
        let output = self.output(&["rev-parse", "--verify", "--quiet", &reference])?;
        Ok(output.status.success())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        log::info!("Checking out {}", branch);
        self.run_attached(branch, &["checkout", branch])
    }

    fn checkout_tracking(&self, local: &str, upstream: &str) -> Result<()> {
        log::info!("Creating {} tracking {}", local, upstream);
        self.run_attached(upstream, &["checkout", "-b", local, upstream])
    }
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCheckout {
    Plain(String),
    Tracking { local: String, upstream: String },
}

#[cfg(test)]
pub struct MockGitCli {
    pub repository: bool,
    pub version: String,
    pub current_branch: String,
    pub local_branches: String,
    pub remote_branches: String,
    pub reflog: String,
    pub existing_branches: HashSet<String>,
    pub failing_queries: HashMap<String, String>,
    pub checkout_error: Option<String>,
    pub queries: std::sync::Mutex<Vec<String>>,
    pub checkouts: std::sync::Mutex<Vec<MockCheckout>>,
}

#[cfg(test)]
impl MockGitCli {
    pub fn new() -> Self {
        Self {
            repository: true,
            version: "git version 2.39.5\n".to_string(),
            current_branch: "main\n".to_string(),
            local_branches: "* main\n".to_string(),
            remote_branches: String::new(),
            reflog: String::new(),
            existing_branches: HashSet::new(),
            failing_queries: HashMap::new(),
            checkout_error: None,
            queries: std::sync::Mutex::new(Vec::new()),
            checkouts: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn outside_repository(mut self) -> Self {
        self.repository = false;
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_current_branch(mut self, branch: &str) -> Self {
        self.current_branch = format!("{}\n", branch);
        self
    }

    pub fn with_local_branches(mut self, output: &str) -> Self {
        self.local_branches = output.to_string();
        self
    }

    pub fn with_remote_branches(mut self, output: &str) -> Self {
        self.remote_branches = output.to_string();
        self
    }

    pub fn with_reflog(mut self, output: &str) -> Self {
        self.reflog = output.to_string();
        self
    }

    pub fn with_existing_branches(mut self, branches: Vec<&str>) -> Self {
        for branch in branches {
            self.existing_branches.insert(branch.to_string());
        }
        self
    }

    pub fn failing_query(mut self, command: &str, stderr: &str) -> Self {
        self.failing_queries
            .insert(command.to_string(), stderr.to_string());
        self
    }

    pub fn failing_checkout(mut self, reason: &str) -> Self {
        self.checkout_error = Some(reason.to_string());
        self
    }

    pub fn get_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn get_checkouts(&self) -> Vec<MockCheckout> {
        self.checkouts.lock().unwrap().clone()
    }

    fn answer(&self, command: &str, output: &str) -> Result<String> {
        self.queries.lock().unwrap().push(command.to_string());
        match self.failing_queries.get(command) {
            Some(stderr) => Err(CheckoutError::QueryFailed {
                command: command.to_string(),
                stderr: stderr.clone(),
            }),
            None => Ok(output.to_string()),
        }
    }

    fn record(&self, target: &str, checkout: MockCheckout) -> Result<()> {
        self.checkouts.lock().unwrap().push(checkout);
        match &self.checkout_error {
            Some(reason) => Err(CheckoutError::CheckoutFailed {
                target: target.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
impl GitCli for MockGitCli {
    fn is_repository(&self) -> Result<bool> {
        self.queries
            .lock()
            .unwrap()
            .push("rev-parse --git-dir".to_string());
        Ok(self.repository)
    }

    fn version(&self) -> Result<String> {
        self.answer("--version", &self.version)
    }

    fn current_branch(&self) -> Result<String> {
        self.answer("branch --show-current", &self.current_branch)
    }

    fn local_branches(&self) -> Result<String> {
        self.answer("branch", &self.local_branches)
    }

    fn remote_branches(&self) -> Result<String> {
        self.answer("branch -r", &self.remote_branches)
    }

    fn reflog(&self) -> Result<String> {
        self.answer("reflog show --date=iso", &self.reflog)
    }

    fn local_branch_exists(&self, name: &str) -> Result<bool> {
        self.queries
            .lock()
            .unwrap()
            .push(format!("rev-parse --verify --quiet refs/heads/{}", name));
        Ok(self.existing_branches.contains(name))
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        self.record(branch, MockCheckout::Plain(branch.to_string()))
    }

    fn checkout_tracking(&self, local: &str, upstream: &str) -> Result<()> {
        self.record(
            upstream,
            MockCheckout::Tracking {
                local: local.to_string(),
                upstream: upstream.to_string(),
            },
        )
    }
}
