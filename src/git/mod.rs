pub mod cli;

pub use cli::{GitCli, GitCliImpl};

#[cfg(test)]
pub use cli::{MockCheckout, MockGitCli};
